//! podarchive - maintenance of a podcast archive on disk
//!
//! An archive is a directory tree of YAML metadata (`meta/`), source media
//! (`media/`) and built files (`build/`). This crate models it as a tree of
//! podcast, episode and part nodes, validates its consistency, converts
//! source media into the configured target formats and tags the results.

pub mod encode;
pub mod error;
pub mod id;
pub mod media;
pub mod meta;
pub mod node;
pub mod pipeline;
pub mod scan;
pub mod startup;
pub mod summary;
pub mod validate;

#[cfg(test)]
mod test_support;

pub use encode::{
    ConvertOutcome, ConvertParams, Converter, FfmpegConverter, FfmpegTagger, TagFields, Tagger,
};
pub use error::{ArchiveError, ErrorKind, Result};
pub use media::{MediaType, SourceFile};
pub use meta::{Field, MetaStore, Metadata};
pub use node::{Episode, EpisodePart, EpisodeSpecifier, Node, NodeKind, Podcast};
pub use pipeline::{add_meta_information, build_media_files, BuildStats, TagStats};
pub use startup::{run_startup_checks, StartupError};
pub use summary::NodeSummary;
pub use validate::validate;

pub use podarchive_config as config;
pub use podarchive_config::{Config, ConfigError};
