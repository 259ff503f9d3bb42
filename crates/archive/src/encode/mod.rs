//! External media tools: the transcoder and the tagger.

pub mod convert;
pub mod tag;

pub use convert::{
    build_convert_command, ConvertOutcome, ConvertParams, Converter, FfmpegConverter,
};
pub use tag::{build_tag_command, remove_stale_temp_files, FfmpegTagger, TagFields, Tagger};
