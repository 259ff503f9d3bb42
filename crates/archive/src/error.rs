//! Error types for archive operations.
//!
//! Every error is fatal for the operation that raised it: validation, media
//! conversion and tagging abort at the first failure. Callers that need to
//! tell failures apart use [`ArchiveError::kind`].

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::media::MediaType;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Stable classification of an [`ArchiveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidFormat,
    InvalidValue,
    MissingKey,
    InvalidSpecifier,
    NotUnique,
    TooManySourceFiles,
    UnrecognizedFile,
    MissingMetadata,
    AttributeNotFound,
    ConversionFailed,
    TaggingFailed,
    Io,
}

/// Error type for archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A required file or directory is missing, or a lookup matched nothing
    #[error("{0}")]
    NotFound(String),

    /// A metadata file is not well-formed
    #[error("yaml file '{}' is no valid yaml markup: {message}", path.display())]
    InvalidFormat { path: PathBuf, message: String },

    /// A metadata value has the wrong shape for the attribute read from it
    #[error("key '{key}' in yaml file '{}' has an invalid value: {message}", path.display())]
    InvalidValue {
        key: String,
        path: PathBuf,
        message: String,
    },

    /// A required metadata key is absent
    #[error("there is no key '{key}' in yaml file '{}'", path.display())]
    MissingKey { key: String, path: PathBuf },

    /// An episode or part specifier cannot be parsed or resolved
    #[error("{0}")]
    InvalidSpecifier(String),

    /// More than one candidate matched a resolution pattern
    #[error("{0}")]
    NotUnique(String),

    /// More than one source file exists for a media type
    #[error("too many {media_type} files in folder '{}'", dir.display())]
    TooManySourceFiles { media_type: MediaType, dir: PathBuf },

    /// A media directory entry matches no naming convention
    #[error("what is the function of file '{}'?", path.display())]
    UnrecognizedFile { path: PathBuf },

    /// A media subdirectory or build file has no node with metadata
    #[error("{what} '{}' has no meta information", path.display())]
    MissingMetadata { what: &'static str, path: PathBuf },

    /// A metadata attribute is absent and cannot be inherited
    #[error("'{node}' has no attribute '{attr}'")]
    AttributeNotFound { node: String, attr: String },

    /// The external transcoder failed
    #[error("conversion of '{}' failed: {reason}", path.display())]
    ConversionFailed { path: PathBuf, reason: String },

    /// The external tagger failed
    #[error("tagging of '{}' failed: {reason}", path.display())]
    TaggingFailed { path: PathBuf, reason: String },

    /// Unexpected filesystem error
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error raised while processing a particular node
    #[error("{node}: {source}")]
    InNode {
        node: String,
        #[source]
        source: Box<ArchiveError>,
    },
}

impl ArchiveError {
    /// Missing directory error.
    pub fn missing_dir(path: impl AsRef<Path>) -> Self {
        Self::NotFound(format!(
            "directory '{}' does not exist",
            path.as_ref().display()
        ))
    }

    /// Missing regular file error.
    pub fn missing_file(path: impl AsRef<Path>) -> Self {
        Self::NotFound(format!("file '{}' does not exist", path.as_ref().display()))
    }

    /// IO error tagged with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attribute lookup failure.
    pub fn attribute_not_found(node: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::AttributeNotFound {
            node: node.into(),
            attr: attr.into(),
        }
    }

    /// Attach the node an error occurred in. Already attributed errors are
    /// returned unchanged so context is never stacked.
    pub fn in_node(self, node: impl Into<String>) -> Self {
        match self {
            Self::InNode { .. } => self,
            other => Self::InNode {
                node: node.into(),
                source: Box::new(other),
            },
        }
    }

    /// The kind of the underlying error, looking through node context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::MissingKey { .. } => ErrorKind::MissingKey,
            Self::InvalidSpecifier(_) => ErrorKind::InvalidSpecifier,
            Self::NotUnique(_) => ErrorKind::NotUnique,
            Self::TooManySourceFiles { .. } => ErrorKind::TooManySourceFiles,
            Self::UnrecognizedFile { .. } => ErrorKind::UnrecognizedFile,
            Self::MissingMetadata { .. } => ErrorKind::MissingMetadata,
            Self::AttributeNotFound { .. } => ErrorKind::AttributeNotFound,
            Self::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            Self::TaggingFailed { .. } => ErrorKind::TaggingFailed,
            Self::Io { .. } => ErrorKind::Io,
            Self::InNode { source, .. } => source.kind(),
        }
    }
}

/// Treat a missing attribute as absent; every other error is kept.
pub fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == ErrorKind::AttributeNotFound => Ok(None),
        Err(e) => Err(e),
    }
}
