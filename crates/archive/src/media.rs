//! Media types handled by the archive.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of media a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Picture,
    Audio,
    Video,
}

impl MediaType {
    /// All media types, in processing order.
    pub const ALL: [MediaType; 3] = [MediaType::Picture, MediaType::Audio, MediaType::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Picture => "picture",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }

    /// Name of the source file for this media type in a given format,
    /// e.g. `audio.flac`.
    pub fn source_file_name(&self, format: &str) -> String {
        format!("{}.{}", self.as_str(), format)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A located source media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: String,
}
