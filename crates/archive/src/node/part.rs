use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use super::Episode;
use crate::error::{ArchiveError, Result};
use crate::id::is_valid_id;
use crate::meta::{Field, Metadata};

/// A part of an episode, stored under `<episode meta dir>/<id>`.
#[derive(Debug, Clone)]
pub struct EpisodePart {
    episode: Episode,
    id: String,
}

impl EpisodePart {
    pub fn new(episode: Episode, id: &str) -> Result<Self> {
        if !is_valid_id(id) {
            return Err(ArchiveError::InvalidSpecifier(format!(
                "'{}' is no valid episode part id",
                id
            )));
        }

        Ok(Self {
            episode,
            id: id.to_string(),
        })
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `<episode file_id>:_<id>`
    pub fn file_id(&self) -> String {
        format!("{}:_{}", self.episode.file_id(), self.id)
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.episode.meta_dir().join(&self.id)
    }

    pub fn media_dir(&self) -> PathBuf {
        self.episode.media_dir().join(&self.id)
    }

    pub fn yaml_file(&self) -> PathBuf {
        self.meta_dir().join("episodepart.yml")
    }

    pub fn meta(&self) -> Result<Rc<Metadata>> {
        self.episode.podcast().store().load(&self.yaml_file())
    }

    pub fn name(&self) -> Result<String> {
        self.meta()?
            .text(Field::Name)?
            .ok_or_else(|| ArchiveError::attribute_not_found(self.to_string(), "name"))
    }

    pub fn title(&self) -> Result<String> {
        Ok(format!("{} - {}", self.episode.title()?, self.name()?))
    }
}

impl fmt::Display for EpisodePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpisodePart({})", self.file_id())
    }
}
