use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::{Episode, EpisodeSpecifier, Node};
use crate::error::{ArchiveError, Result};
use crate::media::MediaType;
use crate::meta::{Field, FormatTable, MetaStore, Metadata};

/// Root of the archive, rooted at `base_dir`.
///
/// ```text
/// base_dir/
///   meta/    podcast.yml, one directory per episode
///   media/   source media, mirroring meta/
///   build/   converted files, named <file_id>.<format>
/// ```
#[derive(Clone)]
pub struct Podcast {
    base_dir: PathBuf,
    store: Rc<MetaStore>,
}

impl Podcast {
    /// Open the podcast at `base_dir`, which must be an existing directory.
    pub fn open(base_dir: impl AsRef<Path>, store: Rc<MetaStore>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let base_dir =
            std::path::absolute(base_dir).map_err(|e| ArchiveError::io(base_dir, e))?;

        if !base_dir.is_dir() {
            return Err(ArchiveError::missing_dir(&base_dir));
        }

        Ok(Self { base_dir, store })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.base_dir.join("meta")
    }

    pub fn media_base_dir(&self) -> PathBuf {
        self.base_dir.join("media")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.base_dir.join("build")
    }

    pub fn yaml_file(&self) -> PathBuf {
        self.meta_dir().join("podcast.yml")
    }

    pub(crate) fn store(&self) -> &MetaStore {
        &self.store
    }

    pub fn meta(&self) -> Result<Rc<Metadata>> {
        self.store.load(&self.yaml_file())
    }

    fn required_text(&self, field: Field) -> Result<String> {
        self.meta()?
            .text(field)?
            .ok_or_else(|| ArchiveError::attribute_not_found(self.to_string(), field.key()))
    }

    pub fn id(&self) -> Result<String> {
        self.required_text(Field::Id)
    }

    pub fn name(&self) -> Result<String> {
        self.required_text(Field::Name)
    }

    pub fn episode_prefix(&self) -> Result<String> {
        self.required_text(Field::EpisodePrefix)
    }

    pub fn homepage(&self) -> Result<String> {
        self.required_text(Field::Homepage)
    }

    pub fn file_id(&self) -> Result<String> {
        self.id()
    }

    pub fn title(&self) -> Result<String> {
        self.name()
    }

    pub fn media_dir(&self) -> Result<PathBuf> {
        Ok(self.media_base_dir().join(self.file_id()?))
    }

    /// Source formats accepted for `media_type`.
    pub fn input_formats(&self, media_type: MediaType) -> Result<Vec<String>> {
        let table = self.meta()?.input_formats()?;
        self.formats(table, "input_formats", media_type)
    }

    /// Formats built for `media_type`.
    pub fn target_formats(&self, media_type: MediaType) -> Result<Vec<String>> {
        let table = self.meta()?.target_formats()?;
        self.formats(table, "target_formats", media_type)
    }

    fn formats(
        &self,
        table: Option<FormatTable>,
        key: &str,
        media_type: MediaType,
    ) -> Result<Vec<String>> {
        let table =
            table.ok_or_else(|| ArchiveError::attribute_not_found(self.to_string(), key))?;
        Ok(table.get(&media_type).cloned().unwrap_or_default())
    }

    /// Entries of the media directory that belong to no node.
    pub fn personal_media_dirs(&self) -> Result<Vec<String>> {
        Ok(self.meta()?.personal_media_dirs()?.unwrap_or_default())
    }

    /// Resolve an episode of this podcast.
    pub fn episode(&self, specifier: &EpisodeSpecifier) -> Result<Episode> {
        Episode::resolve(self, specifier)
    }

    /// Resolve a node by key: the podcast's own id, an episode specifier, or
    /// `<episode specifier>:_<part id>`, i.e. anything a file_id can be.
    ///
    /// Keys are taken literally: an all-digit key is an episode id, not a
    /// number. See [`Podcast::select`].
    pub fn lookup(&self, key: &str) -> Result<Node> {
        self.address(key, |s| EpisodeSpecifier::Name(s.to_string()))
    }

    /// Like [`Podcast::lookup`], but all-digit episode keys are numbers.
    pub fn select(&self, key: &str) -> Result<Node> {
        self.address(key, EpisodeSpecifier::parse)
    }

    fn address(&self, key: &str, specifier: impl Fn(&str) -> EpisodeSpecifier) -> Result<Node> {
        if key == self.id()? {
            return Ok(Node::Podcast(self.clone()));
        }

        if let Some((episode, part)) = key.split_once(":_") {
            if episode.is_empty() || part.is_empty() || episode.contains(':') || part.contains(':')
            {
                return Err(ArchiveError::InvalidSpecifier(format!(
                    "'{}' is no valid episode part specifier",
                    key
                )));
            }
            let episode = self.episode(&specifier(episode))?;
            return Ok(Node::Part(episode.part(part)?));
        }

        Ok(Node::Episode(self.episode(&specifier(key))?))
    }
}

impl fmt::Debug for Podcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Podcast")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Podcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .meta()
            .ok()
            .and_then(|meta| meta.text(Field::Id).ok().flatten());
        match id {
            Some(id) => write!(f, "Podcast({})", id),
            None => write!(f, "Podcast({})", self.base_dir.display()),
        }
    }
}
