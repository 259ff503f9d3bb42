//! The podcast node tree.
//!
//! A podcast archive is a three level tree: [`Podcast`] → [`Episode`] →
//! [`EpisodePart`]. Nodes are cheap handles that are materialised on every
//! lookup; only their parsed metadata is cached (by the [`MetaStore`]).
//! Paths and identifiers are derived on demand from the parent chain.
//!
//! [`MetaStore`]: crate::meta::MetaStore

mod episode;
mod part;
mod podcast;

pub use episode::{Episode, EpisodeSpecifier};
pub use part::EpisodePart;
pub use podcast::Podcast;

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{ArchiveError, Result};
use crate::media::{MediaType, SourceFile};
use crate::meta::{Field, Metadata};

/// Which of the three node variants a [`Node`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Podcast,
    Episode,
    EpisodePart,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Podcast => "Podcast",
            NodeKind::Episode => "Episode",
            NodeKind::EpisodePart => "EpisodePart",
        }
    }

    /// File name of the node's metadata inside its meta directory.
    pub fn yaml_file_name(&self) -> &'static str {
        match self {
            NodeKind::Podcast => "podcast.yml",
            NodeKind::Episode => "episode.yml",
            NodeKind::EpisodePart => "episodepart.yml",
        }
    }

    /// Keys that must be present in the node's metadata.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Podcast => &["name", "subtitle", "id", "email", "episode_prefix"],
            NodeKind::Episode => &["name", "subtitle", "date"],
            NodeKind::EpisodePart => &["name"],
        }
    }

    /// Attributes resolved through the parent when absent locally.
    pub fn inherited_attrs(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Podcast => &[],
            NodeKind::Episode => &["genre"],
            NodeKind::EpisodePart => &["genre", "date", "number"],
        }
    }

    pub fn inherits(&self, attr: &str) -> bool {
        self.inherited_attrs().contains(&attr)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any node of the archive tree.
#[derive(Debug, Clone)]
pub enum Node {
    Podcast(Podcast),
    Episode(Episode),
    Part(EpisodePart),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Podcast(_) => NodeKind::Podcast,
            Node::Episode(_) => NodeKind::Episode,
            Node::Part(_) => NodeKind::EpisodePart,
        }
    }

    /// The podcast this node belongs to.
    pub fn podcast(&self) -> &Podcast {
        match self {
            Node::Podcast(podcast) => podcast,
            Node::Episode(episode) => episode.podcast(),
            Node::Part(part) => part.episode().podcast(),
        }
    }

    pub fn parent(&self) -> Option<Node> {
        match self {
            Node::Podcast(_) => None,
            Node::Episode(episode) => Some(Node::Podcast(episode.podcast().clone())),
            Node::Part(part) => Some(Node::Episode(part.episode().clone())),
        }
    }

    pub fn meta_dir(&self) -> PathBuf {
        match self {
            Node::Podcast(podcast) => podcast.meta_dir(),
            Node::Episode(episode) => episode.meta_dir(),
            Node::Part(part) => part.meta_dir(),
        }
    }

    pub fn yaml_file(&self) -> PathBuf {
        self.meta_dir().join(self.kind().yaml_file_name())
    }

    pub fn media_dir(&self) -> Result<PathBuf> {
        match self {
            Node::Podcast(podcast) => podcast.media_dir(),
            Node::Episode(episode) => Ok(episode.media_dir()),
            Node::Part(part) => Ok(part.media_dir()),
        }
    }

    pub fn file_id(&self) -> Result<String> {
        match self {
            Node::Podcast(podcast) => podcast.file_id(),
            Node::Episode(episode) => Ok(episode.file_id()),
            Node::Part(part) => Ok(part.file_id()),
        }
    }

    pub fn title(&self) -> Result<String> {
        match self {
            Node::Podcast(podcast) => podcast.title(),
            Node::Episode(episode) => episode.title(),
            Node::Part(part) => part.title(),
        }
    }

    /// The node's parsed metadata file.
    pub fn meta(&self) -> Result<Rc<Metadata>> {
        self.podcast().store().load(&self.yaml_file())
    }

    pub fn media_types(&self) -> Result<Vec<MediaType>> {
        match self {
            Node::Podcast(_) => Ok(vec![MediaType::Picture]),
            _ => Ok(self
                .meta()?
                .media_types()?
                .unwrap_or_else(|| MediaType::ALL.to_vec())),
        }
    }

    /// Resolve a text attribute: structural value, own metadata, then the
    /// parent if the attribute is inheritable for this kind of node.
    pub fn text(&self, field: Field) -> Result<String> {
        match (self, field) {
            (Node::Episode(episode), Field::Id) => return Ok(episode.id().to_string()),
            (Node::Part(part), Field::Id) => return Ok(part.id().to_string()),
            _ => {}
        }

        if let Some(value) = self.meta()?.text(field)? {
            return Ok(value);
        }

        self.inherit(field.key(), |parent| parent.text(field))
    }

    /// Episode number, structural for episodes and inheritable by parts.
    pub fn number(&self) -> Result<u32> {
        if let Node::Episode(episode) = self {
            return Ok(episode.number());
        }

        if let Some(number) = self.meta()?.number()? {
            return Ok(number);
        }

        self.inherit("number", Node::number)
    }

    /// Comma separated authors, falling back to the parent's, then to "".
    pub fn author(&self) -> Result<String> {
        if let Some(authors) = self.meta()?.authors()? {
            return Ok(authors.join(", "));
        }

        match self.parent() {
            Some(parent) => parent.author(),
            None => Ok(String::new()),
        }
    }

    fn inherit<T>(&self, attr: &str, lookup: impl FnOnce(&Node) -> Result<T>) -> Result<T> {
        if self.kind().inherits(attr) {
            if let Some(parent) = self.parent() {
                return lookup(&parent);
            }
        }
        Err(ArchiveError::attribute_not_found(self.to_string(), attr))
    }

    /// Resolve a child by directory name.
    ///
    /// For a podcast this accepts every key [`Podcast::lookup`] does, for an
    /// episode the name is a part id. Parts have no children.
    pub fn child(&self, name: &str) -> Result<Node> {
        match self {
            Node::Podcast(podcast) => podcast.lookup(name),
            Node::Episode(episode) => Ok(Node::Part(episode.part(name)?)),
            Node::Part(part) => Err(ArchiveError::InvalidSpecifier(format!(
                "episode part '{}' has no child '{}'",
                part.file_id(),
                name
            ))),
        }
    }

    /// The node's children, one per subdirectory of its meta directory.
    ///
    /// The directory is listed up front; each child is resolved as the
    /// iterator reaches it.
    pub fn children(&self) -> Result<Children> {
        let names = match self {
            Node::Part(_) => Vec::new(),
            _ => crate::scan::sub_dir_names(&self.meta_dir())?,
        };

        Ok(Children {
            parent: self.clone(),
            names: names.into_iter(),
        })
    }

    /// The single source file of `media_type` in the media directory.
    ///
    /// Candidates are `<media_type>.<format>` for each input format the
    /// podcast configures. Fails with `TooManySourceFiles` if several exist.
    pub fn input_file(&self, media_type: MediaType) -> Result<Option<SourceFile>> {
        let media_dir = self.media_dir()?;
        let mut found: Option<SourceFile> = None;

        for format in self.podcast().input_formats(media_type)? {
            let path = media_dir.join(media_type.source_file_name(&format));

            if path.is_file() {
                if found.is_some() {
                    return Err(ArchiveError::TooManySourceFiles {
                        media_type,
                        dir: media_dir,
                    });
                }
                found = Some(SourceFile { path, format });
            }
        }

        Ok(found)
    }

    /// `<file_id>.<format>`
    pub fn target_file_name(&self, format: &str) -> Result<String> {
        Ok(format!("{}.{}", self.file_id()?, format))
    }

    /// Path of the built file for `format` inside the podcast's build dir.
    pub fn target_file(&self, format: &str) -> Result<PathBuf> {
        Ok(self
            .podcast()
            .build_dir()
            .join(self.target_file_name(format)?))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Podcast(podcast) => fmt::Display::fmt(podcast, f),
            Node::Episode(episode) => fmt::Display::fmt(episode, f),
            Node::Part(part) => fmt::Display::fmt(part, f),
        }
    }
}

impl From<Podcast> for Node {
    fn from(podcast: Podcast) -> Self {
        Node::Podcast(podcast)
    }
}

impl From<Episode> for Node {
    fn from(episode: Episode) -> Self {
        Node::Episode(episode)
    }
}

impl From<EpisodePart> for Node {
    fn from(part: EpisodePart) -> Self {
        Node::Part(part)
    }
}

/// Lazily resolved children of a node. See [`Node::children`].
pub struct Children {
    parent: Node,
    names: std::vec::IntoIter<String>,
}

impl Iterator for Children {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.next()?;

        Some(match &self.parent {
            Node::Podcast(podcast) => podcast
                .episode(&EpisodeSpecifier::Name(name))
                .map(Node::Episode),
            Node::Episode(episode) => episode.part(&name).map(Node::Part),
            Node::Part(_) => unreachable!("episode parts have no children"),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.names.size_hint()
    }
}
