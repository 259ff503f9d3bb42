use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

use super::{EpisodePart, Podcast};
use crate::error::{ArchiveError, Result};
use crate::id::{find_unique_element, is_valid_id};
use crate::meta::{Field, Metadata};
use crate::scan::entry_names;

/// A value identifying one episode of a podcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeSpecifier {
    /// The episode number.
    Number(u32),
    /// Either the full directory name (starting with the episode prefix) or
    /// the bare episode id.
    Name(String),
}

impl EpisodeSpecifier {
    /// Parse user input: all-digit strings are numbers, anything else a name.
    pub fn parse(s: &str) -> Self {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(number) = s.parse() {
                return EpisodeSpecifier::Number(number);
            }
        }
        EpisodeSpecifier::Name(s.to_string())
    }
}

impl From<u32> for EpisodeSpecifier {
    fn from(number: u32) -> Self {
        EpisodeSpecifier::Number(number)
    }
}

impl From<&str> for EpisodeSpecifier {
    fn from(name: &str) -> Self {
        EpisodeSpecifier::Name(name.to_string())
    }
}

impl fmt::Display for EpisodeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpisodeSpecifier::Number(number) => write!(f, "{}", number),
            EpisodeSpecifier::Name(name) => f.write_str(name),
        }
    }
}

/// Directory name pattern derived from a specifier.
#[derive(Debug)]
enum DirPattern<'a> {
    /// `<prefix><number>_<any id>`
    Numbered { prefix: &'a str, number: String },
    /// exactly this name
    Exact(&'a str),
    /// `<prefix><digits>_<id>`
    WithId { prefix: &'a str, id: &'a str },
}

impl<'a> DirPattern<'a> {
    fn new(prefix: &'a str, specifier: &'a EpisodeSpecifier) -> Result<Self> {
        match specifier {
            EpisodeSpecifier::Number(number) => Ok(DirPattern::Numbered {
                prefix,
                number: number.to_string(),
            }),
            EpisodeSpecifier::Name(name) if name.starts_with(prefix) => {
                Ok(DirPattern::Exact(name))
            }
            EpisodeSpecifier::Name(name) if is_valid_id(name) => {
                Ok(DirPattern::WithId { prefix, id: name })
            }
            EpisodeSpecifier::Name(name) => Err(ArchiveError::InvalidSpecifier(format!(
                "'{}' is no valid episode specifier",
                name
            ))),
        }
    }

    fn matches(&self, dir_name: &str) -> bool {
        match self {
            DirPattern::Numbered { prefix, number } => split_dir_name(prefix, dir_name)
                .map_or(false, |(digits, id)| digits == number && is_valid_id(id)),
            DirPattern::Exact(name) => dir_name == *name,
            DirPattern::WithId { prefix, id } => {
                split_dir_name(prefix, dir_name).map_or(false, |(_, rest)| rest == *id)
            }
        }
    }
}

/// Split `<prefix><digits>_<rest>` into digits and rest.
fn split_dir_name<'n>(prefix: &str, dir_name: &'n str) -> Option<(&'n str, &'n str)> {
    let rest = dir_name.strip_prefix(prefix)?;
    let digits_len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());

    if digits_len == 0 {
        return None;
    }

    let (digits, rest) = rest.split_at(digits_len);
    Some((digits, rest.strip_prefix('_')?))
}

/// An episode, stored under `meta/<prefix><number>_<id>`.
#[derive(Debug, Clone)]
pub struct Episode {
    podcast: Podcast,
    prefix: String,
    number: u32,
    id: String,
}

impl Episode {
    /// Find the one episode directory matching `specifier`.
    ///
    /// Every entry name of the podcast's meta directory is tested against
    /// the pattern for the specifier; exactly one must match. Number and id
    /// are then read back from the matched name.
    pub(crate) fn resolve(podcast: &Podcast, specifier: &EpisodeSpecifier) -> Result<Self> {
        let prefix = podcast.episode_prefix()?;
        let pattern = DirPattern::new(&prefix, specifier)?;

        let dir_name = find_unique_element(
            entry_names(&podcast.meta_dir())?,
            |name| pattern.matches(name),
            || format!("there are more than one episode with specifier `{}`", specifier),
            || format!("there is no episode with specifier `{}`", specifier),
        )?;

        let invalid = || {
            ArchiveError::InvalidSpecifier(format!(
                "cannot read episode number and id from directory '{}'",
                dir_name
            ))
        };
        let (digits, id) = split_dir_name(&prefix, &dir_name).ok_or_else(invalid)?;
        let number: u32 = digits.parse().map_err(|_| invalid())?;

        if !is_valid_id(id) {
            return Err(invalid());
        }

        debug!(specifier = %specifier, dir = %dir_name, "resolved episode");

        Ok(Self {
            podcast: podcast.clone(),
            number,
            id: id.to_string(),
            prefix,
        })
    }

    pub fn podcast(&self) -> &Podcast {
        &self.podcast
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `<episode_prefix><number>_<id>`
    pub fn file_id(&self) -> String {
        format!("{}{}_{}", self.prefix, self.number, self.id)
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.podcast.meta_dir().join(self.file_id())
    }

    pub fn media_dir(&self) -> PathBuf {
        self.podcast.media_base_dir().join(self.file_id())
    }

    pub fn yaml_file(&self) -> PathBuf {
        self.meta_dir().join("episode.yml")
    }

    pub fn meta(&self) -> Result<Rc<Metadata>> {
        self.podcast.store().load(&self.yaml_file())
    }

    pub fn name(&self) -> Result<String> {
        self.meta()?
            .text(Field::Name)?
            .ok_or_else(|| ArchiveError::attribute_not_found(self.to_string(), "name"))
    }

    pub fn title(&self) -> Result<String> {
        Ok(format!("Folge {}: {}", self.number, self.name()?))
    }

    /// The part of this episode with the given id.
    pub fn part(&self, id: &str) -> Result<EpisodePart> {
        EpisodePart::new(self.clone(), id)
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Episode({})", self.file_id())
    }
}
