//! Writing node metadata into media files.

use chrono::{Datelike, NaiveDate};
use podarchive_config::TaggerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::error::{optional, ArchiveError, Result};
use crate::media::MediaType;
use crate::meta::Field;
use crate::node::Node;
use crate::scan::entry_names;

const TEMP_PREFIX: &str = ".tagging-";

/// Tags written into every non-picture media file of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFields {
    pub title: String,
    pub author: String,
    pub album_artist: String,
    pub album: String,
    pub show: String,
    pub genre: String,
    pub episode_id: String,
    pub comment: String,
    pub year: Option<i32>,
    pub track: Option<u32>,
    pub synopsis: Option<String>,
}

impl TagFields {
    /// Resolve the tags of `node`.
    ///
    /// Genre and the podcast's homepage are required. Year, track and
    /// synopsis are left out when the node cannot resolve date, number or
    /// subtitle.
    pub fn collect(node: &Node) -> Result<Self> {
        let podcast = node.podcast();
        let podcast_node = Node::Podcast(podcast.clone());
        let podcast_name = podcast.name()?;

        let year = match optional(node.text(Field::Date))? {
            Some(date) => Some(parse_year(node, &date)?),
            None => None,
        };

        Ok(Self {
            title: node.title()?,
            author: node.author()?,
            album_artist: podcast_node.author()?,
            album: podcast_name.clone(),
            show: podcast_name,
            genre: node.text(Field::Genre)?,
            episode_id: node.file_id()?,
            comment: podcast.homepage()?,
            year,
            track: optional(node.number())?,
            synopsis: optional(node.text(Field::Subtitle))?,
        })
    }

    /// `(key, value)` pairs in the order they are written.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("title", self.title.clone()),
            ("author", self.author.clone()),
            ("album_artist", self.album_artist.clone()),
            ("album", self.album.clone()),
            ("show", self.show.clone()),
            ("genre", self.genre.clone()),
            ("episode_id", self.episode_id.clone()),
            ("comment", self.comment.clone()),
        ];

        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(track) = self.track {
            pairs.push(("track", track.to_string()));
        }
        if let Some(synopsis) = &self.synopsis {
            pairs.push(("synopsis", synopsis.clone()));
        }

        pairs
    }
}

fn parse_year(node: &Node, date: &str) -> Result<i32> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|date| date.year())
        .map_err(|e| ArchiveError::InvalidValue {
            key: Field::Date.key().to_string(),
            path: node.yaml_file(),
            message: format!("date '{}' is not YYYY-MM-DD: {}", date, e),
        })
}

/// Writes a node's tags into one of its media files.
pub trait Tagger {
    fn tag(&self, media_type: MediaType, format: &str, path: &Path, node: &Node) -> Result<()>;
}

/// [`Tagger`] that remuxes files through an ffmpeg compatible program.
#[derive(Debug, Clone)]
pub struct FfmpegTagger {
    config: TaggerConfig,
}

impl FfmpegTagger {
    pub fn from_config(config: &TaggerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    fn write_tags(&self, path: &Path, fields: &TagFields) -> Result<()> {
        let temp_path = temp_path_for(path);
        let mut cmd = build_tag_command(self.program(), path, &temp_path, fields);

        let failed = |reason: String| ArchiveError::TaggingFailed {
            path: path.to_path_buf(),
            reason,
        };

        let status = cmd
            .status()
            .map_err(|e| failed(format!("cannot run {}: {}", self.program(), e)))?;

        if !status.success() {
            if temp_path.exists() {
                fs::remove_file(&temp_path).map_err(|e| ArchiveError::io(&temp_path, e))?;
            }
            return Err(failed(match status.code() {
                Some(code) => format!("{} exited with code {}", self.program(), code),
                None => format!("{} was terminated by signal", self.program()),
            }));
        }

        fs::rename(&temp_path, path).map_err(|e| ArchiveError::io(path, e))
    }
}

impl Tagger for FfmpegTagger {
    fn tag(&self, media_type: MediaType, format: &str, path: &Path, node: &Node) -> Result<()> {
        if media_type == MediaType::Picture {
            debug!(path = %path.display(), "pictures are not tagged");
            return Ok(());
        }

        let fields = TagFields::collect(node)?;
        info!(path = %path.display(), format = %format, "tagging");
        self.write_tags(path, &fields)
    }
}

/// Sibling of `path` the tagger writes to before replacing the original.
/// The extension is kept so the container format stays the same.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", TEMP_PREFIX, file_name))
}

/// Delete temp files an interrupted tagger run left behind in `dir`.
/// Returns how many were removed; a missing `dir` has none.
pub fn remove_stale_temp_files(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for name in entry_names(dir)? {
        let path = dir.join(&name);
        if !name.starts_with(TEMP_PREFIX) || !path.is_file() {
            continue;
        }

        fs::remove_file(&path).map_err(|e| ArchiveError::io(&path, e))?;
        warn!(path = %path.display(), "removed stale tagging file");
        removed += 1;
    }

    Ok(removed)
}

/// Build the tagging command:
/// `<program> -nostdin -y -i <path> -map 0 -c copy -metadata k=v ... <temp_path>`.
pub fn build_tag_command(
    program: &str,
    path: &Path,
    temp_path: &Path,
    fields: &TagFields,
) -> Command {
    let mut cmd = Command::new(program);

    cmd.arg("-nostdin").arg("-y");
    cmd.arg("-i").arg(path);
    cmd.arg("-map").arg("0");
    cmd.arg("-c").arg("copy");

    for (key, value) in fields.pairs() {
        cmd.arg("-metadata").arg(format!("{}={}", key, value));
    }

    cmd.arg(temp_path);

    cmd
}
