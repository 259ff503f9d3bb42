//! Node metadata and the YAML metadata store.
//!
//! Each node keeps its metadata in a `<kind>.yml` mapping. Parsed documents
//! are cached by absolute path and re-read when the file's modification
//! time moves past the cached one.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::media::MediaType;

/// Per media type list of file formats, e.g. `audio: [flac, wav]`.
pub type FormatTable = BTreeMap<MediaType, Vec<String>>;

/// Text-valued metadata attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Subtitle,
    Id,
    Email,
    EpisodePrefix,
    Date,
    Genre,
    Homepage,
}

impl Field {
    /// Key of the field in the yaml mapping.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Subtitle => "subtitle",
            Field::Id => "id",
            Field::Email => "email",
            Field::EpisodePrefix => "episode_prefix",
            Field::Date => "date",
            Field::Genre => "genre",
            Field::Homepage => "homepage",
        }
    }
}

/// Parsed contents of a node's yaml file.
///
/// The document is kept as a mapping and values are only checked when an
/// attribute is read, so a badly typed key fails lookups of that key and
/// nothing else.
#[derive(Debug, Clone)]
pub struct Metadata {
    path: PathBuf,
    mapping: Mapping,
}

impl Metadata {
    /// Parse the yaml document read from `path`. An empty document is an
    /// empty mapping; any other non-mapping document is `InvalidFormat`.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let value: Value = match serde_yaml::from_str(content) {
            Ok(value) => value,
            Err(e) => return Err(invalid_format(path, e.to_string())),
        };

        let mapping = match value {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => return Err(invalid_format(path, "document is not a mapping")),
        };

        Ok(Self { path, mapping })
    }

    /// The file this document was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the document has a top-level `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.mapping.contains_key(key)
    }

    /// Value of a text field, if present. Numbers and booleans are read as
    /// their text, so `name: 1984` is the name "1984".
    pub fn text(&self, field: Field) -> Result<Option<String>> {
        self.value(field.key())
            .map(|value| self.scalar_text(field.key(), value))
            .transpose()
    }

    /// A list of text values. A single value is a list of one.
    pub fn text_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        let Some(value) = self.value(key) else {
            return Ok(None);
        };

        let items = match value {
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.scalar_text(key, item))
                .collect::<Result<Vec<_>>>()?,
            single => vec![self.scalar_text(key, single)?],
        };
        Ok(Some(items))
    }

    /// Deserialize the value of `key`, if present.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.value(key)
            .map(|value| {
                serde_yaml::from_value(value.clone())
                    .map_err(|e| self.invalid_value(key, e.to_string()))
            })
            .transpose()
    }

    pub fn authors(&self) -> Result<Option<Vec<String>>> {
        self.text_list("authors")
    }

    pub fn number(&self) -> Result<Option<u32>> {
        self.get("number")
    }

    pub fn media_types(&self) -> Result<Option<Vec<MediaType>>> {
        self.get("media_types")
    }

    pub fn input_formats(&self) -> Result<Option<FormatTable>> {
        self.get("input_formats")
    }

    pub fn target_formats(&self) -> Result<Option<FormatTable>> {
        self.get("target_formats")
    }

    pub fn personal_media_dirs(&self) -> Result<Option<Vec<String>>> {
        self.text_list("personal_media_dirs")
    }

    // `key:` with nothing after it counts as absent
    fn value(&self, key: &str) -> Option<&Value> {
        match self.mapping.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn scalar_text(&self, key: &str, value: &Value) -> Result<String> {
        scalar_text(value).ok_or_else(|| self.invalid_value(key, "expected a single value"))
    }

    fn invalid_value(&self, key: &str, message: impl Into<String>) -> ArchiveError {
        ArchiveError::InvalidValue {
            key: key.to_string(),
            path: self.path.clone(),
            message: message.into(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        _ => None,
    }
}

fn invalid_format(path: PathBuf, message: impl Into<String>) -> ArchiveError {
    ArchiveError::InvalidFormat {
        path,
        message: message.into(),
    }
}

struct CacheEntry {
    mtime: SystemTime,
    meta: Rc<Metadata>,
}

/// Read-through cache of parsed metadata files.
///
/// Created once per process and shared by every node of a podcast.
#[derive(Default)]
pub struct MetaStore {
    cache: RefCell<HashMap<PathBuf, CacheEntry>>,
}

impl MetaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse the yaml file at `path`.
    ///
    /// Fails with `NotFound` if `path` is not a regular file and with
    /// `InvalidFormat` if it cannot be parsed. Values are not checked here.
    pub fn load(&self, path: &Path) -> Result<Rc<Metadata>> {
        if !path.is_file() {
            return Err(ArchiveError::NotFound(format!(
                "yaml file '{}' does not exist",
                path.display()
            )));
        }

        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| ArchiveError::io(path, e))?;

        if let Some(entry) = self.cache.borrow().get(path) {
            if entry.mtime >= mtime {
                return Ok(Rc::clone(&entry.meta));
            }
            debug!(path = %path.display(), "metadata file changed, reloading");
        }

        let content = fs::read_to_string(path).map_err(|e| ArchiveError::io(path, e))?;
        let meta = Rc::new(Metadata::parse(path, &content)?);
        debug!(path = %path.display(), "loaded metadata");

        self.cache.borrow_mut().insert(
            path.to_path_buf(),
            CacheEntry {
                mtime,
                meta: Rc::clone(&meta),
            },
        );

        Ok(meta)
    }

    /// Check that `path` exists and holds a well-formed metadata mapping.
    pub fn validate(&self, path: &Path) -> Result<()> {
        self.load(path).map(|_| ())
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}
