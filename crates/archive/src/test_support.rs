//! Temporary podcast archives for tests.

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;

use crate::meta::MetaStore;
use crate::node::Podcast;

const FORMATS_YAML: &str = "\
input_formats:
  picture: [jpg, png]
  audio: [flac, mp3, ogg]
  video: [mp4]
target_formats:
  picture: [jpg]
  audio: [mp3, ogg]
";

/// A podcast archive in a temporary directory.
///
/// The podcast has id `demo`, name `Demo Cast` and the given episode
/// prefix. Episodes and parts get a name, subtitle and date unless the
/// extra yaml passed in sets those keys itself.
pub struct ArchiveFixture {
    temp_dir: TempDir,
    prefix: String,
}

impl ArchiveFixture {
    /// Archive whose podcast.yml has the required keys and format tables.
    pub fn new(prefix: &str) -> Self {
        Self::with_podcast_yaml(prefix, "")
    }

    /// Like [`ArchiveFixture::new`] with extra podcast.yml content.
    pub fn with_podcast_yaml(prefix: &str, extra: &str) -> Self {
        Self::bare(prefix, &format!("{}{}", FORMATS_YAML, extra))
    }

    /// Archive whose podcast.yml has only the required keys plus `extra`.
    pub fn bare(prefix: &str, extra: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        for dir in ["meta", "media", "build"] {
            fs::create_dir(temp_dir.path().join(dir)).unwrap();
        }

        let fixture = Self {
            temp_dir,
            prefix: prefix.to_string(),
        };

        let defaults = [
            ("name", "Demo Cast".to_string()),
            ("subtitle", "A podcast for tests".to_string()),
            ("id", "demo".to_string()),
            ("email", "demo@example.org".to_string()),
            ("episode_prefix", format!("\"{}\"", prefix)),
        ];
        fixture.write_yaml("meta/podcast.yml", &merge_yaml(&defaults, extra));
        fixture
    }

    pub fn base_dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Open the archive with a fresh metadata store.
    pub fn podcast(&self) -> Podcast {
        Podcast::open(self.temp_dir.path(), Rc::new(MetaStore::new())).unwrap()
    }

    /// Write `content` to `rel_path`, creating parent directories.
    pub fn write_yaml(&self, rel_path: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(rel_path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Create `meta/<prefix><number>_<id>/episode.yml`.
    pub fn episode(&self, number: u32, id: &str, extra: &str) -> EpisodeFixture<'_> {
        let dir_name = format!("{}{}_{}", self.prefix, number, id);
        let defaults = [
            ("name", format!("Episode {}", id)),
            ("subtitle", format!("All about {}", id)),
            ("date", "2015-03-01".to_string()),
        ];
        self.write_yaml(
            &format!("meta/{}/episode.yml", dir_name),
            &merge_yaml(&defaults, extra),
        );

        EpisodeFixture {
            fixture: self,
            dir_name,
        }
    }

    /// Create an empty directory under `meta/`.
    pub fn episode_dir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join("meta").join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Create a file under `media/<rel_dir>/`.
    pub fn media_file(&self, rel_dir: &str, name: &str) -> PathBuf {
        let dir = self.temp_dir.path().join("media").join(rel_dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, b"media").unwrap();
        path
    }

    /// Create a file under `build/`.
    pub fn build_file(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join("build").join(name);
        fs::write(&path, b"built").unwrap();
        path
    }

    pub fn path(&self, rel_path: &str) -> PathBuf {
        self.temp_dir.path().join(rel_path)
    }
}

/// Handle for adding parts to a fixture episode.
pub struct EpisodeFixture<'a> {
    fixture: &'a ArchiveFixture,
    dir_name: String,
}

impl EpisodeFixture<'_> {
    /// Create `meta/<episode>/<id>/episodepart.yml`.
    pub fn part(&self, id: &str, extra: &str) -> &Self {
        let defaults = [("name", format!("Part {}", id))];
        self.fixture.write_yaml(
            &format!("meta/{}/{}/episodepart.yml", self.dir_name, id),
            &merge_yaml(&defaults, extra),
        );
        self
    }
}

/// Default `key: value` lines for keys `extra` does not set, then `extra`.
fn merge_yaml(defaults: &[(&str, String)], extra: &str) -> String {
    let overridden = |key: &str| {
        extra
            .lines()
            .any(|line| line.split_once(':').map(|(k, _)| k) == Some(key))
    };

    let mut yaml = String::new();
    for (key, value) in defaults {
        if !overridden(key) {
            yaml.push_str(&format!("{}: {}\n", key, value));
        }
    }
    yaml.push_str(extra);
    yaml
}
