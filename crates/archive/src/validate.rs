//! Read-only consistency check of an archive tree.

use tracing::debug;

use crate::error::{ArchiveError, Result};
use crate::media::MediaType;
use crate::node::{Node, Podcast};
use crate::scan::entry_names;

/// Name of the media subdirectory that is never checked.
const ORIGINALS_DIR: &str = "originals";

/// Validate `node` and, depth first, every node below it.
///
/// Stops at the first problem found. The returned error names the node it
/// was raised in.
pub fn validate(node: &Node) -> Result<()> {
    debug!(node = %node, "validating");
    check_node(node).map_err(|e| e.in_node(node.to_string()))?;

    let children = node.children().map_err(|e| e.in_node(node.to_string()))?;
    for child in children {
        let child = child.map_err(|e| e.in_node(node.to_string()))?;
        validate(&child)?;
    }

    Ok(())
}

fn check_node(node: &Node) -> Result<()> {
    let meta_dir = node.meta_dir();
    if !meta_dir.is_dir() {
        return Err(ArchiveError::missing_dir(&meta_dir));
    }

    let yaml_file = node.yaml_file();
    let meta = node.meta()?;
    for key in node.kind().required_keys() {
        if !meta.contains_key(key) {
            return Err(ArchiveError::MissingKey {
                key: key.to_string(),
                path: yaml_file,
            });
        }
    }

    if let Node::Podcast(podcast) = node {
        check_podcast(podcast)?;
    }

    check_media_dir(node)
}

/// Every entry of the node's media directory must be a source file, the
/// originals directory, or the media directory of a child node.
fn check_media_dir(node: &Node) -> Result<()> {
    let media_dir = node.media_dir()?;
    if !media_dir.is_dir() {
        return Ok(());
    }

    let media_types = node.media_types()?;

    for name in entry_names(&media_dir)? {
        if name == ORIGINALS_DIR {
            continue;
        }

        let path = media_dir.join(&name);

        if path.is_dir() {
            let has_meta = node
                .child(&name)
                .map_or(false, |child| child.yaml_file().is_file());
            if !has_meta {
                return Err(ArchiveError::MissingMetadata {
                    what: "media dir",
                    path,
                });
            }
        } else if !is_source_file_name(&name, &media_types) {
            return Err(ArchiveError::UnrecognizedFile { path });
        }
    }

    Ok(())
}

fn is_source_file_name(name: &str, media_types: &[MediaType]) -> bool {
    name.starts_with("original.")
        || media_types
            .iter()
            .any(|media_type| name.starts_with(&format!("{}.", media_type)))
}

fn check_podcast(podcast: &Podcast) -> Result<()> {
    for dir in [
        podcast.base_dir().to_path_buf(),
        podcast.media_base_dir(),
        podcast.build_dir(),
    ] {
        if !dir.is_dir() {
            return Err(ArchiveError::missing_dir(&dir));
        }
    }

    let personal = podcast.personal_media_dirs()?;
    let media_base_dir = podcast.media_base_dir();

    for name in entry_names(&media_base_dir)? {
        if personal.contains(&name) {
            continue;
        }
        if !addresses_node(podcast, &name) {
            return Err(ArchiveError::MissingMetadata {
                what: "media dir",
                path: media_base_dir.join(name),
            });
        }
    }

    let build_dir = podcast.build_dir();

    for name in entry_names(&build_dir)? {
        let path = build_dir.join(&name);
        if !path.is_file() {
            continue;
        }

        let known = match name.rsplit_once('.') {
            Some((file_id, _)) => addresses_node(podcast, file_id),
            None => false,
        };
        if !known {
            return Err(ArchiveError::MissingMetadata {
                what: "build file",
                path,
            });
        }
    }

    Ok(())
}

/// Whether `key` resolves to a node whose yaml file exists.
fn addresses_node(podcast: &Podcast, key: &str) -> bool {
    podcast
        .lookup(key)
        .map_or(false, |node| node.yaml_file().is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::meta::Field;
    use crate::test_support::ArchiveFixture;
    use std::fs;

    fn validate_podcast(fixture: &ArchiveFixture) -> Result<()> {
        validate(&Node::from(fixture.podcast()))
    }

    #[test]
    fn test_complete_archive_is_valid() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "").part("x", "");
        fixture.episode(2, "b", "");
        fixture.media_file("demo", "picture.jpg");
        fixture.media_file("ep1_a", "audio.flac");
        fixture.media_file("ep1_a", "original.wav");
        fixture.media_file("ep1_a/x", "audio.mp3");
        fixture.build_file("ep1_a.mp3");
        fixture.build_file("ep1_a:_x.ogg");
        fixture.build_file("demo.jpg");

        validate_podcast(&fixture).unwrap();
    }

    #[test]
    fn test_picture_file_in_media_dir_passes() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.media_file("ep1_a", "picture.jpg");

        validate_podcast(&fixture).unwrap();
    }

    #[test]
    fn test_unrecognized_media_file() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.media_file("ep1_a", "random.txt");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnrecognizedFile);
        let message = err.to_string();
        assert!(message.starts_with("Episode(ep1_a): "), "{}", message);
        assert!(message.contains("random.txt"), "{}", message);
    }

    #[test]
    fn test_file_for_excluded_media_type_is_unrecognized() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "media_types: [audio]\n");
        fixture.media_file("ep1_a", "video.mp4");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnrecognizedFile);
    }

    #[test]
    fn test_originals_dir_is_ignored() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.media_file("ep1_a/originals", "anything.raw");

        validate_podcast(&fixture).unwrap();
    }

    #[test]
    fn test_media_subdir_without_metadata() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.media_file("ep1_a/ghost", "audio.mp3");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMetadata);
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_missing_required_key() {
        let fixture = ArchiveFixture::new("ep");
        fixture.write_yaml("meta/ep1_a/episode.yml", "name: A\ndate: 2015-03-01\n");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert!(err.to_string().contains("'subtitle'"));
    }

    #[test]
    fn test_missing_podcast_key() {
        let fixture = ArchiveFixture::new("ep");
        fixture.write_yaml(
            "meta/podcast.yml",
            "name: Demo\nsubtitle: s\nid: demo\nepisode_prefix: ep\n",
        );

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert!(err.to_string().contains("'email'"));
    }

    #[test]
    fn test_episode_dir_without_yaml_is_not_found() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode_dir("ep1_a");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_yaml_is_invalid_format() {
        let fixture = ArchiveFixture::new("ep");
        fixture.write_yaml("meta/ep1_a/episode.yml", "name: [unclosed\n");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_numeric_metadata_values_are_valid() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "name: 1984\ndate: 2015\ngenre: 42\n");

        validate_podcast(&fixture).unwrap();

        let episode = fixture.podcast().lookup("ep1_a").unwrap();
        assert_eq!(episode.text(Field::Name).unwrap(), "1984");
        assert_eq!(episode.text(Field::Date).unwrap(), "2015");
        assert_eq!(episode.text(Field::Genre).unwrap(), "42");
    }

    #[test]
    fn test_missing_build_dir() {
        let fixture = ArchiveFixture::new("ep");
        fs::remove_dir(fixture.path("build")).unwrap();

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("build"));
    }

    #[test]
    fn test_orphaned_build_file() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.build_file("ep9_gone.mp3");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMetadata);
        assert!(err.to_string().contains("build file"));
    }

    #[test]
    fn test_build_file_without_extension() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.build_file("ep1_a");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMetadata);
    }

    #[test]
    fn test_build_file_of_missing_part() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.build_file("ep1_a:_nopart.mp3");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMetadata);
    }

    #[test]
    fn test_unknown_media_base_entry() {
        let fixture = ArchiveFixture::new("ep");
        fixture.media_file("scratch", "notes.txt");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingMetadata);
        assert!(err.to_string().contains("scratch"));
    }

    #[test]
    fn test_personal_media_dirs_are_skipped() {
        let fixture = ArchiveFixture::with_podcast_yaml("ep", "personal_media_dirs: [scratch]\n");
        fixture.media_file("scratch", "notes.txt");

        validate_podcast(&fixture).unwrap();
    }

    #[test]
    fn test_part_errors_carry_part_context() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.write_yaml("meta/ep1_a/p/episodepart.yml", "subtitle: nameless\n");

        let err = validate_podcast(&fixture).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingKey);
        assert!(err.to_string().starts_with("EpisodePart(ep1_a:_p): "));
    }

    #[test]
    fn test_validating_a_subtree_only_checks_below_it() {
        let fixture = ArchiveFixture::new("ep");
        fixture.episode(1, "a", "");
        fixture.episode(2, "b", "");
        fixture.media_file("ep2_b", "random.txt");

        let podcast = fixture.podcast();
        validate(&podcast.lookup("ep1_a").unwrap()).unwrap();
        assert!(validate(&podcast.lookup("ep2_b").unwrap()).is_err());
    }
}
