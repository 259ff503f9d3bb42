//! Building and tagging the media files of a node tree.
//!
//! Both passes visit a node before its children and stop at the first
//! error, which names the node it happened in.

use tracing::{debug, info};

use crate::encode::{remove_stale_temp_files, ConvertOutcome, ConvertParams, Converter, Tagger};
use crate::error::Result;
use crate::node::Node;

/// Counters for one [`build_media_files`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes: usize,
    pub converted: usize,
    pub up_to_date: usize,
    pub unsupported: usize,
}

/// Counters for one [`add_meta_information`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagStats {
    pub nodes: usize,
    pub files: usize,
}

/// Convert every source file below `node` into each configured target
/// format whose build file does not exist yet.
pub fn build_media_files(node: &Node, converter: &dyn Converter) -> Result<BuildStats> {
    let mut stats = BuildStats::default();
    build_node(node, converter, &mut stats)?;
    info!(
        nodes = stats.nodes,
        converted = stats.converted,
        up_to_date = stats.up_to_date,
        unsupported = stats.unsupported,
        "build finished"
    );
    Ok(stats)
}

fn build_node(node: &Node, converter: &dyn Converter, stats: &mut BuildStats) -> Result<()> {
    build_own_files(node, converter, stats).map_err(|e| e.in_node(node.to_string()))?;
    stats.nodes += 1;

    for child in node.children().map_err(|e| e.in_node(node.to_string()))? {
        let child = child.map_err(|e| e.in_node(node.to_string()))?;
        build_node(&child, converter, stats)?;
    }

    Ok(())
}

fn build_own_files(node: &Node, converter: &dyn Converter, stats: &mut BuildStats) -> Result<()> {
    let podcast = node.podcast();

    for media_type in node.media_types()? {
        let Some(source) = node.input_file(media_type)? else {
            continue;
        };

        for target_format in podcast.target_formats(media_type)? {
            let target_path = node.target_file(&target_format)?;

            if target_path.exists() {
                debug!(target = %target_path.display(), "already built");
                stats.up_to_date += 1;
                continue;
            }

            let params = ConvertParams {
                media_type,
                input_format: source.format.clone(),
                input_path: source.path.clone(),
                target_format,
                target_path,
            };

            match converter.convert(&params)? {
                ConvertOutcome::Copied | ConvertOutcome::Transcoded => stats.converted += 1,
                ConvertOutcome::Unsupported => stats.unsupported += 1,
            }
        }
    }

    Ok(())
}

/// Tag the source files and existing build files of every node below
/// `node`. Temp files of an interrupted earlier run are removed first.
pub fn add_meta_information(node: &Node, tagger: &dyn Tagger) -> Result<TagStats> {
    remove_stale_temp_files(&node.podcast().build_dir())?;

    let mut stats = TagStats::default();
    tag_node(node, tagger, &mut stats)?;
    info!(nodes = stats.nodes, files = stats.files, "tagging finished");
    Ok(stats)
}

fn tag_node(node: &Node, tagger: &dyn Tagger, stats: &mut TagStats) -> Result<()> {
    tag_own_files(node, tagger, stats).map_err(|e| e.in_node(node.to_string()))?;
    stats.nodes += 1;

    for child in node.children().map_err(|e| e.in_node(node.to_string()))? {
        let child = child.map_err(|e| e.in_node(node.to_string()))?;
        tag_node(&child, tagger, stats)?;
    }

    Ok(())
}

fn tag_own_files(node: &Node, tagger: &dyn Tagger, stats: &mut TagStats) -> Result<()> {
    let podcast = node.podcast();
    remove_stale_temp_files(&node.media_dir()?)?;

    for media_type in node.media_types()? {
        if let Some(source) = node.input_file(media_type)? {
            tagger.tag(media_type, &source.format, &source.path, node)?;
            stats.files += 1;
        }

        for target_format in podcast.target_formats(media_type)? {
            let target_path = node.target_file(&target_format)?;
            if target_path.is_file() {
                tagger.tag(media_type, &target_format, &target_path, node)?;
                stats.files += 1;
            }
        }
    }

    Ok(())
}
