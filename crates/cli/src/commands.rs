//! Subcommand handlers.

use anyhow::Context;
use podarchive::{
    add_meta_information, build_media_files, run_startup_checks, validate, FfmpegConverter,
    FfmpegTagger, MetaStore, Node, NodeSummary, Podcast,
};
use podarchive_config::Config;
use std::rc::Rc;
use tracing::{info, warn};

use crate::{Cli, Command, Target};

pub fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Command::Validate(target) => run_validate(target),
        Command::Build(target) => {
            check_tools(cli, config)?;
            run_build(target, config)
        }
        Command::Tag(target) => {
            check_tools(cli, config)?;
            run_tag(target, config)
        }
        Command::Show { target, json } => run_show(target, *json),
    }
}

fn check_tools(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    if cli.skip_checks {
        warn!("skipping external tool checks (--skip-checks)");
        return Ok(());
    }
    run_startup_checks(config)?;
    Ok(())
}

/// Open the podcast and pick the node `--only` names, or the podcast itself.
fn open_target(target: &Target) -> anyhow::Result<Node> {
    let store = Rc::new(MetaStore::new());
    let podcast = Podcast::open(&target.podcast_dir, store)
        .with_context(|| format!("cannot open podcast '{}'", target.podcast_dir.display()))?;

    match &target.only {
        Some(specifier) => podcast
            .select(specifier)
            .with_context(|| format!("cannot select '{}'", specifier)),
        None => Ok(Node::Podcast(podcast)),
    }
}

fn run_validate(target: &Target) -> anyhow::Result<()> {
    let node = open_target(target)?;
    validate(&node)?;
    info!(node = %node, "validation passed");
    println!("{} is valid", node);
    Ok(())
}

fn run_build(target: &Target, config: &Config) -> anyhow::Result<()> {
    let node = open_target(target)?;
    let converter = FfmpegConverter::from_config(&config.converter);

    let stats = build_media_files(&node, &converter)?;
    println!(
        "{} files built, {} up to date, {} without conversion rule",
        stats.converted, stats.up_to_date, stats.unsupported
    );
    Ok(())
}

fn run_tag(target: &Target, config: &Config) -> anyhow::Result<()> {
    let node = open_target(target)?;
    let tagger = FfmpegTagger::from_config(&config.tagger);

    let stats = add_meta_information(&node, &tagger)?;
    println!("{} files tagged in {} nodes", stats.files, stats.nodes);
    Ok(())
}

fn run_show(target: &Target, json: bool) -> anyhow::Result<()> {
    let node = open_target(target)?;
    let summary = NodeSummary::collect(&node)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render());
    }
    Ok(())
}
