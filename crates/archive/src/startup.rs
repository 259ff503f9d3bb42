//! Preflight checks for the external media tools.
//!
//! Before media files are built or tagged, the configured converter and
//! tagger programs are run once with `-version` to make sure they exist.

use podarchive_config::Config;
use std::process::Command;
use thiserror::Error;
use tracing::info;

/// Error types for startup checks
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{program} not available: {reason}")]
    ToolUnavailable { program: String, reason: String },
}

/// Extract the version from the banner of an ffmpeg style `-version` call.
///
/// Handles `ffmpeg version 8.0 ...` as well as git builds such as
/// `ffmpeg version n8.0-123-gabcdef ...`, returning `8.0` and
/// `8.0-123-gabcdef`.
pub fn parse_tool_version(version_output: &str) -> Option<String> {
    version_output.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        words.find(|word| word.eq_ignore_ascii_case("version"))?;
        let version = words.next()?.trim_end_matches(',');
        let version = version
            .strip_prefix('n')
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(version);
        Some(version.to_string())
    })
}

/// Run `<program> -version` and return the reported version, if any.
pub fn check_tool_available(program: &str) -> Result<Option<String>, StartupError> {
    let unavailable = |reason: String| StartupError::ToolUnavailable {
        program: program.to_string(),
        reason,
    };

    let output = Command::new(program)
        .arg("-version")
        .output()
        .map_err(|e| {
            unavailable(format!(
                "{} -version failed; is it in PATH? Error: {}",
                program, e
            ))
        })?;

    if !output.status.success() {
        return Err(unavailable(format!("{} -version failed", program)));
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    Ok(parse_tool_version(&version_output))
}

/// Check the converter and, if it is a different program, the tagger.
pub fn run_startup_checks(cfg: &Config) -> Result<(), StartupError> {
    let mut programs = vec![cfg.converter.program.as_str()];
    if cfg.tagger.program != cfg.converter.program {
        programs.push(cfg.tagger.program.as_str());
    }

    for program in programs {
        let version = check_tool_available(program)?;
        info!(
            program = %program,
            version = version.as_deref().unwrap_or("unknown"),
            "external tool available"
        );
    }

    Ok(())
}
