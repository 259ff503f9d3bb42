//! Configuration module for podarchive
//!
//! Handles loading tool configuration from TOML files and environment variable overrides.

pub mod config;

pub use config::*;
