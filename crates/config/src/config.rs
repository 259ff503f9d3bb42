//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "podarchive.toml";

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

fn default_program() -> String {
    "ffmpeg".to_string()
}

fn default_bitrates() -> BTreeMap<String, String> {
    [("mp3", "64k"), ("ogg", "64k"), ("m4a", "48k")]
        .into_iter()
        .map(|(format, rate)| (format.to_string(), rate.to_string()))
        .collect()
}

/// Transcoder settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConverterConfig {
    /// Transcoder executable (ffmpeg-compatible command line)
    #[serde(default = "default_program")]
    pub program: String,
    /// Audio bitrate per target format; formats without an entry have no
    /// conversion rule
    #[serde(default = "default_bitrates")]
    pub bitrates: BTreeMap<String, String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            bitrates: default_bitrates(),
        }
    }
}

impl ConverterConfig {
    /// Bitrate configured for a target format, if any
    pub fn bitrate_for(&self, format: &str) -> Option<&str> {
        self.bitrates.get(format).map(String::as_str)
    }
}

/// Metadata tagger settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaggerConfig {
    /// Tagging executable (ffmpeg-compatible command line)
    #[serde(default = "default_program")]
    pub program: String,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub tagger: TaggerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - PODARCHIVE_CONVERTER -> converter.program
    /// - PODARCHIVE_TAGGER -> tagger.program
    /// - PODARCHIVE_LOG_LEVEL -> logging.level
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("PODARCHIVE_CONVERTER") {
            if !val.trim().is_empty() {
                self.converter.program = val;
            }
        }

        if let Ok(val) = env::var("PODARCHIVE_TAGGER") {
            if !val.trim().is_empty() {
                self.tagger.program = val;
            }
        }

        if let Ok(val) = env::var("PODARCHIVE_LOG_LEVEL") {
            if !val.trim().is_empty() {
                self.logging.level = val.to_lowercase();
            }
        }
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load an explicitly named config file, or `podarchive.toml` if present
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file yields the defaults. Environment overrides are applied either way.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;

    // Env var tests must not interleave
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env_vars() {
        env::remove_var("PODARCHIVE_CONVERTER");
        env::remove_var("PODARCHIVE_TAGGER");
        env::remove_var("PODARCHIVE_LOG_LEVEL");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_config_parses_all_sections(
            converter in "[a-z][a-z0-9_-]{0,15}",
            tagger in "[a-z][a-z0-9_-]{0,15}",
            format in "[a-z0-9]{2,5}",
            kbits in 8u32..512,
            level in prop_oneof![
                Just("trace"),
                Just("debug"),
                Just("info"),
                Just("warn"),
                Just("error"),
            ],
        ) {
            let toml_str = format!(
                r#"
[converter]
program = "{}"

[converter.bitrates]
{} = "{}k"

[tagger]
program = "{}"

[logging]
level = "{}"
"#,
                converter, format, kbits, tagger, level
            );

            let config = Config::parse_toml(&toml_str).expect("Valid TOML should parse");

            prop_assert_eq!(&config.converter.program, &converter);
            let bitrate = format!("{}k", kbits);
            prop_assert_eq!(config.converter.bitrate_for(&format), Some(bitrate.as_str()));
            prop_assert_eq!(config.converter.bitrates.len(), 1);
            prop_assert_eq!(&config.tagger.program, &tagger);
            prop_assert_eq!(config.logging.level.as_str(), level);
        }

        #[test]
        fn prop_env_overrides_programs(
            converter in "[a-z][a-z0-9_-]{0,15}",
            tagger in "[a-z][a-z0-9_-]{0,15}",
        ) {
            let _guard = ENV_MUTEX.lock().unwrap();
            clear_env_vars();

            let mut config = Config::parse_toml("").expect("Valid TOML");

            env::set_var("PODARCHIVE_CONVERTER", &converter);
            env::set_var("PODARCHIVE_TAGGER", &tagger);
            config.apply_env_overrides();
            clear_env_vars();

            prop_assert_eq!(config.converter.program, converter);
            prop_assert_eq!(config.tagger.program, tagger);
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_toml("").expect("Empty TOML should parse");

        assert_eq!(config.converter.program, "ffmpeg");
        assert_eq!(config.tagger.program, "ffmpeg");
        assert_eq!(config.converter.bitrate_for("mp3"), Some("64k"));
        assert_eq!(config.converter.bitrate_for("ogg"), Some("64k"));
        assert_eq!(config.converter.bitrate_for("m4a"), Some("48k"));
        assert_eq!(config.converter.bitrate_for("flac"), None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let toml_str = r#"
[tagger]
program = "avconv"
"#;
        let config = Config::parse_toml(toml_str).expect("Partial TOML should parse");

        assert_eq!(config.tagger.program, "avconv");
        assert_eq!(config.converter, ConverterConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_log_level_override_is_lowercased() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::default();
        env::set_var("PODARCHIVE_LOG_LEVEL", "DEBUG");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_blank_override_keeps_value() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::default();
        env::set_var("PODARCHIVE_CONVERTER", "  ");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(config.converter.program, "ffmpeg");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        let result = Config::load_or_default(Some(&missing));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = Config::parse_toml("[converter\nprogram = 1");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
