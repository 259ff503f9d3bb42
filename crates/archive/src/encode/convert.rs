//! Media conversion through an external transcoder.
//!
//! Conversions between identical formats are plain copies. Everything else
//! is handed to the configured program (ffmpeg by default) with the bitrate
//! configured for the target format.

use podarchive_config::ConverterConfig;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

use crate::error::{ArchiveError, Result};
use crate::media::MediaType;

/// One requested conversion of a source file into a target format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertParams {
    pub media_type: MediaType,
    pub input_format: String,
    pub input_path: PathBuf,
    pub target_format: String,
    pub target_path: PathBuf,
}

/// What a converter did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// Source and target format are the same; the file was copied.
    Copied,
    /// The external program wrote the target file.
    Transcoded,
    /// No conversion rule exists for the target format; nothing was written.
    Unsupported,
}

/// Produces a target file from a source file.
pub trait Converter {
    fn convert(&self, params: &ConvertParams) -> Result<ConvertOutcome>;
}

/// [`Converter`] that shells out to an ffmpeg compatible program.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.config.program
    }

    fn transcode(&self, params: &ConvertParams, bitrate: &str) -> Result<()> {
        let mut cmd = build_convert_command(self.program(), params, bitrate);

        let failed = |reason: String| ArchiveError::ConversionFailed {
            path: params.target_path.clone(),
            reason,
        };

        let status = cmd
            .status()
            .map_err(|e| failed(format!("cannot run {}: {}", self.program(), e)))?;

        if status.success() {
            return Ok(());
        }

        // A half written target would count as built on the next run.
        if params.target_path.exists() {
            fs::remove_file(&params.target_path)
                .map_err(|e| ArchiveError::io(&params.target_path, e))?;
        }

        Err(failed(match status.code() {
            Some(code) => format!("{} exited with code {}", self.program(), code),
            None => format!("{} was terminated by signal", self.program()),
        }))
    }
}

impl Converter for FfmpegConverter {
    fn convert(&self, params: &ConvertParams) -> Result<ConvertOutcome> {
        if params.input_format == params.target_format {
            fs::copy(&params.input_path, &params.target_path)
                .map_err(|e| ArchiveError::io(&params.target_path, e))?;
            info!(
                from = %params.input_path.display(),
                to = %params.target_path.display(),
                "copied"
            );
            return Ok(ConvertOutcome::Copied);
        }

        let Some(bitrate) = self.config.bitrate_for(&params.target_format) else {
            warn!(
                media_type = %params.media_type,
                from = %params.input_format,
                to = %params.target_format,
                "no conversion rule, skipping"
            );
            return Ok(ConvertOutcome::Unsupported);
        };

        info!(
            from = %params.input_path.display(),
            to = %params.target_path.display(),
            bitrate = %bitrate,
            "converting"
        );
        self.transcode(params, bitrate)?;
        Ok(ConvertOutcome::Transcoded)
    }
}

/// Build the transcoder command for one conversion:
/// `<program> -nostdin -i <input> -b:a <bitrate> <target>`.
pub fn build_convert_command(program: &str, params: &ConvertParams, bitrate: &str) -> Command {
    let mut cmd = Command::new(program);

    cmd.arg("-nostdin");
    cmd.arg("-i").arg(&params.input_path);
    cmd.arg("-b:a").arg(bitrate);
    cmd.arg(&params.target_path);

    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use std::ffi::OsStr;
    use tempfile::TempDir;

    fn get_command_args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .filter_map(|arg| arg.to_str().map(String::from))
            .collect()
    }

    fn has_flag_with_value(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|pair| pair[0] == flag && pair[1] == value)
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9_/.-]{1,50}").unwrap()
    }

    fn params(dir: &TempDir, input: &str, target: &str) -> ConvertParams {
        let format = |name: &str| name.rsplit('.').next().unwrap_or_default().to_string();
        ConvertParams {
            media_type: MediaType::Audio,
            input_format: format(input),
            input_path: dir.path().join(input),
            target_format: format(target),
            target_path: dir.path().join(target),
        }
    }

    fn converter(program: &str) -> FfmpegConverter {
        FfmpegConverter::from_config(&ConverterConfig {
            program: program.to_string(),
            ..ConverterConfig::default()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_convert_command_completeness(
            input_path in path_strategy(),
            target_path in path_strategy(),
            bitrate in "[1-9][0-9]{1,2}k",
        ) {
            let params = ConvertParams {
                media_type: MediaType::Audio,
                input_format: "flac".to_string(),
                input_path: PathBuf::from(&input_path),
                target_format: "mp3".to_string(),
                target_path: PathBuf::from(&target_path),
            };

            let cmd = build_convert_command("ffmpeg", &params, &bitrate);
            let args = get_command_args(&cmd);

            prop_assert_eq!(cmd.get_program(), OsStr::new("ffmpeg"));
            prop_assert!(has_flag_with_value(&args, "-i", &input_path), "args: {:?}", args);
            prop_assert!(has_flag_with_value(&args, "-b:a", &bitrate), "args: {:?}", args);
            prop_assert_eq!(args.last(), Some(&target_path));
        }
    }

    #[test]
    fn test_same_format_is_copied() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("picture.jpg"), b"jpeg data").unwrap();

        let params = params(&dir, "picture.jpg", "demo.jpg");
        let outcome = converter("does-not-exist").convert(&params).unwrap();

        assert_eq!(outcome, ConvertOutcome::Copied);
        assert_eq!(fs::read(&params.target_path).unwrap(), b"jpeg data");
    }

    #[test]
    fn test_unknown_target_format_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("picture.png"), b"png data").unwrap();

        let params = params(&dir, "picture.png", "demo.jpg");
        let outcome = converter("does-not-exist").convert(&params).unwrap();

        assert_eq!(outcome, ConvertOutcome::Unsupported);
        assert!(!params.target_path.exists());
    }

    #[test]
    fn test_missing_program_is_conversion_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("audio.flac"), b"flac data").unwrap();

        let params = params(&dir, "audio.flac", "ep1_a.mp3");
        let err = converter("podarchive-no-such-transcoder")
            .convert(&params)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
        assert!(err.to_string().contains("ep1_a.mp3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_conversion_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("audio.flac"), b"flac data").unwrap();

        let params = params(&dir, "audio.flac", "ep1_a.ogg");
        let err = converter("false").convert(&params).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
        assert!(err.to_string().contains("exited with code 1"));
        assert!(!params.target_path.exists());
    }
}
