use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::recording::RecordingConfig;

/// Settings as read from file, environment and command line
///
/// Durations are whole seconds. Environment variables use the bare key in
/// upper case (`URL`, `OUTPUT_FOLDER`, `SEGMENT_DURATION`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub url: String,
    pub output_folder: String,
    pub extension: String,
    pub initial_writer_delay: u64,
    pub segment_duration: u64,
    pub write_period: u64,
    pub close_open_files_on_start: bool,
    pub no_data_timeout: u64,
}

/// Values given on the command line; they win over every other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub output_folder: Option<String>,
    pub extension: Option<String>,
    pub initial_writer_delay: Option<u64>,
    pub segment_duration: Option<u64>,
    pub write_period: Option<u64>,
    pub close_open_files_on_start: Option<bool>,
    pub no_data_timeout: Option<u64>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with(path, &ConfigOverrides::default())
    }

    /// Defaults, then the optional file at `path`, then the environment,
    /// then `overrides`
    pub fn load_with(path: &str, overrides: &ConfigOverrides) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("extension", "mp3")?
            .set_default("initial_writer_delay", 5u64)?
            .set_default("segment_duration", 60u64)?
            .set_default("write_period", 1u64)?
            .set_default("close_open_files_on_start", true)?
            .set_default("no_data_timeout", 30u64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::default().try_parsing(true))
            .set_override_option("url", overrides.url.clone())?
            .set_override_option("output_folder", overrides.output_folder.clone())?
            .set_override_option("extension", overrides.extension.clone())?
            .set_override_option("initial_writer_delay", overrides.initial_writer_delay)?
            .set_override_option("segment_duration", overrides.segment_duration)?
            .set_override_option("write_period", overrides.write_period)?
            .set_override_option(
                "close_open_files_on_start",
                overrides.close_open_files_on_start,
            )?
            .set_override_option("no_data_timeout", overrides.no_data_timeout)?
            .build()?;

        settings
            .try_deserialize()
            .context("Invalid configuration (URL and OUTPUT_FOLDER are required)")
    }

    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig {
            url: self.url.clone(),
            output_dir: self.output_folder.clone().into(),
            extension: self.extension.clone(),
            initial_writer_delay: Duration::from_secs(self.initial_writer_delay),
            segment_duration: self.segment_duration,
            write_period: Duration::from_secs(self.write_period),
            recover_open_files: self.close_open_files_on_start,
            network_timeout: Duration::from_secs(self.no_data_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_values_with_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("streamrec.toml");
        fs::write(
            &path,
            "url = \"http://example.com/live\"\noutput_folder = \"/tmp/out\"\nsegment_duration = 120\n",
        )?;

        let cfg = Config::load(path.to_str().unwrap())?;

        assert_eq!(cfg.url, "http://example.com/live");
        assert_eq!(cfg.output_folder, "/tmp/out");
        assert_eq!(cfg.segment_duration, 120);
        assert_eq!(cfg.write_period, 1);
        assert_eq!(cfg.initial_writer_delay, 5);
        assert!(cfg.close_open_files_on_start);
        assert_eq!(cfg.extension, "mp3");
        Ok(())
    }

    #[test]
    fn test_overrides_win_over_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("streamrec.toml");
        fs::write(
            &path,
            "url = \"http://example.com/live\"\noutput_folder = \"/tmp/out\"\nwrite_period = 3\n",
        )?;

        let overrides = ConfigOverrides {
            url: Some("http://other.example/stream".to_string()),
            write_period: Some(2),
            close_open_files_on_start: Some(false),
            ..Default::default()
        };
        let cfg = Config::load_with(path.to_str().unwrap(), &overrides)?;

        assert_eq!(cfg.url, "http://other.example/stream");
        assert_eq!(cfg.write_period, 2);
        assert!(!cfg.close_open_files_on_start);

        let recording = cfg.recording_config();
        assert_eq!(recording.write_period, Duration::from_secs(2));
        assert!(!recording.recover_open_files);
        assert_eq!(recording.network_timeout, Duration::from_secs(30));
        Ok(())
    }
}
