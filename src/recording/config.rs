use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a recording run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Stream URL (http(s)://, file:// or a local path)
    pub url: String,

    /// Directory receiving the segment files
    pub output_dir: PathBuf,

    /// Extension of finalized segment files, without the dot
    pub extension: String,

    /// Delay before the first drain, so the timeline origin is estimated
    /// from a batch of packets rather than a single one
    pub initial_writer_delay: Duration,

    /// Length of one segment in whole seconds
    pub segment_duration: u64,

    /// How often the handoff queue is drained to disk
    pub write_period: Duration,

    /// Finalize temp files left behind by earlier runs before recording
    pub recover_open_files: bool,

    /// Upper bound on a single blocking open/read of the stream
    pub network_timeout: Duration,
}

impl RecordingConfig {
    pub fn new(url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_dir: output_dir.into(),
            extension: "mp3".to_string(),
            initial_writer_delay: Duration::from_secs(5),
            segment_duration: 60,
            write_period: Duration::from_secs(1),
            recover_open_files: true,
            network_timeout: Duration::from_secs(30),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("Stream URL must not be empty");
        }
        if self.segment_duration == 0 {
            bail!("Segment duration must be at least one second");
        }
        if self.write_period.is_zero() {
            bail!("Write period must be greater than zero");
        }
        if self.extension.trim_start_matches('.').is_empty() {
            bail!("Segment file extension must not be empty");
        }
        Ok(())
    }
}
