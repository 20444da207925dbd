use clap::Parser;

use crate::config::ConfigOverrides;

/// Record a live network audio stream into fixed-duration segment files
#[derive(Debug, Parser)]
#[command(name = "streamrec", version, about)]
pub struct Cli {
    /// Config file, without extension (optional)
    #[arg(long, default_value = "config/streamrec")]
    pub config: String,

    /// Stream URL (http(s)://, file:// or a path)
    #[arg(long)]
    pub url: Option<String>,

    /// Directory receiving the segment files
    #[arg(long, value_name = "DIR")]
    pub output_folder: Option<String>,

    /// Extension of the segment files
    #[arg(long)]
    pub extension: Option<String>,

    /// Seconds to buffer before the first write
    #[arg(long, value_name = "SECS")]
    pub initial_writer_delay: Option<u64>,

    /// Length of each segment in seconds
    #[arg(long, value_name = "SECS")]
    pub segment_duration: Option<u64>,

    /// Seconds between writes
    #[arg(long, value_name = "SECS")]
    pub write_period: Option<u64>,

    /// Finalize temp files of earlier runs on start
    #[arg(long, value_name = "BOOL")]
    pub close_open_files_on_start: Option<bool>,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub no_data_timeout: Option<u64>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            output_folder: self.output_folder.clone(),
            extension: self.extension.clone(),
            initial_writer_delay: self.initial_writer_delay,
            segment_duration: self.segment_duration,
            write_period: self.write_period,
            close_open_files_on_start: self.close_open_files_on_start,
            no_data_timeout: self.no_data_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_into_overrides() {
        let cli = Cli::parse_from([
            "streamrec",
            "--url",
            "http://example.com/live",
            "--segment-duration",
            "10",
            "--close-open-files-on-start",
            "false",
        ]);

        assert_eq!(cli.config, "config/streamrec");
        let overrides = cli.overrides();
        assert_eq!(overrides.url.as_deref(), Some("http://example.com/live"));
        assert_eq!(overrides.segment_duration, Some(10));
        assert_eq!(overrides.close_open_files_on_start, Some(false));
        assert_eq!(overrides.write_period, None);
    }
}
