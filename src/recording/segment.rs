use chrono::DateTime;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::packet::{TimelineOrigin, TimestampedPacket};
use super::session::RecordingSession;

/// Marks a segment file that is still being written
pub const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Error)]
pub enum SegmentError {
    /// Packets were grouped into the wrong bucket upstream
    #[error("first packet at {first_ts} precedes segment start {segment_ts}")]
    FirstPacketBeforeSegment { first_ts: f64, segment_ts: i64 },

    #[error("timestamp {0} is outside the representable date range")]
    TimestampOutOfRange(f64),

    #[error("segment {0} was closed before any packet was written")]
    NothingWritten(i64),

    #[error("segment I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where and under which name a session's segments are written
#[derive(Debug, Clone)]
pub struct SegmentNaming {
    pub output_dir: PathBuf,
    pub session_id: Uuid,
    pub extension: String,
}

impl SegmentNaming {
    pub fn for_session(session: &RecordingSession) -> Self {
        let config = session.config();
        Self {
            output_dir: config.output_dir.clone(),
            session_id: session.id(),
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    /// `<YYYYMMDD-HHMMSS>-GMT_<session id>.<ext>` for a first packet at `first_ts`
    pub fn final_path(&self, first_ts: f64) -> Result<PathBuf, SegmentError> {
        self.numbered_final_path(first_ts, 0)
    }

    pub fn temp_path(&self, first_ts: f64) -> Result<PathBuf, SegmentError> {
        self.numbered_temp_path(first_ts, 0)
    }

    /// Final path with a `-<n>` counter before the extension; `n == 0` is
    /// the plain name
    pub fn numbered_final_path(&self, first_ts: f64, n: u32) -> Result<PathBuf, SegmentError> {
        let stamp = DateTime::from_timestamp(first_ts.floor() as i64, 0)
            .ok_or(SegmentError::TimestampOutOfRange(first_ts))?
            .format("%Y%m%d-%H%M%S-GMT");
        let name = match n {
            0 => format!("{}_{}.{}", stamp, self.session_id, self.extension),
            n => format!("{}_{}-{}.{}", stamp, self.session_id, n, self.extension),
        };
        Ok(self.output_dir.join(name))
    }

    pub fn numbered_temp_path(&self, first_ts: f64, n: u32) -> Result<PathBuf, SegmentError> {
        let mut path = self.numbered_final_path(first_ts, n)?.into_os_string();
        path.push(TEMP_SUFFIX);
        Ok(PathBuf::from(path))
    }
}

/// A finalized segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMetadata {
    /// Bucket start, in seconds since the Unix epoch
    pub segment_ts: i64,
    /// Adjusted timestamp of the first packet written
    pub first_ts: f64,
    pub path: PathBuf,
    pub bytes: u64,
    pub packets: usize,
}

/// One time bucket of the recording, backed by a temp file until closed
///
/// Packets are appended as raw bytes; closing syncs the file and renames it
/// to its permanent name.
pub struct SegmentFile {
    segment_ts: i64,
    origin: TimelineOrigin,
    naming: SegmentNaming,
    first_ts: Option<f64>,
    writer: Option<OpenSegment>,
    bytes: u64,
    packets: usize,
}

struct OpenSegment {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    number: u32,
}

impl SegmentFile {
    pub fn new(segment_ts: i64, origin: TimelineOrigin, naming: SegmentNaming) -> Self {
        Self {
            segment_ts,
            origin,
            naming,
            first_ts: None,
            writer: None,
            bytes: 0,
            packets: 0,
        }
    }

    pub fn segment_ts(&self) -> i64 {
        self.segment_ts
    }

    /// Path of the in-progress file, once the first packet is written
    pub fn temp_path(&self) -> Option<&Path> {
        self.writer.as_ref().map(|w| w.temp_path.as_path())
    }

    /// Append packets, creating the temp file on the first call
    pub fn write(&mut self, packets: &[TimestampedPacket]) -> Result<(), SegmentError> {
        let Some(first) = packets.first() else {
            return Ok(());
        };

        if self.writer.is_none() {
            let first_ts = first.adjusted_ts(self.origin);
            if first_ts < self.segment_ts as f64 {
                error!(
                    "First packet ts {} is less than segment ts {}",
                    first_ts, self.segment_ts
                );
                return Err(SegmentError::FirstPacketBeforeSegment {
                    first_ts,
                    segment_ts: self.segment_ts,
                });
            }
            self.writer = Some(self.create(first_ts)?);
            self.first_ts = Some(first_ts);
        }

        let Some(writer) = self.writer.as_mut() else {
            return Err(SegmentError::NothingWritten(self.segment_ts));
        };

        for packet in packets {
            writer
                .file
                .write_all(packet.data())
                .map_err(|source| SegmentError::Io {
                    path: writer.temp_path.clone(),
                    source,
                })?;
            self.bytes += packet.data().len() as u64;
            self.packets += 1;
        }

        Ok(())
    }

    /// Sync the temp file and rename it to its permanent name
    pub fn close(mut self) -> Result<SegmentMetadata, SegmentError> {
        let (Some(writer), Some(first_ts)) = (self.writer.take(), self.first_ts) else {
            return Err(SegmentError::NothingWritten(self.segment_ts));
        };

        let OpenSegment {
            file,
            temp_path,
            mut final_path,
            mut number,
        } = writer;

        while final_path.exists() {
            number += 1;
            final_path = self.naming.numbered_final_path(first_ts, number)?;
        }

        info!("Closing segment {}", final_path.display());

        file.sync_all().map_err(|source| SegmentError::Io {
            path: temp_path.clone(),
            source,
        })?;
        drop(file);

        fs::rename(&temp_path, &final_path).map_err(|source| SegmentError::Io {
            path: temp_path.clone(),
            source,
        })?;

        Ok(SegmentMetadata {
            segment_ts: self.segment_ts,
            first_ts,
            path: final_path,
            bytes: self.bytes,
            packets: self.packets,
        })
    }

    /// Create the temp file under the first name whose temp and final
    /// forms are both unused
    fn create(&self, first_ts: f64) -> Result<OpenSegment, SegmentError> {
        let mut number = 0;
        loop {
            let temp_path = self.naming.numbered_temp_path(first_ts, number)?;
            let final_path = self.naming.numbered_final_path(first_ts, number)?;

            if !final_path.exists() {
                match OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&temp_path)
                {
                    Ok(file) => {
                        return Ok(OpenSegment {
                            file,
                            temp_path,
                            final_path,
                            number,
                        })
                    }
                    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(source) => {
                        return Err(SegmentError::Io {
                            path: temp_path,
                            source,
                        })
                    }
                }
            }

            number += 1;
        }
    }
}

impl Drop for SegmentFile {
    fn drop(&mut self) {
        if let Some(writer) = &self.writer {
            warn!(
                "Segment {} dropped while open, left as {}",
                self.segment_ts,
                writer.temp_path.display()
            );
        }
    }
}
