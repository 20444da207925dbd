// Scripted stream sources for recorder tests
//
// These stand in for the network demuxer so recorder behaviour can be
// driven without a live stream.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use streamrec::recording::{RecordingConfig, TimestampedPacket};
use streamrec::stream::{
    IntakeError, PacketSource, PresentationTime, StreamOpener, StreamPacket, TimeBase,
};

pub fn stream_packet(count: u64, time_base: TimeBase, data: &[u8]) -> StreamPacket {
    StreamPacket {
        data: data.to_vec(),
        pts: PresentationTime::new(count, time_base),
        corrupt: false,
    }
}

/// A packet whose receipt time equals `origin + pts`, i.e. zero buffering
pub fn aligned_packet(origin_secs: i64, pts_secs: u64, data: &[u8]) -> TimestampedPacket {
    let received_at: DateTime<Utc> = Utc
        .timestamp_opt(origin_secs + pts_secs as i64, 0)
        .unwrap();
    TimestampedPacket::received_at(stream_packet(pts_secs, TimeBase::new(1, 1), data), received_at)
}

/// Like [`aligned_packet`], with a millisecond presentation time
pub fn aligned_packet_ms(origin_secs: i64, pts_ms: u64, data: &[u8]) -> TimestampedPacket {
    let received_at: DateTime<Utc> = Utc
        .timestamp_millis_opt(origin_secs * 1000 + pts_ms as i64)
        .unwrap();
    TimestampedPacket::received_at(
        stream_packet(pts_ms, TimeBase::new(1, 1000), data),
        received_at,
    )
}

pub fn test_config(url: &str, output_dir: &Path) -> RecordingConfig {
    let mut config = RecordingConfig::new(url, output_dir);
    config.initial_writer_delay = Duration::ZERO;
    config.write_period = Duration::from_millis(100);
    config.network_timeout = Duration::from_secs(2);
    config
}

/// Files in `dir`, sorted by name
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

pub fn temp_files(dir: &Path) -> Vec<PathBuf> {
    list_files(dir)
        .into_iter()
        .filter(|path| path.to_string_lossy().ends_with(".tmp"))
        .collect()
}

/// How a scripted stream ends
#[derive(Debug, Clone, Copy)]
pub enum Ending {
    /// Stream ends cleanly after the scripted packets
    Clean,
    /// Stream fails with this fault after the scripted packets
    Fault(fn() -> IntakeError),
    /// Packets keep coming until the reader stops asking
    Endless,
}

/// Opener replaying a fixed script for every open
#[derive(Debug, Clone)]
pub struct ScriptedOpener {
    open_error: Option<fn() -> IntakeError>,
    packets: Vec<StreamPacket>,
    interval: Duration,
    ending: Ending,
}

impl ScriptedOpener {
    pub fn new(packets: Vec<StreamPacket>) -> Self {
        Self {
            open_error: None,
            packets,
            interval: Duration::ZERO,
            ending: Ending::Clean,
        }
    }

    /// Endless stream: one `payload`-sized packet every `interval`, with
    /// millisecond presentation times matching the interval
    pub fn endless(interval: Duration) -> Self {
        Self {
            open_error: None,
            packets: Vec::new(),
            interval,
            ending: Ending::Endless,
        }
    }

    pub fn failing_open(make_error: fn() -> IntakeError) -> Self {
        Self {
            open_error: Some(make_error),
            packets: Vec::new(),
            interval: Duration::ZERO,
            ending: Ending::Clean,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn ending_with(mut self, ending: Ending) -> Self {
        self.ending = ending;
        self
    }
}

pub const ENDLESS_PAYLOAD: &[u8] = b"frame";

impl StreamOpener for ScriptedOpener {
    fn open(&self, _url: &str, _timeout: Duration) -> Result<Box<dyn PacketSource>, IntakeError> {
        if let Some(make_error) = self.open_error {
            return Err(make_error());
        }
        Ok(Box::new(ScriptedSource {
            packets: self.packets.clone().into_iter(),
            interval: self.interval,
            ending: self.ending,
            generated: 0,
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedSource {
    packets: std::vec::IntoIter<StreamPacket>,
    interval: Duration,
    ending: Ending,
    generated: u64,
}

impl PacketSource for ScriptedSource {
    fn next_packet(&mut self) -> Result<Option<StreamPacket>, IntakeError> {
        if !self.interval.is_zero() {
            std::thread::sleep(self.interval);
        }

        if let Some(packet) = self.packets.next() {
            return Ok(Some(packet));
        }

        match self.ending {
            Ending::Clean => Ok(None),
            Ending::Fault(make_error) => Err(make_error()),
            Ending::Endless => {
                let step_ms = self.interval.as_millis().max(1) as u64;
                let packet = stream_packet(
                    self.generated * step_ms,
                    TimeBase::new(1, 1000),
                    ENDLESS_PAYLOAD,
                );
                self.generated += 1;
                Ok(Some(packet))
            }
        }
    }

    fn close(self: Box<Self>) {}
}
