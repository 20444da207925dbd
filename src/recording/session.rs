use chrono::{DateTime, Utc};
use std::sync::OnceLock;
use tracing::info;
use uuid::Uuid;

use super::config::RecordingConfig;
use super::packet::{compute_timeline_origin, epoch_secs, TimelineOrigin, TimestampedPacket};

/// State of one recording run
///
/// Shared between the intake and segmentation tasks. Both time fields are
/// write-once: the start time is set when intake begins, the timeline origin
/// when the first batch is drained.
#[derive(Debug)]
pub struct RecordingSession {
    id: Uuid,
    config: RecordingConfig,
    started_at: OnceLock<DateTime<Utc>>,
    timeline_origin: OnceLock<TimelineOrigin>,
}

impl RecordingSession {
    pub fn new(config: RecordingConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            started_at: OnceLock::new(),
            timeline_origin: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// Record the intake start time; later calls keep the first value
    pub fn mark_started(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        *self.started_at.get_or_init(|| at)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at.get().copied()
    }

    pub fn timeline_origin(&self) -> Option<TimelineOrigin> {
        self.timeline_origin.get().copied()
    }

    /// Fix the timeline origin from the first batch, or return the one
    /// already fixed. Later batches never move it.
    ///
    /// Returns `None` only while no origin is set and `batch` is empty.
    pub fn align(&self, batch: &[TimestampedPacket]) -> Option<TimelineOrigin> {
        if let Some(origin) = self.timeline_origin.get() {
            return Some(*origin);
        }

        let estimate = compute_timeline_origin(batch)?;
        let origin = *self.timeline_origin.get_or_init(|| estimate);

        let buffer_secs = self
            .started_at()
            .map(|started| epoch_secs(started) - origin.secs());
        info!(
            "Adjusted timeline origin: {} (buffer: {:.2}s)",
            format_clock(origin.secs()),
            buffer_secs.unwrap_or(0.0)
        );

        Some(origin)
    }
}

/// `HH:MM:SS` in UTC, for log lines
pub(crate) fn format_clock(epoch_secs: f64) -> String {
    DateTime::from_timestamp(epoch_secs.floor() as i64, 0)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{epoch_secs:.3}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{PresentationTime, StreamPacket, TimeBase};
    use chrono::TimeZone;

    fn config() -> RecordingConfig {
        RecordingConfig::new("http://example.com", "/tmp")
    }

    fn packet(count: u64, received_secs: i64) -> TimestampedPacket {
        TimestampedPacket::received_at(
            StreamPacket {
                data: vec![1],
                pts: PresentationTime::new(count, TimeBase::new(1, 1)),
                corrupt: false,
            },
            Utc.timestamp_opt(received_secs, 0).unwrap(),
        )
    }

    #[test]
    fn test_initialization() {
        let session = RecordingSession::new(config());
        assert!(session.started_at().is_none());
        assert!(session.timeline_origin().is_none());
        assert_eq!(session.config().url, "http://example.com");
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = RecordingSession::new(config());
        let b = RecordingSession::new(config());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_align_is_computed_once() {
        let session = RecordingSession::new(config());
        assert_eq!(session.align(&[]), None);

        let first = session.align(&[packet(2, 102), packet(3, 104)]);
        assert_eq!(first, Some(TimelineOrigin(100.0)));

        // A later, earlier-looking batch does not move the origin
        let second = session.align(&[packet(10, 50)]);
        assert_eq!(second, first);
        assert_eq!(session.timeline_origin(), first);
    }

    #[test]
    fn test_mark_started_keeps_first_value() {
        let session = RecordingSession::new(config());
        let first = Utc.timestamp_opt(1000, 0).unwrap();
        let second = Utc.timestamp_opt(2000, 0).unwrap();

        assert_eq!(session.mark_started(first), first);
        assert_eq!(session.mark_started(second), first);
        assert_eq!(session.started_at(), Some(first));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(3661.7), "01:01:01");
    }
}
