use chrono::{DateTime, Utc};

use crate::stream::{PresentationTime, StreamPacket};

/// Absolute wall-clock instant of stream-relative time zero, in seconds
/// since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimelineOrigin(pub f64);

impl TimelineOrigin {
    pub fn secs(self) -> f64 {
        self.0
    }
}

/// A stream packet stamped with the moment this process received it
#[derive(Debug, Clone)]
pub struct TimestampedPacket {
    pub packet: StreamPacket,
    pub received_at: DateTime<Utc>,
}

impl TimestampedPacket {
    /// Stamp a packet with the current wall-clock time
    pub fn received_now(packet: StreamPacket) -> Self {
        Self::received_at(packet, Utc::now())
    }

    pub fn received_at(packet: StreamPacket, received_at: DateTime<Utc>) -> Self {
        Self {
            packet,
            received_at,
        }
    }

    pub fn pts(&self) -> PresentationTime {
        self.packet.pts
    }

    pub fn data(&self) -> &[u8] {
        &self.packet.data
    }

    pub fn seconds_since_start(&self) -> f64 {
        self.packet.pts.as_secs_f64()
    }

    /// Absolute wall-clock time of this packet on the session timeline
    pub fn adjusted_ts(&self, origin: TimelineOrigin) -> f64 {
        self.seconds_since_start() + origin.secs()
    }

    /// Origin implied by this packet alone, assuming it arrived without delay
    pub fn guess_timeline_origin(&self) -> TimelineOrigin {
        TimelineOrigin(epoch_secs(self.received_at) - self.seconds_since_start())
    }

    /// Start of the segment bucket this packet falls into
    pub fn segment_index(&self, origin: TimelineOrigin, segment_duration: u64) -> i64 {
        segment_index(self.adjusted_ts(origin), segment_duration)
    }
}

/// Floor `adjusted_ts` to a multiple of `segment_duration` seconds
pub fn segment_index(adjusted_ts: f64, segment_duration: u64) -> i64 {
    let duration = segment_duration as f64;
    (adjusted_ts / duration).floor() as i64 * segment_duration as i64
}

/// Estimate the timeline origin from a batch of packets
///
/// Buffering can only delay receipt, never advance it, so the earliest guess
/// is the closest to the true stream start. Returns `None` for an empty batch.
pub fn compute_timeline_origin(batch: &[TimestampedPacket]) -> Option<TimelineOrigin> {
    batch
        .iter()
        .map(TimestampedPacket::guess_timeline_origin)
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

pub(crate) fn epoch_secs(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) / 1e9
}
