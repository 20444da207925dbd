use std::time::Duration;

use symphonia::core::units::TimeBase;

use super::error::IntakeError;

/// Stream-relative presentation time: `count` ticks of `time_base` seconds each
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentationTime {
    pub count: u64,
    pub time_base: TimeBase,
}

impl PresentationTime {
    pub fn new(count: u64, time_base: TimeBase) -> Self {
        Self { count, time_base }
    }

    /// Seconds since stream-relative time zero
    pub fn as_secs_f64(&self) -> f64 {
        self.count as f64 * f64::from(self.time_base.numer) / f64::from(self.time_base.denom)
    }
}

/// One opaque packet as handed over by the demuxer
#[derive(Debug, Clone)]
pub struct StreamPacket {
    /// Raw packet bytes, written to disk untouched
    pub data: Vec<u8>,
    /// Presentation time relative to the start of the stream
    pub pts: PresentationTime,
    /// Set by demuxers that detected damage in the packet
    pub corrupt: bool,
}

impl StreamPacket {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Corrupt and empty packets are dropped at intake
    pub fn is_recordable(&self) -> bool {
        !self.corrupt && self.size() > 0
    }
}

/// An open stream, yielding packets in arrival order
///
/// Calls block until a packet is available, the stream ends, or the network
/// timeout given at open time expires.
pub trait PacketSource: Send {
    /// Next packet, or `None` once the stream ended cleanly
    fn next_packet(&mut self) -> Result<Option<StreamPacket>, IntakeError>;

    /// Release the underlying connection
    fn close(self: Box<Self>);
}

/// Opens a [`PacketSource`] for a URL
///
/// Implementations:
/// - [`SymphoniaOpener`](super::SymphoniaOpener): HTTP(S) or local files demuxed with symphonia
/// - Tests: scripted in-memory sources
pub trait StreamOpener: Send + Sync {
    fn open(&self, url: &str, timeout: Duration) -> Result<Box<dyn PacketSource>, IntakeError>;

    /// Opener name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(data: &[u8], corrupt: bool) -> StreamPacket {
        StreamPacket {
            data: data.to_vec(),
            pts: PresentationTime::new(0, TimeBase::new(1, 1000)),
            corrupt,
        }
    }

    #[test]
    fn test_only_intact_non_empty_packets_are_recordable() {
        assert!(packet(b"frame", false).is_recordable());
        assert!(!packet(b"frame", true).is_recordable());
        assert!(!packet(b"", false).is_recordable());
    }
}
