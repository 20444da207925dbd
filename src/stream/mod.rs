//! Network stream intake boundary
//!
//! The recorder only needs an ordered sequence of opaque packets with a
//! stream-relative presentation time. [`StreamOpener`] and [`PacketSource`]
//! describe that boundary; [`SymphoniaOpener`] is the default demuxer.

mod demux;
mod error;
mod source;

pub use demux::SymphoniaOpener;
pub use error::{FaultKind, IntakeError};
pub use source::{PacketSource, PresentationTime, StreamOpener, StreamPacket};

pub use symphonia::core::units::TimeBase;
