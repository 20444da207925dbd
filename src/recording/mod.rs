//! Stream recording into fixed-duration segment files
//!
//! This module provides:
//! - Wall-clock alignment of stream-relative packet times
//! - The intake loop feeding a shared handoff queue
//! - The drain loop splitting packets into segment files
//! - Crash recovery of segments left open by an earlier run

mod config;
mod intake;
mod packet;
mod queue;
mod recorder;
mod recovery;
mod segment;
mod segmenter;
mod session;

pub use config::RecordingConfig;
pub use intake::{run_intake, IntakeReport, StopHandle};
pub use packet::{compute_timeline_origin, segment_index, TimelineOrigin, TimestampedPacket};
pub use queue::HandoffQueue;
pub use recorder::{Recorder, RecordingReport, RunOutcome};
pub use recovery::recover_open_segments;
pub use segment::{SegmentError, SegmentFile, SegmentMetadata, SegmentNaming, TEMP_SUFFIX};
pub use segmenter::{run_segmenter, Segmenter};
pub use session::RecordingSession;
