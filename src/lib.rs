pub mod cli;
pub mod config;
pub mod recording;
pub mod stream;

pub use cli::Cli;
pub use config::{Config, ConfigOverrides};
pub use recording::{
    Recorder, RecordingConfig, RecordingReport, RecordingSession, RunOutcome, SegmentMetadata,
    StopHandle,
};
pub use stream::{FaultKind, IntakeError, PacketSource, StreamOpener, StreamPacket, SymphoniaOpener};
