use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::RecordingConfig;
use super::intake::{run_intake, IntakeReport, StopHandle};
use super::queue::HandoffQueue;
use super::recovery::recover_open_segments;
use super::segment::SegmentMetadata;
use super::segmenter::run_segmenter;
use super::session::RecordingSession;
use crate::stream::{IntakeError, StreamOpener};

/// Overall verdict on a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The stream ended or was stopped without a fault
    Clean,
    /// Intake ended on a network or OS fault
    Environmental,
    /// Intake ended on a fault that points at a defect
    Defective,
}

/// Everything a supervisor needs after both tasks have joined
#[derive(Debug)]
pub struct RecordingReport {
    pub session_id: Uuid,
    pub intake: IntakeReport,
    /// Segments finalized by this run, in close order
    pub segments: Vec<SegmentMetadata>,
    /// Temp files of earlier runs finalized at startup
    pub recovered: Vec<PathBuf>,
}

impl RecordingReport {
    pub fn terminal_error(&self) -> Option<&IntakeError> {
        self.intake.terminal_error.as_ref()
    }

    pub fn unhandled_error(&self) -> Option<&IntakeError> {
        self.intake.unhandled_error()
    }

    pub fn outcome(&self) -> RunOutcome {
        match self.terminal_error() {
            None => RunOutcome::Clean,
            Some(err) if err.is_transient() => RunOutcome::Environmental,
            Some(_) => RunOutcome::Defective,
        }
    }
}

/// Records one stream into segment files
///
/// Runs an intake task (blocking demux) and a writer task side by side,
/// joined by a [`HandoffQueue`]. [`StopHandle::request_stop`] is the only
/// control once running.
pub struct Recorder {
    session: Arc<RecordingSession>,
    opener: Arc<dyn StreamOpener>,
    stop: StopHandle,
}

impl Recorder {
    pub fn new(config: RecordingConfig, opener: Arc<dyn StreamOpener>) -> Result<Self> {
        config.validate()?;

        let session = RecordingSession::new(config);
        info!(
            "Recorder initialized: session {} (segments: {}s each)",
            session.id(),
            session.config().segment_duration
        );

        Ok(Self {
            session: Arc::new(session),
            opener,
            stop: StopHandle::new(),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Handle for requesting a cooperative stop from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Record until the stream ends, fails, or a stop is requested
    ///
    /// Returns once both tasks have finished and the last segment is
    /// finalized. A segment invariant failure is returned as an error.
    pub async fn run(self) -> Result<RecordingReport> {
        let config = self.session.config();
        fs::create_dir_all(&config.output_dir).context("Failed to create output directory")?;

        let recovered = if config.recover_open_files {
            recover_open_segments(&config.output_dir)?
        } else {
            Vec::new()
        };

        let queue = Arc::new(HandoffQueue::new());
        let intake_finished = Arc::new(AtomicBool::new(false));

        let intake_handle = {
            let opener = Arc::clone(&self.opener);
            let session = Arc::clone(&self.session);
            let queue = Arc::clone(&queue);
            let stop = self.stop.clone();
            let finished = Arc::clone(&intake_finished);
            tokio::task::spawn_blocking(move || {
                run_intake(opener.as_ref(), &session, &queue, &stop, &finished)
            })
        };

        let writer_handle = tokio::spawn(run_segmenter(
            Arc::clone(&self.session),
            Arc::clone(&queue),
            Arc::clone(&intake_finished),
        ));

        let writer_result = writer_handle.await;
        if !matches!(writer_result, Ok(Ok(_))) {
            // Nothing drains the queue any more
            warn!("Writer stopped early, stopping reader");
            self.stop.request_stop();
        }

        let intake = intake_handle.await.context("Reader task panicked")?;

        let segments = match writer_result.context("Writer task panicked")? {
            Ok(segments) => segments,
            Err(err) => {
                error!("Writer failed: {}", err);
                return Err(err).context("Segment writer failed");
            }
        };

        info!(
            "All tasks finished: session {} ({} segments)",
            self.session.id(),
            segments.len()
        );

        Ok(RecordingReport {
            session_id: self.session.id(),
            intake,
            segments,
            recovered,
        })
    }
}
