use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::packet::{epoch_secs, TimestampedPacket};
use super::queue::HandoffQueue;
use super::session::{format_clock, RecordingSession};
use crate::stream::{FaultKind, IntakeError, StreamOpener};

/// Cooperative stop request, observed by the intake loop between packets
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// How the intake loop ended
#[derive(Debug, Default)]
pub struct IntakeReport {
    /// Fault that ended the loop, if it did not end cleanly
    pub terminal_error: Option<IntakeError>,
    /// Packets handed to the queue
    pub packets: usize,
    /// Corrupt or empty packets dropped
    pub discarded: usize,
}

impl IntakeReport {
    /// The terminal fault, if it points at a defect rather than the network
    pub fn unhandled_error(&self) -> Option<&IntakeError> {
        self.terminal_error
            .as_ref()
            .filter(|err| err.kind() == FaultKind::Unexpected)
    }
}

/// Sets the reader-finished flag on every exit path
struct FinishedGuard<'a>(&'a AtomicBool);

impl Drop for FinishedGuard<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Read packets from the stream into `queue` until it ends, fails, or a stop
/// is requested
///
/// Blocks for the life of the stream; run it on a blocking thread.
pub fn run_intake(
    opener: &dyn StreamOpener,
    session: &RecordingSession,
    queue: &HandoffQueue,
    stop: &StopHandle,
    finished: &AtomicBool,
) -> IntakeReport {
    let _finished = FinishedGuard(finished);

    let started_at = session.mark_started(Utc::now());
    info!(
        "Starting reader: {} ({} via {})",
        format_clock(epoch_secs(started_at)),
        session.config().url,
        opener.name()
    );

    let mut report = IntakeReport::default();

    match read_stream(opener, session, queue, stop, &mut report) {
        Ok(()) => {
            info!(
                "Reader finished successfully ({} packets, {} discarded)",
                report.packets, report.discarded
            );
        }
        Err(err) => {
            match err.kind() {
                FaultKind::Transient => {
                    warn!("Connection error: {}", err);
                }
                FaultKind::Unexpected => {
                    error!("Reader exception: {}", err);
                    error!("Reader exception occurred: {:?}", err);
                }
            }
            report.terminal_error = Some(err);
        }
    }

    report
}

fn read_stream(
    opener: &dyn StreamOpener,
    session: &RecordingSession,
    queue: &HandoffQueue,
    stop: &StopHandle,
    report: &mut IntakeReport,
) -> Result<(), IntakeError> {
    let config = session.config();
    let mut source = opener.open(&config.url, config.network_timeout)?;

    while let Some(packet) = source.next_packet()? {
        if packet.is_recordable() {
            queue.push(TimestampedPacket::received_now(packet));
            report.packets += 1;
        } else {
            if packet.corrupt {
                warn!("Corrupt packet");
            } else {
                warn!("Packet with size 0");
            }
            report.discarded += 1;
        }

        if stop.is_stop_requested() {
            debug!("Stop requested, leaving reader loop");
            break;
        }
    }

    source.close();
    Ok(())
}
