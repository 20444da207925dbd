use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info};

use super::packet::TimestampedPacket;
use super::queue::HandoffQueue;
use super::segment::{SegmentError, SegmentFile, SegmentMetadata, SegmentNaming};
use super::session::RecordingSession;

/// Splits drained batches into segment files
///
/// Owns the single open segment. Batches are grouped by a linear scan in
/// arrival order; a packet far out of order can reopen a bucket that was
/// already closed, which yields a second file for the same bucket.
pub struct Segmenter {
    session: Arc<RecordingSession>,
    naming: SegmentNaming,
    current: Option<SegmentFile>,
    closed: Vec<SegmentMetadata>,
}

impl Segmenter {
    pub fn new(session: Arc<RecordingSession>) -> Self {
        let naming = SegmentNaming::for_session(&session);
        Self {
            session,
            naming,
            current: None,
            closed: Vec::new(),
        }
    }

    /// Bucket of the open segment, if any
    pub fn current_segment_ts(&self) -> Option<i64> {
        self.current.as_ref().map(SegmentFile::segment_ts)
    }

    /// Segments closed so far, in close order
    pub fn closed(&self) -> &[SegmentMetadata] {
        &self.closed
    }

    /// Write one drained batch, fixing the timeline origin on the first call
    pub fn process_batch(&mut self, batch: &[TimestampedPacket]) -> Result<(), SegmentError> {
        let Some(origin) = self.session.align(batch) else {
            return Ok(());
        };
        let duration = self.session.config().segment_duration;

        for group in batch.chunk_by(|a, b| {
            a.segment_index(origin, duration) == b.segment_index(origin, duration)
        }) {
            let Some(first) = group.first() else {
                continue;
            };
            let segment_ts = first.segment_index(origin, duration);

            if self.current_segment_ts().is_some_and(|ts| ts != segment_ts) {
                if let Some(segment) = self.current.take() {
                    self.closed.push(segment.close()?);
                }
            }

            let segment = self
                .current
                .get_or_insert_with(|| SegmentFile::new(segment_ts, origin, self.naming.clone()));
            segment.write(group)?;
        }

        Ok(())
    }

    /// Close the open segment and return every segment closed by this run
    pub fn finish(mut self) -> Result<Vec<SegmentMetadata>, SegmentError> {
        if let Some(segment) = self.current.take() {
            self.closed.push(segment.close()?);
        }
        Ok(self.closed)
    }
}

/// Drain the queue on a fixed period until intake has finished and the
/// queue is empty, then close the last segment
pub async fn run_segmenter(
    session: Arc<RecordingSession>,
    queue: Arc<HandoffQueue>,
    intake_finished: Arc<AtomicBool>,
) -> Result<Vec<SegmentMetadata>, SegmentError> {
    let initial_delay = session.config().initial_writer_delay;
    let write_period = session.config().write_period;

    info!(
        "Waiting {:?} before starting writer to have enough packets to calculate adjusted TS start",
        initial_delay
    );
    sleep(initial_delay).await;
    info!("Starting writer, will write every {:?}", write_period);

    let mut segmenter = Segmenter::new(session);

    loop {
        // Flag before queue: every push happens before the flag is set
        let finished = intake_finished.load(Ordering::Acquire);
        if finished && queue.is_empty() {
            break;
        }

        sleep(write_period).await;

        let batch = queue.take_all();
        debug!("Queue size: {}", batch.len());
        if batch.is_empty() {
            continue;
        }

        segmenter.process_batch(&batch)?;
    }

    let segments = segmenter.finish()?;
    info!("Writer finished ({} segments)", segments.len());
    Ok(segments)
}
