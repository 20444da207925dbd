use std::sync::{Mutex, MutexGuard, PoisonError};

use super::packet::TimestampedPacket;

/// Buffer between the intake and segmentation tasks
///
/// Intake pushes one packet at a time; segmentation swaps the whole buffer
/// out in one step. The lock is never held across I/O.
#[derive(Debug, Default)]
pub struct HandoffQueue {
    packets: Mutex<Vec<TimestampedPacket>>,
}

impl HandoffQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, packet: TimestampedPacket) {
        self.lock().push(packet);
    }

    /// Take every queued packet, leaving an empty queue behind
    pub fn take_all(&self) -> Vec<TimestampedPacket> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The buffer holds plain data, so a panicked holder cannot leave it
    // half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<TimestampedPacket>> {
        self.packets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
