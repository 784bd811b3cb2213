pub mod events;

use self::events::GestureEvent;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Detector readings waiting for the session.
///
/// Only readings that name a gesture are queued: the detector reports "none"
/// most of the time while no hand pose is held, and those carry nothing to
/// judge. Readings pushed through a cloned [`InputQueue::sender`] skip this
/// filter and are screened again by the session.
pub struct InputQueue {
    sender: Sender<GestureEvent>,
    receiver: Receiver<GestureEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Queues a reading if it names a gesture. Returns whether it was queued.
    pub fn push(&self, event: GestureEvent) -> bool {
        if event.gesture().is_none() {
            if event.is_idle() {
                log::trace!("detector idle");
            } else {
                log::warn!("dropping unknown input symbol '{}'", event.symbol);
            }
            return false;
        }
        self.sender.send(event).is_ok()
    }

    /// Next queued reading, oldest first. Never blocks.
    pub fn pop(&self) -> Option<GestureEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Raw producer handle for a detector thread.
    pub fn sender(&self) -> Sender<GestureEvent> {
        self.sender.clone()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
