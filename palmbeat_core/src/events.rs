use crossbeam_channel::{unbounded, Receiver, Sender};
use palm_schema::SessionResults;

use crate::gameplay::judge::Tier;
use crate::gameplay::scoring::ScoreAward;
use crate::gameplay::tracker::NoteId;
use crate::input::events::Gesture;

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// 3, 2, 1, then 0 for "go".
    CountdownTick { remaining: u32 },
    SessionStarted,
    NoteSpawned { id: NoteId, lane: usize, symbol: Gesture },
    NoteResolved {
        id: NoteId,
        lane: usize,
        tier: Tier,
        accuracy: f64,
        award: ScoreAward,
    },
    NoteExpired { id: NoteId, lane: usize },
    ScoreChanged { score: u64, combo: u32, multiplier: u64 },
    /// `remaining` is 0 for unbounded sessions.
    TimeTick { remaining: u32, elapsed: u32 },
    Paused,
    Resumed,
    SessionEnded(SessionResults),
}

/// Fan-out of `GameEvent`s to every subscriber. Sending never blocks; a
/// subscriber whose receiver is dropped is forgotten.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Sender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    pub fn emit(&mut self, event: GameEvent) {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.send(event.clone()).is_ok());
        if self.subscribers.len() < before {
            log::debug!("{} event subscriber(s) disconnected", before - self.subscribers.len());
        }
    }
}
