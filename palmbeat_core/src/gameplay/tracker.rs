use crate::input::events::Gesture;

pub type NoteId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Falling,
    Resolved,
    Expired,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub lane: usize,
    pub required_symbol: Gesture,
    pub spawn_time: f64,
    /// Already divided by the session speed multiplier.
    pub fall_duration: f64,
    state: NoteState,
}

impl Note {
    pub fn state(&self) -> NoteState {
        self.state
    }

    pub fn expires_at(&self) -> f64 {
        self.spawn_time + self.fall_duration
    }

    /// Fraction of the fall completed: 0 at spawn, 1 at expiry.
    pub fn progress(&self, now: f64) -> f64 {
        ((now - self.spawn_time) / self.fall_duration).max(0.0)
    }

    fn finish(&mut self, to: NoteState) {
        assert!(
            self.state == NoteState::Falling,
            "note {} moved to {:?} from terminal state {:?}",
            self.id,
            to,
            self.state
        );
        self.state = to;
    }
}

/// Owns the live (falling) notes. Terminal notes are handed back to the caller
/// and never kept.
#[derive(Debug, Default)]
pub struct NoteTracker {
    live: Vec<Note>,
    next_id: NoteId,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, lane: usize, symbol: Gesture, now: f64, fall_duration: f64) -> &Note {
        debug_assert!(fall_duration > 0.0);
        let note = Note {
            id: self.next_id,
            lane,
            required_symbol: symbol,
            spawn_time: now,
            fall_duration,
            state: NoteState::Falling,
        };
        self.next_id += 1;
        log::debug!("note {} spawned in lane {} ({}) at {:.3}s", note.id, lane, symbol, now);
        self.live.push(note);
        &self.live[self.live.len() - 1]
    }

    /// Live notes in spawn order.
    pub fn live(&self) -> &[Note] {
        &self.live
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_in_lane(&self, lane: usize) -> impl Iterator<Item = &Note> {
        self.live.iter().filter(move |n| n.lane == lane)
    }

    pub fn count_in_lane(&self, lane: usize) -> usize {
        self.live_in_lane(lane).count()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.live.iter().find(|n| n.id == id)
    }

    pub fn next_expiry(&self) -> Option<f64> {
        self.live.iter().map(Note::expires_at).reduce(f64::min)
    }

    /// Removes every note whose fall has completed by `now`, in expiry order.
    pub fn expire_due(&mut self, now: f64) -> Vec<Note> {
        let mut expired = Vec::new();
        let mut i = 0;
        while i < self.live.len() {
            if self.live[i].expires_at() <= now {
                let mut note = self.live.remove(i);
                note.finish(NoteState::Expired);
                expired.push(note);
            } else {
                i += 1;
            }
        }
        expired.sort_by(|a, b| a.expires_at().total_cmp(&b.expires_at()).then(a.id.cmp(&b.id)));
        expired
    }

    /// Takes a matched note out of the live set.
    ///
    /// Panics if the note is not live: resolving twice (or resolving an expired
    /// note) would corrupt the score.
    pub fn resolve(&mut self, id: NoteId) -> Note {
        let pos = self.live.iter().position(|n| n.id == id);
        let Some(pos) = pos else {
            panic!("note {id} resolved but it is not live");
        };
        let mut note = self.live.remove(pos);
        note.finish(NoteState::Resolved);
        note
    }

    /// Drops all live notes without scoring them. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.live.len();
        self.live.clear();
        n
    }

    /// Clears live notes and restarts id allocation.
    pub fn reset(&mut self) {
        self.live.clear();
        self.next_id = 0;
    }
}
