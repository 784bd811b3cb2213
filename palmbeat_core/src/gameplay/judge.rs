use std::fmt;

use crate::error::ConfigError;
use crate::gameplay::lane::LaneMap;
use crate::gameplay::tracker::{Note, NoteId, NoteTracker};
use crate::input::events::Gesture;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Perfect,
    Great,
    Good,
}

impl Tier {
    /// `None` means the attempt was too far off to score; the note stays live.
    pub fn from_accuracy(accuracy: f64) -> Option<Self> {
        if accuracy > 0.9 {
            Some(Tier::Perfect)
        } else if accuracy > 0.7 {
            Some(Tier::Great)
        } else if accuracy > 0.5 {
            Some(Tier::Good)
        } else {
            None
        }
    }

    pub fn base_points(&self) -> u64 {
        match self {
            Tier::Perfect => 100,
            Tier::Great => 75,
            Tier::Good => 50,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Perfect => "perfect",
            Tier::Great => "great",
            Tier::Good => "good",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catchable band on the normalised fall axis, symmetric around the hit line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitWindow {
    pub ideal: f64,
    pub tolerance: f64,
}

impl Default for HitWindow {
    fn default() -> Self {
        Self {
            ideal: 0.85,
            tolerance: 0.12,
        }
    }
}

impl HitWindow {
    pub fn new(ideal: f64, tolerance: f64) -> Result<Self, ConfigError> {
        let fits = ideal.is_finite()
            && tolerance.is_finite()
            && tolerance > 0.0
            && ideal - tolerance >= 0.0
            && ideal + tolerance <= 1.0;
        if !fits {
            return Err(ConfigError::InvalidHitWindow { ideal, tolerance });
        }
        Ok(Self { ideal, tolerance })
    }

    /// Signed distance from the hit line; negative means early.
    pub fn offset(&self, progress: f64) -> f64 {
        progress - self.ideal
    }

    pub fn contains(&self, progress: f64) -> bool {
        self.offset(progress).abs() <= self.tolerance
    }

    pub fn accuracy(&self, progress: f64) -> f64 {
        1.0 - self.offset(progress).abs() / self.tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentResult {
    pub note_id: NoteId,
    pub lane: usize,
    pub tier: Tier,
    pub accuracy: f64,
    pub offset: f64,
}

/// Matches one input symbol against the live notes. Stateless between events;
/// the caller resolves the returned note.
#[derive(Debug, Clone, Default)]
pub struct JudgeMachine {
    pub window: HitWindow,
}

impl JudgeMachine {
    pub fn new(window: HitWindow) -> Self {
        Self { window }
    }

    /// The catchable note in `lane` nearest the hit line (earliest spawn on ties).
    pub fn candidate_in_lane<'a>(
        &self,
        lane: usize,
        tracker: &'a NoteTracker,
        now: f64,
    ) -> Option<&'a Note> {
        tracker
            .live_in_lane(lane)
            .filter(|n| self.window.contains(n.progress(now)))
            .min_by(|a, b| {
                let da = self.window.offset(a.progress(now)).abs();
                let db = self.window.offset(b.progress(now)).abs();
                da.total_cmp(&db)
                    .then(a.spawn_time.total_cmp(&b.spawn_time))
                    .then(a.id.cmp(&b.id))
            })
    }

    /// Scans lanes in order and commits to the first one whose candidate matches
    /// `gesture` with a scoring accuracy. Later lanes are not considered once a
    /// match is found, so one event scores at most once.
    pub fn process_input(
        &self,
        gesture: Gesture,
        lanes: &LaneMap,
        tracker: &NoteTracker,
        now: f64,
    ) -> Option<JudgmentResult> {
        for lane in lanes.lanes() {
            let Some(note) = self.candidate_in_lane(lane.index, tracker, now) else {
                continue;
            };

            // Lane symbol and note symbol coincide today; either one may match.
            if gesture != lane.symbol && gesture != note.required_symbol {
                continue;
            }

            let progress = note.progress(now);
            let accuracy = self.window.accuracy(progress);
            if let Some(tier) = Tier::from_accuracy(accuracy) {
                return Some(JudgmentResult {
                    note_id: note.id,
                    lane: lane.index,
                    tier,
                    accuracy,
                    offset: self.window.offset(progress),
                });
            }
        }
        None
    }
}
