use std::collections::HashMap;

use anyhow::Context;
use palm_schema::{SessionResults, TrackMetadata};
use palmbeat_core::gameplay::tracker::NoteId;
use palmbeat_core::{
    Clock, GestureEvent, InputQueue, ManualClock, Session, SessionPhase, SessionSettings,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// The detector reports one reading every 100ms, like the webcam loop does.
const DETECTOR_PERIOD_SECONDS: f64 = 0.1;

/// Unbounded sessions are stopped after this much wall time.
const UNBOUNDED_SESSION_SECONDS: f64 = 120.0;

/// Slack past the expected end (countdown plus grace) before forcing a stop.
const DEADLINE_SLACK_SECONDS: f64 = 10.0;

pub struct SimulationOptions {
    pub settings: SessionSettings,
    pub track: Option<TrackMetadata>,
    /// Probability that the detector catches any given note.
    pub skill: f64,
    pub frame_seconds: f64,
    pub seed: u64,
}

/// Plays one session on a manual clock and returns its frozen results.
pub fn run_simulation(opts: SimulationOptions) -> anyhow::Result<SessionResults> {
    let clock = ManualClock::new(0.0);
    let mut session = Session::new(clock.clone());

    if let Some(track) = opts.track {
        session.load_track(track).context("failed to load track")?;
    }
    session.start(opts.settings).context("failed to start session")?;

    let limit = session.state().time_limit_seconds;
    let deadline = if limit > 0 {
        f64::from(limit) + DEADLINE_SLACK_SECONDS
    } else {
        UNBOUNDED_SESSION_SECONDS
    };

    let queue = InputQueue::new();
    let mut detector = BotDetector::new(opts.skill, opts.seed);
    let mut next_reading = 0.0;
    let mut frames = 0u64;

    while session.phase() != SessionPhase::Ended {
        clock.advance(opts.frame_seconds);
        session.update();
        frames += 1;

        if clock.now() >= next_reading {
            next_reading += DETECTOR_PERIOD_SECONDS;
            queue.push(detector.read(&session));
        }
        session.drain_input(&queue);

        if clock.now() >= deadline {
            log::warn!("simulation passed {deadline:.0}s, stopping");
            session.stop();
        }
    }

    log::info!("simulation finished after {frames} frames ({:.1}s)", clock.now());
    session
        .results()
        .cloned()
        .context("session ended without results")
}

/// Stands in for the gesture classifier. Each note is caught or ignored
/// once, on first sight; caught notes are answered at the reading closest to
/// the hit line.
struct BotDetector {
    skill: f64,
    rng: Pcg32,
    decisions: HashMap<NoteId, bool>,
}

impl BotDetector {
    fn new(skill: f64, seed: u64) -> Self {
        Self {
            skill,
            // Keep the detector's stream apart from the scheduler's.
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed_f00d),
            decisions: HashMap::new(),
        }
    }

    fn read(&mut self, session: &Session<ManualClock>) -> GestureEvent {
        let Some(window) = session.hit_window() else {
            return GestureEvent::new("none");
        };
        let now = session.game_time();
        let next = now + DETECTOR_PERIOD_SECONDS;

        let target = session
            .live_notes()
            .iter()
            .filter(|n| window.accuracy(n.progress(now)) > 0.5)
            .min_by(|a, b| {
                let da = window.offset(a.progress(now)).abs();
                let db = window.offset(b.progress(now)).abs();
                da.total_cmp(&db)
            });

        let Some(note) = target else {
            return GestureEvent::new("none");
        };

        let (skill, rng) = (self.skill, &mut self.rng);
        let catch = *self
            .decisions
            .entry(note.id)
            .or_insert_with(|| rng.random_bool(skill));

        // Wait while the next reading would land closer to the line.
        let closer_later = window.offset(note.progress(next)).abs()
            < window.offset(note.progress(now)).abs()
            && window.accuracy(note.progress(next)) > 0.5;

        if catch && !closer_later {
            GestureEvent::from(note.required_symbol)
        } else {
            GestureEvent::new("none")
        }
    }
}
