use palm_schema::DifficultyProfile;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::ConfigError;
use crate::gameplay::tracker::NoteTracker;

/// Floor on the note count a timed session should reach, before scaling for very
/// short sessions.
pub const MIN_SESSION_NOTES: f64 = 4.0;

/// Sessions at or above this length get the full `MIN_SESSION_NOTES` floor.
const MIN_NOTES_FULL_SCALE_SECONDS: f64 = 30.0;

/// Slack for comparing spacing on the game timeline.
const TIME_EPSILON: f64 = 1e-9;

/// Shortest poll interval, fall or spacing a plan may use. Finer timing makes
/// the session's catch-up loop stall.
pub const MIN_TICK_SECONDS: f64 = 0.001;

/// Speed-adjusted timing derived from a profile at session start.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    pub tiles_per_minute: f64,
    pub interval_ms: f64,
    pub min_notes: f64,
    pub adjusted_interval_ms: f64,
    /// Seconds between scheduler ticks.
    pub poll_interval: f64,
    /// Seconds a note takes from spawn to expiry.
    pub fall_duration: f64,
    /// Seconds required between spawns, globally and per lane.
    pub min_spacing: f64,
    pub max_concurrent: usize,
}

impl SpawnPlan {
    pub fn new(profile: &DifficultyProfile, speed_multiplier: f64, time_limit_seconds: u32) -> Self {
        let tiles_per_minute = profile.spawn_rate_per_minute * speed_multiplier;
        let interval_ms = 60_000.0 / tiles_per_minute;

        let (min_notes, adjusted_interval_ms) = if time_limit_seconds > 0 {
            let limit = f64::from(time_limit_seconds);
            let floor = MIN_SESSION_NOTES * (limit / MIN_NOTES_FULL_SCALE_SECONDS).min(1.0);
            let min_notes = floor.max(tiles_per_minute * limit / 60.0);
            (min_notes, interval_ms.min(limit * 1000.0 / min_notes))
        } else {
            (0.0, interval_ms)
        };

        Self {
            tiles_per_minute,
            interval_ms,
            min_notes,
            adjusted_interval_ms,
            poll_interval: adjusted_interval_ms / 2.0 / 1000.0,
            fall_duration: profile.fall_duration_seconds / speed_multiplier,
            min_spacing: profile.min_spacing_millis / speed_multiplier / 1000.0,
            max_concurrent: profile.max_concurrent_notes,
        }
    }

    /// Rejects plans whose timing is not finite or is finer than `MIN_TICK_SECONDS`.
    pub fn check(&self) -> Result<(), ConfigError> {
        let timings = [
            ("poll interval", self.poll_interval),
            ("fall duration", self.fall_duration),
            ("note spacing", self.min_spacing),
        ];
        for (what, value) in timings {
            if !(value.is_finite() && value >= MIN_TICK_SECONDS) {
                return Err(ConfigError::DegenerateTiming { what, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejection {
    Stopped,
    NotRunning,
    /// The note could not finish falling before the session's natural end.
    TooLate,
    GlobalSpacing,
    ConcurrencyCap,
    NoEligibleLane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub spawn: Result<usize, SpawnRejection>,
    /// The time limit was reached on this tick; the scheduler has stopped itself.
    pub time_up: bool,
}

/// Decides, per tick, whether and where a new note may appear.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    plan: SpawnPlan,
    last_global: Option<f64>,
    last_per_lane: Vec<Option<f64>>,
    resolve_deadline: Option<f64>,
    rng: Pcg32,
    stopped: bool,
}

impl SpawnScheduler {
    pub fn new(plan: SpawnPlan, lane_count: usize, seed: u64) -> Self {
        Self {
            plan,
            last_global: None,
            last_per_lane: vec![None; lane_count],
            resolve_deadline: None,
            rng: Pcg32::seed_from_u64(seed),
            stopped: false,
        }
    }

    pub fn plan(&self) -> &SpawnPlan {
        &self.plan
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn last_spawn(&self) -> Option<f64> {
        self.last_global
    }

    /// Notes spawned from now on must expire no later than `deadline`.
    pub fn set_resolve_deadline(&mut self, deadline: f64) {
        self.resolve_deadline = Some(deadline);
    }

    pub fn resolve_deadline(&self) -> Option<f64> {
        self.resolve_deadline
    }

    /// Runs one scheduling tick. On success the caller must create the note in
    /// the returned lane; spawn times are already recorded.
    pub fn tick(
        &mut self,
        now: f64,
        running: bool,
        tracker: &NoteTracker,
        time_up: bool,
    ) -> TickOutcome {
        let spawn = self.try_spawn(now, running, tracker);
        match spawn {
            Ok(lane) => log::trace!("spawn tick at {now:.3}s picked lane {lane}"),
            Err(reason) => log::trace!("spawn tick at {now:.3}s rejected: {reason:?}"),
        }

        let time_up = running && time_up && !self.stopped;
        if time_up {
            log::debug!("time limit reached at {now:.3}s, scheduler stopping");
            self.stop();
        }
        TickOutcome { spawn, time_up }
    }

    fn try_spawn(
        &mut self,
        now: f64,
        running: bool,
        tracker: &NoteTracker,
    ) -> Result<usize, SpawnRejection> {
        if self.stopped {
            return Err(SpawnRejection::Stopped);
        }
        if !running {
            return Err(SpawnRejection::NotRunning);
        }
        if let Some(deadline) = self.resolve_deadline {
            if now + self.plan.fall_duration > deadline + TIME_EPSILON {
                return Err(SpawnRejection::TooLate);
            }
        }

        let spacing = self.plan.min_spacing;
        let spaced = |last: Option<f64>| last.map_or(true, |t| now - t + TIME_EPSILON >= spacing);

        if !spaced(self.last_global) {
            return Err(SpawnRejection::GlobalSpacing);
        }
        if tracker.live_count() >= self.plan.max_concurrent {
            return Err(SpawnRejection::ConcurrencyCap);
        }

        let candidates: Vec<usize> = (0..self.last_per_lane.len())
            .filter(|&lane| tracker.count_in_lane(lane) == 0 && spaced(self.last_per_lane[lane]))
            .collect();
        if candidates.is_empty() {
            return Err(SpawnRejection::NoEligibleLane);
        }

        let lane = candidates[self.rng.random_range(0..candidates.len())];
        self.last_per_lane[lane] = Some(now);
        self.last_global = Some(now);
        Ok(lane)
    }
}
