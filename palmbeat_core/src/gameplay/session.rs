use std::fmt;

use crossbeam_channel::Receiver;
use palm_schema::{Difficulty, EndReason, SessionConfig, SessionResults, TrackMetadata};

use crate::config::{validate_track, SessionSettings};
use crate::error::SessionError;
use crate::events::{EventBus, GameEvent};
use crate::gameplay::judge::{HitWindow, JudgeMachine, JudgmentResult};
use crate::gameplay::lane::LaneMap;
use crate::gameplay::scheduler::{SpawnPlan, SpawnScheduler};
use crate::gameplay::scoring::{PlayerState, ScoringEngine};
use crate::gameplay::tracker::{Note, NoteTracker};
use crate::input::events::GestureEvent;
use crate::input::InputQueue;
use crate::time::clock::Clock;
use crate::time::periodic::Periodic;

pub const COUNTDOWN_FROM: u32 = 3;
pub const COUNTDOWN_STEP_SECONDS: f64 = 1.0;
pub const TIMER_PERIOD_SECONDS: f64 = 1.0;
/// Lets in-flight notes resolve after the time limit is reached.
pub const END_GRACE_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    CountingDown,
    Running,
    Paused,
    Ended,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::Idle => "idle",
            SessionPhase::CountingDown => "counting down",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Ended => "ended",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub difficulty: Difficulty,
    pub speed_multiplier: f64,
    /// 0 = unbounded.
    pub time_limit_seconds: u32,
    pub time_remaining_seconds: u32,
    pub elapsed_seconds: u32,
    pub running: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            speed_multiplier: 1.0,
            time_limit_seconds: 0,
            time_remaining_seconds: 0,
            elapsed_seconds: 0,
            running: false,
        }
    }
}

impl SessionState {
    fn time_up(&self) -> bool {
        self.time_limit_seconds > 0 && self.time_remaining_seconds == 0
    }
}

/// Triggers on the game timeline. Declaration order breaks ties between
/// triggers due at the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Trigger {
    Expiry,
    Spawn,
    Timer,
    GraceEnd,
    Countdown,
}

/// Machinery that only exists between `start` and the end of a run.
struct Run {
    settings: SessionSettings,
    scheduler: SpawnScheduler,
    judge: JudgeMachine,
    countdown: Option<Periodic>,
    countdown_left: u32,
    timer: Option<Periodic>,
    spawn_ticker: Option<Periodic>,
    end_at: Option<f64>,
}

/// Owns one player's run end to end.
///
/// All three triggers (spawn ticks, the one-second timer, and input events) are
/// applied on a single game timeline that advances only while counting down or
/// running. Call [`Session::update`] regularly (every frame) and feed input
/// through [`Session::handle_input`] or [`Session::drain_input`].
pub struct Session<C: Clock> {
    clock: C,
    lanes: LaneMap,
    phase: SessionPhase,
    state: SessionState,
    scoring: ScoringEngine,
    tracker: NoteTracker,
    run: Option<Run>,
    track: Option<TrackMetadata>,
    events: EventBus,
    results: Option<SessionResults>,
    last_wall: f64,
    game_time: f64,
}

impl<C: Clock> Session<C> {
    pub fn new(clock: C) -> Self {
        Self::with_lanes(clock, LaneMap::default())
    }

    pub fn with_lanes(clock: C, lanes: LaneMap) -> Self {
        let last_wall = clock.now();
        Self {
            clock,
            lanes,
            phase: SessionPhase::Idle,
            state: SessionState::default(),
            scoring: ScoringEngine::new(),
            tracker: NoteTracker::new(),
            run: None,
            track: None,
            events: EventBus::new(),
            results: None,
            last_wall,
            game_time: 0.0,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn player(&self) -> &PlayerState {
        self.scoring.player()
    }

    pub fn lanes(&self) -> &LaneMap {
        &self.lanes
    }

    pub fn live_notes(&self) -> &[Note] {
        self.tracker.live()
    }

    pub fn hit_window(&self) -> Option<HitWindow> {
        self.run.as_ref().map(|r| r.judge.window)
    }

    pub fn spawn_plan(&self) -> Option<&SpawnPlan> {
        self.run.as_ref().map(|r| r.scheduler.plan())
    }

    /// Seconds of game time since `start` (countdown included).
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    pub fn track(&self) -> Option<&TrackMetadata> {
        self.track.as_ref()
    }

    /// Frozen results of the last finished run.
    pub fn results(&self) -> Option<&SessionResults> {
        self.results.as_ref()
    }

    pub fn load_track(&mut self, track: TrackMetadata) -> Result<(), SessionError> {
        if !matches!(self.phase, SessionPhase::Idle | SessionPhase::Ended) {
            return Err(self.refuse("load a track"));
        }
        validate_track(&track)?;
        log::info!(
            "track loaded: {} ({:.0} bpm, {:.1}s, {})",
            track.name,
            track.bpm,
            track.duration_seconds,
            track.difficulty_label
        );
        self.track = Some(track);
        Ok(())
    }

    pub fn start_with_config(&mut self, config: &SessionConfig) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(self.refuse("start"));
        }
        self.start(SessionSettings::from_config(config)?)
    }

    /// `idle -> counting down`. Refused without any state change unless idle and
    /// the settings are valid.
    pub fn start(&mut self, settings: SessionSettings) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(self.refuse("start"));
        }
        settings.validate()?;

        let time_limit = settings.effective_time_limit(self.track.as_ref());
        let plan = SpawnPlan::new(&settings.profile, settings.speed_multiplier, time_limit);
        plan.check()?;
        let seed = settings.seed.unwrap_or_else(rand::random);

        log::info!(
            "starting session: difficulty={}, speed={}x, time limit={}s, poll every {:.3}s, seed={}",
            settings.difficulty(),
            settings.speed_multiplier,
            time_limit,
            plan.poll_interval,
            seed
        );

        self.state = SessionState {
            difficulty: settings.difficulty(),
            speed_multiplier: settings.speed_multiplier,
            time_limit_seconds: time_limit,
            time_remaining_seconds: time_limit,
            elapsed_seconds: 0,
            running: false,
        };
        self.scoring.reset();
        self.tracker.reset();
        self.results = None;
        self.game_time = 0.0;
        self.last_wall = self.clock.now();

        self.run = Some(Run {
            scheduler: SpawnScheduler::new(plan, self.lanes.len(), seed),
            judge: JudgeMachine::new(settings.hit_window),
            settings,
            countdown: Some(Periodic::starting_at(0.0, COUNTDOWN_STEP_SECONDS)),
            countdown_left: COUNTDOWN_FROM,
            timer: None,
            spawn_ticker: None,
            end_at: None,
        });
        self.phase = SessionPhase::CountingDown;
        self.events.emit(GameEvent::CountdownTick {
            remaining: COUNTDOWN_FROM,
        });
        Ok(())
    }

    /// Brings the game timeline up to the clock and fires everything due.
    pub fn update(&mut self) {
        let now = self.clock.now();
        let delta = (now - self.last_wall).max(0.0);
        self.last_wall = now;

        if self.is_advancing() {
            self.advance_to(self.game_time + delta);
        }
    }

    /// Evaluates one detector reading at the current time. Returns the judgment
    /// when it scored; every other case is a silent no-op.
    pub fn handle_input(&mut self, event: &GestureEvent) -> Option<JudgmentResult> {
        self.update();
        if self.phase != SessionPhase::Running {
            return None;
        }

        let Some(gesture) = event.gesture() else {
            if event.is_idle() {
                log::trace!("no gesture detected");
            } else {
                log::warn!("dropping unknown input symbol '{}'", event.symbol);
            }
            return None;
        };

        let run = self.run.as_ref()?;
        let result = run
            .judge
            .process_input(gesture, &self.lanes, &self.tracker, self.game_time)?;

        let note = self.tracker.resolve(result.note_id);
        let award = self.scoring.on_hit(result.tier, note.lane);
        log::debug!(
            "note {} resolved in lane {} as {} (accuracy {:.3})",
            note.id,
            note.lane,
            result.tier,
            result.accuracy
        );

        self.events.emit(GameEvent::NoteResolved {
            id: note.id,
            lane: note.lane,
            tier: result.tier,
            accuracy: result.accuracy,
            award,
        });
        self.emit_score();
        Some(result)
    }

    /// Handles every queued input event in arrival order. Returns how many scored.
    pub fn drain_input(&mut self, queue: &InputQueue) -> usize {
        let mut scored = 0;
        while let Some(event) = queue.pop() {
            if self.handle_input(&event).is_some() {
                scored += 1;
            }
        }
        scored
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.update();
        if self.phase != SessionPhase::Running {
            return Err(self.refuse("pause"));
        }
        self.phase = SessionPhase::Paused;
        self.state.running = false;
        log::info!("session paused at {:.3}s", self.game_time);
        self.events.emit(GameEvent::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Paused {
            return Err(self.refuse("resume"));
        }
        self.last_wall = self.clock.now();
        self.phase = SessionPhase::Running;
        self.state.running = true;
        log::info!("session resumed at {:.3}s", self.game_time);
        self.events.emit(GameEvent::Resumed);
        Ok(())
    }

    /// Ends an active run. A second call (or a call while idle) does nothing.
    pub fn stop(&mut self) {
        self.finish_now(EndReason::Stopped);
    }

    pub fn exit(&mut self) {
        self.finish_now(EndReason::Exited);
    }

    /// Back to idle. Halts an active run without reporting results.
    pub fn reset(&mut self, preserve_track: bool) {
        if self.run.is_some() {
            log::info!("session reset while {}", self.phase);
        }
        self.run = None;
        self.phase = SessionPhase::Idle;
        self.state = SessionState::default();
        self.scoring.reset();
        self.tracker.reset();
        self.results = None;
        self.game_time = 0.0;
        self.last_wall = self.clock.now();
        if !preserve_track {
            self.track = None;
        }
    }

    fn refuse(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }

    fn is_advancing(&self) -> bool {
        matches!(self.phase, SessionPhase::CountingDown | SessionPhase::Running)
    }

    fn finish_now(&mut self, reason: EndReason) {
        if !matches!(
            self.phase,
            SessionPhase::CountingDown | SessionPhase::Running | SessionPhase::Paused
        ) {
            return;
        }
        self.update();
        self.end(reason);
    }

    fn advance_to(&mut self, target: f64) {
        while let Some((due, trigger)) = self.next_trigger() {
            if due > target {
                break;
            }
            self.game_time = self.game_time.max(due);
            self.fire(trigger);
            if !self.is_advancing() {
                return;
            }
        }
        self.game_time = target;
    }

    fn next_trigger(&self) -> Option<(f64, Trigger)> {
        let run = self.run.as_ref()?;
        let mut candidates = Vec::with_capacity(5);

        if let Some(countdown) = &run.countdown {
            candidates.push((countdown.next_due(), Trigger::Countdown));
        }
        if self.phase == SessionPhase::Running {
            if let Some(expiry) = self.tracker.next_expiry() {
                candidates.push((expiry, Trigger::Expiry));
            }
            if let Some(ticker) = &run.spawn_ticker {
                candidates.push((ticker.next_due(), Trigger::Spawn));
            }
            if let Some(timer) = &run.timer {
                candidates.push((timer.next_due(), Trigger::Timer));
            }
            if let Some(end_at) = run.end_at {
                candidates.push((end_at, Trigger::GraceEnd));
            }
        }

        candidates
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
    }

    fn fire(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Countdown => self.on_countdown(),
            Trigger::Timer => self.on_timer(),
            Trigger::Spawn => self.on_spawn_tick(),
            Trigger::Expiry => self.on_expiry(),
            Trigger::GraceEnd => self.end(EndReason::TimeUp),
        }
    }

    fn on_countdown(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let Some(countdown) = run.countdown.as_mut() else {
            return;
        };
        let at = countdown.fire();

        if run.countdown_left == 0 {
            run.countdown = None;
            self.begin_running(at);
        } else {
            run.countdown_left -= 1;
            let remaining = run.countdown_left;
            self.events.emit(GameEvent::CountdownTick { remaining });
        }
    }

    fn begin_running(&mut self, at: f64) {
        let limit = self.state.time_limit_seconds;
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if limit > 0 {
            // The timer ends the run exactly `limit` seconds from here, plus grace.
            run.scheduler.set_resolve_deadline(at + f64::from(limit) + END_GRACE_SECONDS);
        }
        run.timer = Some(Periodic::starting_at(at, TIMER_PERIOD_SECONDS));
        run.spawn_ticker = Some(Periodic::starting_at(at, run.scheduler.plan().poll_interval));
        self.phase = SessionPhase::Running;
        self.state.running = true;
        log::info!("session running at {at:.3}s");
        self.events.emit(GameEvent::SessionStarted);
    }

    fn on_timer(&mut self) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let Some(timer) = run.timer.as_mut() else {
            return;
        };
        let at = timer.fire();

        self.state.elapsed_seconds += 1;
        if self.state.time_limit_seconds > 0 {
            self.state.time_remaining_seconds = self.state.time_remaining_seconds.saturating_sub(1);
        }
        self.events.emit(GameEvent::TimeTick {
            remaining: self.state.time_remaining_seconds,
            elapsed: self.state.elapsed_seconds,
        });

        if self.state.time_up() {
            self.on_time_up(at);
        }
    }

    fn on_spawn_tick(&mut self) {
        let time_up = self.state.time_up();
        let running = self.state.running;
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let Some(ticker) = run.spawn_ticker.as_mut() else {
            return;
        };
        let at = ticker.fire();

        let outcome = run.scheduler.tick(at, running, &self.tracker, time_up);
        let fall = run.scheduler.plan().fall_duration;

        if let Ok(lane) = outcome.spawn {
            if let Some(symbol) = self.lanes.symbol_for_lane(lane) {
                let id = self.tracker.spawn(lane, symbol, at, fall).id;
                self.scoring.record_spawn();
                self.events.emit(GameEvent::NoteSpawned { id, lane, symbol });
            }
        }
        if outcome.time_up {
            self.on_time_up(at);
        }
    }

    fn on_expiry(&mut self) {
        for note in self.tracker.expire_due(self.game_time) {
            self.scoring.on_miss(note.lane);
            log::debug!("note {} expired in lane {}", note.id, note.lane);
            self.events.emit(GameEvent::NoteExpired {
                id: note.id,
                lane: note.lane,
            });
            self.emit_score();
        }
    }

    /// First observation of the limit stops spawning and the timer, and arms
    /// the grace period. Later observations keep the earliest end time.
    fn on_time_up(&mut self, at: f64) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        run.scheduler.stop();
        run.spawn_ticker = None;
        run.timer = None;
        if run.end_at.is_none() {
            log::info!("time limit reached at {at:.3}s, ending after {END_GRACE_SECONDS}s grace");
            run.end_at = Some(at + END_GRACE_SECONDS);
        }
    }

    fn end(&mut self, reason: EndReason) {
        let Some(run) = self.run.take() else {
            return;
        };

        self.phase = SessionPhase::Ended;
        self.state.running = false;
        let dropped = self.tracker.clear();

        let p = self.scoring.player();
        let results = SessionResults {
            track: self.track.as_ref().map(|t| t.name.clone()),
            difficulty: run.settings.difficulty(),
            speed_multiplier: run.settings.speed_multiplier,
            time_limit_seconds: self.state.time_limit_seconds,
            end_reason: reason,
            score: p.score,
            max_combo: p.max_combo,
            hits: p.hits,
            misses: p.misses,
            total_notes: p.total_notes,
            perfects: p.perfects,
            greats: p.greats,
            goods: p.goods,
            accuracy_percent: p.accuracy_percent(),
            rank: p.rank(),
        };

        log::info!(
            "session ended ({:?}) at {:.3}s: score {}, accuracy {:.1}%, rank {}, {} live note(s) dropped",
            reason,
            self.game_time,
            results.score,
            results.accuracy_percent,
            results.rank,
            dropped
        );
        self.results = Some(results.clone());
        self.events.emit(GameEvent::SessionEnded(results));
    }

    fn emit_score(&mut self) {
        let p = self.scoring.player();
        let event = GameEvent::ScoreChanged {
            score: p.score,
            combo: p.combo,
            multiplier: p.combo_multiplier(),
        };
        self.events.emit(event);
    }
}
