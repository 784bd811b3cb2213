use palm_schema::Difficulty;
use palmbeat_core::gameplay::lane::LaneMap;
use palmbeat_core::gameplay::scheduler::{
    SpawnPlan, SpawnRejection, SpawnScheduler, MIN_TICK_SECONDS,
};
use palmbeat_core::ConfigError;
use palmbeat_core::gameplay::tracker::NoteTracker;
use proptest::prelude::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn plan(level: Difficulty, speed: f64, limit: u32) -> SpawnPlan {
    SpawnPlan::new(&level.profile(), speed, limit)
}

/// Ticks the scheduler at its poll interval, hitting each new note straight away.
fn run_lanes(seed: u64, ticks: usize) -> Vec<usize> {
    let plan = plan(Difficulty::Medium, 1.0, 0);
    let poll = plan.poll_interval;
    let fall = plan.fall_duration;
    let lanes = LaneMap::default();
    let mut scheduler = SpawnScheduler::new(plan, lanes.len(), seed);
    let mut tracker = NoteTracker::new();
    let mut picked = Vec::new();

    for k in 1..=ticks {
        let now = k as f64 * poll;
        tracker.expire_due(now);
        if let Ok(lane) = scheduler.tick(now, true, &tracker, false).spawn {
            let id = tracker.spawn(lane, lanes.symbol_for_lane(lane).unwrap(), now, fall).id;
            tracker.resolve(id);
            picked.push(lane);
        }
    }
    picked
}

#[test]
fn test_easy_plan_for_thirty_seconds() {
    let p = plan(Difficulty::Easy, 1.0, 30);
    assert!(approx(p.tiles_per_minute, 20.0));
    assert!(approx(p.interval_ms, 3000.0));
    assert!(approx(p.min_notes, 10.0));
    assert!(approx(p.adjusted_interval_ms, 3000.0));
    assert!(approx(p.poll_interval, 1.5));
    assert!(approx(p.fall_duration, 5.0));
    assert!(approx(p.min_spacing, 3.0));
    assert_eq!(p.max_concurrent, 1);
}

#[test]
fn test_unbounded_plan_uses_raw_interval() {
    let p = plan(Difficulty::Medium, 1.0, 0);
    assert_eq!(p.min_notes, 0.0);
    assert!(approx(p.adjusted_interval_ms, 1500.0));
    assert!(approx(p.poll_interval, 0.75));
}

#[test]
fn test_speed_scales_fall_and_spacing() {
    let p = plan(Difficulty::Easy, 2.0, 30);
    assert!(approx(p.tiles_per_minute, 40.0));
    assert!(approx(p.fall_duration, 2.5));
    assert!(approx(p.min_spacing, 1.5));
    assert!(approx(p.poll_interval, 0.75));
}

#[test]
fn test_slow_profile_is_shortened_to_reach_note_floor() {
    let mut profile = Difficulty::Easy.profile();
    profile.spawn_rate_per_minute = 3.0;

    let p = SpawnPlan::new(&profile, 1.0, 60);
    assert!(approx(p.interval_ms, 20_000.0));
    assert!(approx(p.min_notes, 4.0));
    assert!(approx(p.adjusted_interval_ms, 15_000.0));
    assert!(approx(p.poll_interval, 7.5));
}

#[test]
fn test_plan_check_rejects_degenerate_timing() {
    assert!(plan(Difficulty::Expert, 1.0, 30).check().is_ok());
    assert!(plan(Difficulty::Easy, 200.0, 30).check().is_ok());

    let collapsed = plan(Difficulty::Expert, 1e308, 30);
    assert_eq!(collapsed.poll_interval, 0.0);
    assert!(matches!(
        collapsed.check(),
        Err(ConfigError::DegenerateTiming { what: "poll interval", .. })
    ));

    let too_fine = plan(Difficulty::Expert, 1e12, 0);
    assert!(too_fine.poll_interval < MIN_TICK_SECONDS);
    assert!(too_fine.check().is_err());
}

#[test]
fn test_first_tick_spawns() {
    let mut scheduler = SpawnScheduler::new(plan(Difficulty::Easy, 1.0, 30), 4, 1);
    let tracker = NoteTracker::new();

    let outcome = scheduler.tick(1.5, true, &tracker, false);
    let lane = outcome.spawn.expect("empty board should spawn");
    assert!(lane < 4);
    assert!(!outcome.time_up);
    assert_eq!(scheduler.last_spawn(), Some(1.5));
}

#[test]
fn test_not_running_is_rejected() {
    let mut scheduler = SpawnScheduler::new(plan(Difficulty::Easy, 1.0, 30), 4, 1);
    let tracker = NoteTracker::new();

    let outcome = scheduler.tick(1.5, false, &tracker, false);
    assert_eq!(outcome.spawn, Err(SpawnRejection::NotRunning));
    assert!(!scheduler.is_stopped());
    assert_eq!(scheduler.last_spawn(), None);
}

#[test]
fn test_spacing_and_cap() {
    let p = plan(Difficulty::Medium, 1.0, 0);
    let fall = p.fall_duration;
    let lanes = LaneMap::default();
    let mut scheduler = SpawnScheduler::new(p, lanes.len(), 9);
    let mut tracker = NoteTracker::new();

    let first = scheduler.tick(0.0, true, &tracker, false).spawn.unwrap();
    tracker.spawn(first, lanes.symbol_for_lane(first).unwrap(), 0.0, fall);

    assert_eq!(
        scheduler.tick(1.0, true, &tracker, false).spawn,
        Err(SpawnRejection::GlobalSpacing)
    );

    let second = scheduler.tick(1.5, true, &tracker, false).spawn.unwrap();
    assert_ne!(second, first, "occupied lane must not be picked");
    tracker.spawn(second, lanes.symbol_for_lane(second).unwrap(), 1.5, fall);

    assert_eq!(
        scheduler.tick(3.0, true, &tracker, false).spawn,
        Err(SpawnRejection::ConcurrencyCap)
    );
}

#[test]
fn test_no_eligible_lane() {
    let mut profile = Difficulty::Medium.profile();
    profile.max_concurrent_notes = 10;
    let p = SpawnPlan::new(&profile, 1.0, 0);
    let mut scheduler = SpawnScheduler::new(p, 1, 3);
    let mut tracker = NoteTracker::new();

    let lane = scheduler.tick(0.0, true, &tracker, false).spawn.unwrap();
    assert_eq!(lane, 0);
    tracker.spawn(0, palmbeat_core::Gesture::Fist, 0.0, 100.0);

    assert_eq!(
        scheduler.tick(5.0, true, &tracker, false).spawn,
        Err(SpawnRejection::NoEligibleLane)
    );
}

#[test]
fn test_time_up_stops_scheduler() {
    let mut scheduler = SpawnScheduler::new(plan(Difficulty::Easy, 1.0, 30), 4, 1);
    let tracker = NoteTracker::new();

    // The check runs after the spawn attempt, so this tick may still spawn.
    let outcome = scheduler.tick(1.5, true, &tracker, true);
    assert!(outcome.spawn.is_ok());
    assert!(outcome.time_up);
    assert!(scheduler.is_stopped());

    let outcome = scheduler.tick(3.0, true, &tracker, true);
    assert_eq!(outcome.spawn, Err(SpawnRejection::Stopped));
    assert!(!outcome.time_up, "time up is reported once");
}

#[test]
fn test_spawns_stop_before_resolve_deadline() {
    // Easy notes fall for 5s; with the run ending at 35s the last legal spawn is 30s.
    let mut scheduler = SpawnScheduler::new(plan(Difficulty::Easy, 1.0, 30), 4, 1);
    scheduler.set_resolve_deadline(35.0);
    assert_eq!(scheduler.resolve_deadline(), Some(35.0));
    let tracker = NoteTracker::new();

    assert_eq!(
        scheduler.tick(30.5, true, &tracker, false).spawn,
        Err(SpawnRejection::TooLate)
    );
    assert_eq!(scheduler.last_spawn(), None);
    assert!(scheduler.tick(30.0, true, &tracker, false).spawn.is_ok());
}

#[test]
fn test_time_up_ignored_while_not_running() {
    let mut scheduler = SpawnScheduler::new(plan(Difficulty::Easy, 1.0, 30), 4, 1);
    let tracker = NoteTracker::new();

    let outcome = scheduler.tick(1.5, false, &tracker, true);
    assert!(!outcome.time_up);
    assert!(!scheduler.is_stopped());
}

#[test]
fn test_same_seed_same_lanes() {
    assert_eq!(run_lanes(42, 200), run_lanes(42, 200));
}

#[test]
fn test_every_lane_gets_used() {
    let picked = run_lanes(5, 400);
    for lane in 0..4 {
        assert!(picked.contains(&lane), "lane {lane} never picked");
    }
}

proptest! {
    #[test]
    fn caps_are_never_exceeded(
        level in 0usize..4,
        speed in 0.5f64..3.0,
        seed in any::<u64>(),
        hits in prop::collection::vec(any::<bool>(), 1..200),
    ) {
        let p = plan(Difficulty::ALL[level], speed, 60);
        let poll = p.poll_interval;
        let fall = p.fall_duration;
        let spacing = p.min_spacing;
        let cap = p.max_concurrent;
        let lanes = LaneMap::default();
        let mut scheduler = SpawnScheduler::new(p, lanes.len(), seed);
        let mut tracker = NoteTracker::new();
        let mut last: Option<f64> = None;

        for (k, hit) in hits.iter().enumerate() {
            let now = (k + 1) as f64 * poll;
            tracker.expire_due(now);
            if *hit {
                if let Some(id) = tracker.live().first().map(|n| n.id) {
                    tracker.resolve(id);
                }
            }

            if let Ok(lane) = scheduler.tick(now, true, &tracker, false).spawn {
                prop_assert_eq!(tracker.count_in_lane(lane), 0);
                if let Some(prev) = last {
                    prop_assert!(now - prev + 1e-9 >= spacing);
                }
                last = Some(now);
                tracker.spawn(lane, lanes.symbol_for_lane(lane).unwrap(), now, fall);
            }

            prop_assert!(tracker.live_count() <= cap);
            for lane in 0..lanes.len() {
                prop_assert!(tracker.count_in_lane(lane) <= 1);
            }
        }
    }

    #[test]
    fn easy_thirty_seconds_spawns_at_most_eleven(
        seed in any::<u64>(),
        hits in prop::collection::vec(any::<bool>(), 20),
    ) {
        let p = plan(Difficulty::Easy, 1.0, 30);
        let poll = p.poll_interval;
        let fall = p.fall_duration;
        let lanes = LaneMap::default();
        let mut scheduler = SpawnScheduler::new(p, lanes.len(), seed);
        let mut tracker = NoteTracker::new();
        let mut spawned = 0;

        // Twenty ticks at 1.5s cover the whole 30s of running time.
        for (k, hit) in hits.iter().enumerate() {
            let now = (k + 1) as f64 * poll;
            tracker.expire_due(now);
            if *hit {
                if let Some(id) = tracker.live().first().map(|n| n.id) {
                    tracker.resolve(id);
                }
            }
            if let Ok(lane) = scheduler.tick(now, true, &tracker, false).spawn {
                tracker.spawn(lane, lanes.symbol_for_lane(lane).unwrap(), now, fall);
                spawned += 1;
            }
        }
        prop_assert!(spawned <= 11);
    }
}
