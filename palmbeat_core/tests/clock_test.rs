use palmbeat_core::time::clock::{Clock, ManualClock, SystemClock};
use palmbeat_core::time::periodic::Periodic;

#[test]
fn test_manual_clock_is_shared_between_clones() {
    let driver = ManualClock::new(10.0);
    let session_side = driver.clone();

    assert!((session_side.now() - 10.0).abs() < 1e-12);

    driver.advance(0.5);
    assert!((session_side.now() - 10.5).abs() < 1e-12);

    driver.set(3.0);
    assert!((session_side.now() - 3.0).abs() < 1e-12);
}

#[test]
fn test_manual_clock_through_reference() {
    let clock = ManualClock::new(1.25);
    let by_ref: &dyn Clock = &clock;
    assert_eq!(by_ref.now(), 1.25);
}

#[test]
fn test_periodic_first_fire_is_one_period_after_origin() {
    let mut p = Periodic::starting_at(4.0, 1.5);
    assert_eq!(p.period(), 1.5);
    assert_eq!(p.next_due(), 5.5);
    assert!(!p.is_due(5.4));
    assert!(p.is_due(5.5));

    assert_eq!(p.fire(), 5.5);
    assert_eq!(p.fire(), 7.0);
    assert_eq!(p.fired(), 2);
    assert_eq!(p.next_due(), 8.5);
}

#[test]
fn test_periodic_catch_up_does_not_drift() {
    let mut p = Periodic::starting_at(0.0, 0.1);
    for _ in 0..1000 {
        p.fire();
    }
    // Accumulating 0.1 a thousand times would drift; the due time is computed.
    assert_eq!(p.next_due(), 1001.0 * 0.1);
}

#[test]
fn test_system_clock_is_monotonic() {
    let clock = SystemClock::new();
    let a = clock.now();
    let b = clock.now();
    assert!(a >= 0.0);
    assert!(b >= a);
}
