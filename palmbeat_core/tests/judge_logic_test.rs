#[cfg(test)]
mod tests {
    use palmbeat_core::gameplay::judge::{HitWindow, JudgeMachine, Tier};
    use palmbeat_core::gameplay::lane::LaneMap;
    use palmbeat_core::gameplay::tracker::NoteTracker;
    use palmbeat_core::input::events::Gesture;

    // Every note falls for 1s from t=0, so progress equals the current time.
    const FALL: f64 = 1.0;

    fn create_test_tracker() -> NoteTracker {
        let mut tracker = NoteTracker::new();
        tracker.spawn(1, Gesture::Peace, 0.0, FALL); // id 0
        tracker
    }

    #[test]
    fn test_perfect_judgment() {
        let tracker = create_test_tracker();
        let judge = JudgeMachine::default();

        let result = judge
            .process_input(Gesture::Peace, &LaneMap::default(), &tracker, 0.85)
            .expect("Should trigger judgment");

        assert_eq!(result.tier, Tier::Perfect);
        assert_eq!(result.note_id, 0);
        assert_eq!(result.lane, 1);
        assert_eq!(result.offset, 0.0);
        assert_eq!(result.accuracy, 1.0);
    }

    #[test]
    fn test_late_great_judgment() {
        let tracker = create_test_tracker();
        let judge = JudgeMachine::default();

        // 0.024 past the line -> accuracy 0.8
        let result = judge
            .process_input(Gesture::Peace, &LaneMap::default(), &tracker, 0.874)
            .expect("Should trigger judgment");
        assert_eq!(result.tier, Tier::Great);
        assert!(result.offset > 0.0);
        assert!((result.accuracy - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_early_good_judgment() {
        let tracker = create_test_tracker();
        let judge = JudgeMachine::default();

        // 0.048 before the line -> accuracy 0.6
        let result = judge
            .process_input(Gesture::Peace, &LaneMap::default(), &tracker, 0.802)
            .expect("Should trigger judgment");
        assert_eq!(result.tier, Tier::Good);
        assert!(result.offset < 0.0);
    }

    #[test]
    fn test_low_accuracy_inside_window_does_not_score() {
        let tracker = create_test_tracker();
        let judge = JudgeMachine::default();

        // Inside the window (0.07 <= 0.12) but accuracy ~0.42.
        assert!(judge.window.contains(0.92));
        let result = judge.process_input(Gesture::Peace, &LaneMap::default(), &tracker, 0.92);
        assert!(result.is_none());
    }

    #[test]
    fn test_outside_window_is_ignored() {
        let tracker = create_test_tracker();
        let judge = JudgeMachine::default();

        let lanes = LaneMap::default();
        assert!(judge.process_input(Gesture::Peace, &lanes, &tracker, 0.5).is_none());
        assert!(judge.process_input(Gesture::Peace, &lanes, &tracker, 0.98).is_none());
    }

    #[test]
    fn test_wrong_symbol_is_ignored() {
        let tracker = create_test_tracker();
        let judge = JudgeMachine::default();

        let result = judge.process_input(Gesture::Fist, &LaneMap::default(), &tracker, 0.85);
        assert!(result.is_none());
    }

    #[test]
    fn test_symbol_selects_its_lane() {
        let mut tracker = NoteTracker::new();
        tracker.spawn(0, Gesture::Fist, 0.0, FALL);
        tracker.spawn(2, Gesture::Index, 0.0, FALL);
        let judge = JudgeMachine::default();
        let lanes = LaneMap::default();

        let r = judge.process_input(Gesture::Index, &lanes, &tracker, 0.85).unwrap();
        assert_eq!(r.lane, 2);
        assert_eq!(r.note_id, 1);

        let r = judge.process_input(Gesture::Fist, &lanes, &tracker, 0.85).unwrap();
        assert_eq!(r.lane, 0);
    }

    #[test]
    fn test_first_scoring_lane_wins() {
        // Two lanes share a symbol; the lower lane takes the event even though
        // the other lane's note is closer to the line.
        let lanes = LaneMap::new([Gesture::Peace, Gesture::Peace]);
        let mut tracker = NoteTracker::new();
        tracker.spawn(0, Gesture::Peace, 0.02, FALL); // progress 0.83 at t=0.85
        tracker.spawn(1, Gesture::Peace, 0.0, FALL); // progress 0.85
        let judge = JudgeMachine::default();

        let r = judge.process_input(Gesture::Peace, &lanes, &tracker, 0.85).unwrap();
        assert_eq!(r.lane, 0);
        assert_eq!(r.tier, Tier::Great);
    }

    #[test]
    fn test_non_scoring_lane_falls_through() {
        let lanes = LaneMap::new([Gesture::Peace, Gesture::Peace]);
        let mut tracker = NoteTracker::new();
        tracker.spawn(0, Gesture::Peace, -0.07, FALL); // progress 0.92, no score
        tracker.spawn(1, Gesture::Peace, 0.0, FALL);
        let judge = JudgeMachine::default();

        let r = judge.process_input(Gesture::Peace, &lanes, &tracker, 0.85).unwrap();
        assert_eq!(r.lane, 1);
        assert_eq!(r.note_id, 1);
    }

    #[test]
    fn test_closest_note_in_lane_is_candidate() {
        let mut tracker = NoteTracker::new();
        tracker.spawn(1, Gesture::Peace, 0.0, FALL); // progress 0.88
        tracker.spawn(1, Gesture::Peace, 0.1, FALL); // progress 0.78
        let judge = JudgeMachine::default();

        let candidate = judge.candidate_in_lane(1, &tracker, 0.88).unwrap();
        assert_eq!(candidate.id, 0);

        let mut tracker = NoteTracker::new();
        tracker.spawn(1, Gesture::Peace, 0.0, FALL); // progress 0.98, outside
        tracker.spawn(1, Gesture::Peace, 0.1, FALL); // progress 0.88
        let candidate = judge.candidate_in_lane(1, &tracker, 0.98).unwrap();
        assert_eq!(candidate.id, 1);
    }

    #[test]
    fn test_identical_notes_resolve_oldest_id_first() {
        let mut tracker = NoteTracker::new();
        tracker.spawn(3, Gesture::OpenHand, 0.0, FALL);
        tracker.spawn(3, Gesture::OpenHand, 0.0, FALL);
        let judge = JudgeMachine::default();

        let r = judge
            .process_input(Gesture::OpenHand, &LaneMap::default(), &tracker, 0.85)
            .unwrap();
        assert_eq!(r.note_id, 0);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::from_accuracy(0.95), Some(Tier::Perfect));
        assert_eq!(Tier::from_accuracy(0.9), Some(Tier::Great));
        assert_eq!(Tier::from_accuracy(0.7), Some(Tier::Good));
        assert_eq!(Tier::from_accuracy(0.5), None);
        assert_eq!(Tier::Perfect.base_points(), 100);
        assert_eq!(Tier::Great.base_points(), 75);
        assert_eq!(Tier::Good.base_points(), 50);
    }

    #[test]
    fn test_hit_window_validation() {
        assert!(HitWindow::new(0.85, 0.12).is_ok());
        assert!(HitWindow::new(0.95, 0.12).is_err());
        assert!(HitWindow::new(0.5, 0.0).is_err());
        assert!(HitWindow::new(f64::NAN, 0.1).is_err());
    }
}
