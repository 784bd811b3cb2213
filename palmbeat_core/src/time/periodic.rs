/// A fixed-period trigger on the game timeline.
///
/// Due times are computed from the origin rather than accumulated, so catching
/// up over many periods does not drift.
#[derive(Debug, Clone, PartialEq)]
pub struct Periodic {
    origin: f64,
    period: f64,
    fired: u64,
}

impl Periodic {
    /// First firing happens one full period after `origin`.
    pub fn starting_at(origin: f64, period: f64) -> Self {
        debug_assert!(period > 0.0, "periodic trigger needs a positive period");
        Self {
            origin,
            period,
            fired: 0,
        }
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn next_due(&self) -> f64 {
        self.origin + (self.fired + 1) as f64 * self.period
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.next_due() <= now
    }

    /// Marks the current due time as handled and returns it.
    pub fn fire(&mut self) -> f64 {
        let due = self.next_due();
        self.fired += 1;
        due
    }
}
