use palm_schema::{accuracy_percent, Rank};

use crate::gameplay::judge::Tier;

pub const COMBO_STEP: u32 = 10;
pub const MAX_COMBO_MULTIPLIER: u64 = 5;
/// Consecutive perfects needed before the streak bonus starts paying.
pub const STREAK_THRESHOLD: u32 = 3;
pub const STREAK_BONUS_STEP: u64 = 25;
pub const MAX_STREAK_BONUS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit(Tier),
    Miss,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub hits: u32,
    pub misses: u32,
    /// Every note spawned, matched or not.
    pub total_notes: u32,
    pub perfect_streak: u32,
    pub perfects: u32,
    pub greats: u32,
    pub goods: u32,
}

impl PlayerState {
    pub fn accuracy_percent(&self) -> f64 {
        accuracy_percent(self.hits, self.total_notes)
    }

    pub fn rank(&self) -> Rank {
        Rank::from_accuracy(self.accuracy_percent())
    }

    /// Multiplier the next hit would receive.
    pub fn combo_multiplier(&self) -> u64 {
        combo_multiplier(self.combo)
    }

    /// Notes spawned but neither hit nor missed yet (or dropped by a manual stop).
    pub fn unresolved(&self) -> u32 {
        self.total_notes - self.hits - self.misses
    }
}

/// Points granted for one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreAward {
    pub base: u64,
    pub multiplier: u64,
    pub streak_bonus: u64,
    pub total: u64,
    /// Combo after this hit.
    pub combo: u32,
    /// Combo reached a positive multiple of `COMBO_STEP`.
    pub milestone: bool,
}

/// `min(5, floor(prior_combo / 10) + 1)`.
pub fn combo_multiplier(prior_combo: u32) -> u64 {
    (u64::from(prior_combo / COMBO_STEP) + 1).min(MAX_COMBO_MULTIPLIER)
}

/// Bonus for a perfect that extends the streak to `perfect_streak`.
pub fn streak_bonus(perfect_streak: u32) -> u64 {
    if perfect_streak < STREAK_THRESHOLD {
        return 0;
    }
    let over = u64::from(perfect_streak - (STREAK_THRESHOLD - 1));
    (STREAK_BONUS_STEP * over).min(MAX_STREAK_BONUS)
}

/// Per-player accumulator. The only writer of `PlayerState`.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    player: PlayerState,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn reset(&mut self) {
        self.player = PlayerState::default();
    }

    pub fn record_spawn(&mut self) {
        self.player.total_notes += 1;
    }

    /// Applies one resolved or expired note. Returns the award for hits.
    pub fn on_outcome(&mut self, outcome: Outcome, lane: usize) -> Option<ScoreAward> {
        match outcome {
            Outcome::Hit(tier) => Some(self.on_hit(tier, lane)),
            Outcome::Miss => {
                self.on_miss(lane);
                None
            }
        }
    }

    pub fn on_miss(&mut self, lane: usize) {
        self.check_unaccounted(Outcome::Miss, lane);
        let p = &mut self.player;
        p.combo = 0;
        p.perfect_streak = 0;
        p.misses += 1;
        log::debug!("miss in lane {lane}, score {}", p.score);
    }

    pub fn on_hit(&mut self, tier: Tier, lane: usize) -> ScoreAward {
        self.check_unaccounted(Outcome::Hit(tier), lane);
        let p = &mut self.player;

        // Multiplier uses the combo before this hit.
        let multiplier = combo_multiplier(p.combo);
        let bonus = if tier == Tier::Perfect {
            p.perfect_streak += 1;
            streak_bonus(p.perfect_streak)
        } else {
            p.perfect_streak = 0;
            0
        };

        let base = tier.base_points();
        let total = base * multiplier + bonus;
        p.score += total;
        p.combo += 1;
        p.hits += 1;
        p.max_combo = p.max_combo.max(p.combo);
        match tier {
            Tier::Perfect => p.perfects += 1,
            Tier::Great => p.greats += 1,
            Tier::Good => p.goods += 1,
        }

        log::debug!(
            "{tier} in lane {lane}: {base} x{multiplier} + {bonus} = {total}, combo {}, score {}",
            p.combo,
            p.score
        );

        ScoreAward {
            base,
            multiplier,
            streak_bonus: bonus,
            total,
            combo: p.combo,
            milestone: p.combo % COMBO_STEP == 0,
        }
    }

    fn check_unaccounted(&self, outcome: Outcome, lane: usize) {
        let p = &self.player;
        assert!(
            p.hits + p.misses < p.total_notes,
            "{outcome:?} in lane {lane} but every spawned note is already accounted for"
        );
    }
}
