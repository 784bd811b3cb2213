use palm_schema::Difficulty;
use thiserror::Error;

use crate::gameplay::scheduler::MIN_TICK_SECONDS;
use crate::gameplay::session::SessionPhase;

/// Rejections raised at the session-start boundary. None of them mutate state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown difficulty '{0}' (expected easy, medium, hard or expert)")]
    UnknownDifficulty(String),

    #[error("speed multiplier must be a positive number (got {0})")]
    NonPositiveSpeed(f64),

    #[error("difficulty profile '{level}' has a non-positive {field}")]
    InvalidProfile {
        level: Difficulty,
        field: &'static str,
    },

    #[error("malformed track metadata: {0}")]
    MalformedTrack(String),

    #[error("hit window centred at {ideal} with tolerance {tolerance} does not fit in 0..=1")]
    InvalidHitWindow { ideal: f64, tolerance: f64 },

    #[error(
        "{what} of {value}s is outside the playable range (at least {floor}s); lower the speed multiplier",
        floor = MIN_TICK_SECONDS
    )]
    DegenerateTiming { what: &'static str, value: f64 },

    #[error("malformed session config: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
}
