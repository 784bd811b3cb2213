use palm_schema::{Difficulty, DifficultyProfile, SessionConfig, TrackMetadata};

use crate::error::ConfigError;
use crate::gameplay::judge::HitWindow;
use crate::gameplay::scheduler::SpawnPlan;

/// Validated options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub profile: DifficultyProfile,
    pub speed_multiplier: f64,
    /// 0 = derive from the track, or unbounded without one.
    pub time_limit_seconds: u32,
    pub hit_window: HitWindow,
    /// Seeds lane selection; a random seed is drawn when absent.
    pub seed: Option<u64>,
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        let settings = Self {
            profile: config.difficulty.profile(),
            speed_multiplier: config.speed_multiplier,
            time_limit_seconds: config.time_limit_seconds,
            hit_window: HitWindow::default(),
            seed: None,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_labels(
        difficulty: &str,
        speed_multiplier: f64,
        time_limit_seconds: u32,
    ) -> Result<Self, ConfigError> {
        let difficulty = Difficulty::parse(difficulty)
            .ok_or_else(|| ConfigError::UnknownDifficulty(difficulty.to_string()))?;
        Self::from_config(&SessionConfig {
            difficulty,
            speed_multiplier,
            time_limit_seconds,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_hit_window(mut self, window: HitWindow) -> Self {
        self.hit_window = window;
        self
    }

    /// Replaces the built-in profile. Checked again when the session starts.
    pub fn with_profile(mut self, profile: DifficultyProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.profile.level
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.speed_multiplier.is_finite() && self.speed_multiplier > 0.0) {
            return Err(ConfigError::NonPositiveSpeed(self.speed_multiplier));
        }
        if let Some(field) = self.profile.invalid_field() {
            return Err(ConfigError::InvalidProfile {
                level: self.profile.level,
                field,
            });
        }
        HitWindow::new(self.hit_window.ideal, self.hit_window.tolerance)?;
        SpawnPlan::new(&self.profile, self.speed_multiplier, self.time_limit_seconds).check()

    }

    /// The configured limit, capped to (or derived from) the track length.
    pub fn effective_time_limit(&self, track: Option<&TrackMetadata>) -> u32 {
        let Some(track) = track else {
            return self.time_limit_seconds;
        };
        let duration = track.duration_seconds;
        if duration > 0.0
            && (self.time_limit_seconds == 0 || f64::from(self.time_limit_seconds) > duration)
        {
            duration.ceil() as u32
        } else {
            self.time_limit_seconds
        }
    }
}

/// Parses a `SessionConfig`. Difficulty labels are matched like the CLI flag
/// (trimmed, any case), and an unknown one is reported as such.
pub fn load_config_json(json: &str) -> Result<SessionConfig, ConfigError> {
    let malformed = |e: serde_json::Error| ConfigError::Malformed(e.to_string());
    let mut value: serde_json::Value = serde_json::from_str(json).map_err(malformed)?;

    if let Some(label) = value.get_mut("difficulty") {
        if let Some(text) = label.as_str() {
            let level = Difficulty::parse(text)
                .ok_or_else(|| ConfigError::UnknownDifficulty(text.to_string()))?;
            *label = serde_json::Value::from(level.as_str());
        }
    }
    serde_json::from_value(value).map_err(malformed)
}

pub fn validate_track(track: &TrackMetadata) -> Result<(), ConfigError> {
    match track.problem() {
        Some(problem) => Err(ConfigError::MalformedTrack(problem)),
        None => Ok(()),
    }
}

pub fn load_track_json(json: &str) -> Result<TrackMetadata, ConfigError> {
    let track: TrackMetadata =
        serde_json::from_str(json).map_err(|e| ConfigError::MalformedTrack(e.to_string()))?;
    validate_track(&track)?;
    Ok(track)
}
