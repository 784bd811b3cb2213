use serde::{Deserialize, Serialize};
use std::fmt;

pub type Seconds = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    /// Capitalised label used by track metadata ("Easy", "Hard", ...).
    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile::for_level(*self)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate, spacing and speed constants for one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub level: Difficulty,
    pub spawn_rate_per_minute: f64,
    pub max_concurrent_notes: usize,
    pub fall_duration_seconds: Seconds,
    pub min_spacing_millis: f64,
    pub description: String,
}

impl DifficultyProfile {
    pub fn for_level(level: Difficulty) -> Self {
        let (rate, max_concurrent, fall, spacing, description) = match level {
            Difficulty::Easy => (20.0, 1, 5.0, 3000.0, "Super slow pace for beginners"),
            Difficulty::Medium => (40.0, 2, 3.0, 1500.0, "Balanced pace for casual players"),
            Difficulty::Hard => (80.0, 3, 2.0, 750.0, "Fast-paced challenge for experienced players"),
            Difficulty::Expert => (120.0, 4, 1.5, 500.0, "Intense rhythm challenge for experts"),
        };

        Self {
            level,
            spawn_rate_per_minute: rate,
            max_concurrent_notes: max_concurrent,
            fall_duration_seconds: fall,
            min_spacing_millis: spacing,
            description: description.to_string(),
        }
    }

    pub fn all() -> Vec<Self> {
        Difficulty::ALL.iter().map(|d| d.profile()).collect()
    }

    /// Name of the first field that is not strictly positive (and finite), if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.spawn_rate_per_minute) {
            Some("spawn_rate_per_minute")
        } else if self.max_concurrent_notes == 0 {
            Some("max_concurrent_notes")
        } else if !positive(self.fall_duration_seconds) {
            Some("fall_duration_seconds")
        } else if !positive(self.min_spacing_millis) {
            Some("min_spacing_millis")
        } else {
            None
        }
    }
}

/// Per-track data supplied by the song provider.
///
/// Field names on the wire follow the provider's response
/// (`name`, `file`, `bpm`, `multiplier`, `duration`, `difficulty`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub name: String,
    #[serde(rename = "file")]
    pub audio_file_ref: String,
    pub bpm: f64,
    #[serde(rename = "multiplier")]
    pub difficulty_multiplier: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: Seconds,
    #[serde(rename = "difficulty")]
    pub difficulty_label: String,
}

impl TrackMetadata {
    /// Builds metadata for a track, deriving its difficulty from bpm and length.
    pub fn estimate(
        name: impl Into<String>,
        audio_file_ref: impl Into<String>,
        bpm: f64,
        duration_seconds: Seconds,
    ) -> Self {
        let (level, multiplier) = estimate_difficulty(bpm, duration_seconds);
        Self {
            name: name.into(),
            audio_file_ref: audio_file_ref.into(),
            bpm,
            difficulty_multiplier: multiplier,
            duration_seconds,
            difficulty_label: level.title().to_string(),
        }
    }

    /// Describes the first malformed field, if any.
    pub fn problem(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("track name is empty".to_string());
        }
        if self.audio_file_ref.trim().is_empty() {
            return Some("audio file reference is empty".to_string());
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Some(format!("bpm must be positive (got {})", self.bpm));
        }
        if !(self.difficulty_multiplier.is_finite() && self.difficulty_multiplier > 0.0) {
            return Some(format!(
                "difficulty multiplier must be positive (got {})",
                self.difficulty_multiplier
            ));
        }
        if !(self.duration_seconds.is_finite() && self.duration_seconds >= 0.0) {
            return Some(format!(
                "duration must be a non-negative number of seconds (got {})",
                self.duration_seconds
            ));
        }
        None
    }
}

pub fn estimate_difficulty(bpm: f64, duration_seconds: Seconds) -> (Difficulty, f64) {
    let score = bpm / 100.0 + duration_seconds / 300.0;
    if score < 1.5 {
        (Difficulty::Easy, 1.0)
    } else if score < 2.0 {
        (Difficulty::Medium, 1.2)
    } else if score < 2.5 {
        (Difficulty::Hard, 1.5)
    } else {
        (Difficulty::Expert, 2.0)
    }
}

/// Caller-facing session options. `time_limit_seconds == 0` means "derive from
/// the track, or run unbounded".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub speed_multiplier: f64,
    pub time_limit_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            speed_multiplier: 1.0,
            time_limit_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Rank {
    pub fn from_accuracy(percent: f64) -> Self {
        if percent >= 95.0 {
            Rank::S
        } else if percent >= 90.0 {
            Rank::A
        } else if percent >= 80.0 {
            Rank::B
        } else if percent >= 70.0 {
            Rank::C
        } else if percent >= 60.0 {
            Rank::D
        } else {
            Rank::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::S => "S",
            Rank::A => "A",
            Rank::B => "B",
            Rank::C => "C",
            Rank::D => "D",
            Rank::F => "F",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `hits / total_notes` as a percentage; 0 when nothing spawned.
pub fn accuracy_percent(hits: u32, total_notes: u32) -> f64 {
    if total_notes == 0 {
        0.0
    } else {
        f64::from(hits) * 100.0 / f64::from(total_notes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    TimeUp,
    Stopped,
    Exited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResults {
    pub track: Option<String>,
    pub difficulty: Difficulty,
    pub speed_multiplier: f64,
    pub time_limit_seconds: u32,
    pub end_reason: EndReason,
    pub score: u64,
    pub max_combo: u32,
    pub hits: u32,
    pub misses: u32,
    pub total_notes: u32,
    pub perfects: u32,
    pub greats: u32,
    pub goods: u32,
    pub accuracy_percent: f64,
    pub rank: Rank,
}
