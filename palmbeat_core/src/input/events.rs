use std::fmt;

/// The closed symbol alphabet produced by the hand-pose detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gesture {
    Fist,
    Peace,
    Index,
    OpenHand,
}

impl Gesture {
    pub const ALL: [Gesture; 4] = [Gesture::Fist, Gesture::Peace, Gesture::Index, Gesture::OpenHand];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Fist => "fist",
            Gesture::Peace => "peace",
            Gesture::Index => "index",
            Gesture::OpenHand => "open_hand",
        }
    }

    /// `None` for "none" and anything outside the alphabet.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim().to_ascii_lowercase().as_str() {
            "fist" => Some(Gesture::Fist),
            "peace" => Some(Gesture::Peace),
            "index" => Some(Gesture::Index),
            "open_hand" => Some(Gesture::OpenHand),
            _ => None,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading from the external detector feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureEvent {
    pub symbol: String,
}

impl GestureEvent {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn gesture(&self) -> Option<Gesture> {
        Gesture::parse(&self.symbol)
    }

    /// The detector saw no hand pose.
    pub fn is_idle(&self) -> bool {
        self.symbol.trim().eq_ignore_ascii_case("none")
    }
}

impl From<Gesture> for GestureEvent {
    fn from(gesture: Gesture) -> Self {
        Self::new(gesture.as_str())
    }
}
