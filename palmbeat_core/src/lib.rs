//! Real-time core of a gesture rhythm game: note scheduling, hit judgment,
//! scoring and the session state machine.

pub mod config;
pub mod error;
pub mod events;
pub mod gameplay;
pub mod input;
pub mod time;

pub use config::SessionSettings;
pub use error::{ConfigError, SessionError};
pub use events::GameEvent;
pub use gameplay::session::{Session, SessionPhase, SessionState};
pub use input::events::{Gesture, GestureEvent};
pub use input::InputQueue;
pub use time::clock::{Clock, ManualClock, SystemClock};
