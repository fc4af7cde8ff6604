//! Shared building blocks for Pitchside: configuration, the top-level error
//! type, session-level domain events, and the small enums both the chat
//! engine and its host surfaces speak.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::{BusyPolicy, ChatConfig, GeneralConfig, PitchsideConfig, RuleConfig};
pub use error::{PitchsideError, Result};
pub use events::ChatEvent;
pub use types::*;
