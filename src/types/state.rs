//! Whisper state definitions

use serde::{Deserialize, Serialize};

/// The two states of the local gesture detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WhisperState {
    /// Normal voice, no whisper gesture held
    Idle,
    /// Whisper gesture held, voice gated to the target ear
    Whispering,
}

impl WhisperState {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            WhisperState::Idle => "\x1b[90m",       // Gray
            WhisperState::Whispering => "\x1b[35m", // Magenta
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            WhisperState::Idle => "🔈",
            WhisperState::Whispering => "🤫",
        }
    }
}

impl std::fmt::Display for WhisperState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WhisperState::Idle => "IDLE",
            WhisperState::Whispering => "WHISPERING",
        };
        write!(f, "{}", name)
    }
}
