//! Reason codes for detector decisions and state changes

use serde::{Deserialize, Serialize};

/// Reason codes annotating every detector output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // W001: Steady states
    // =========================================================================
    /// State is IDLE, no gesture held
    W001_STATE_IDLE,
    /// State is WHISPERING, gesture held
    W001_STATE_WHISPERING,

    // =========================================================================
    // W002: Transitions
    // =========================================================================
    /// Gesture passed the enter thresholds this frame
    W002_GESTURE_ENTER,
    /// Gesture fell out of the exit thresholds this frame
    W002_GESTURE_EXIT,

    // =========================================================================
    // W003: Failing checks (dominant failure while idle)
    // =========================================================================
    /// A hand-to-head distance is out of range
    W003_DISTANCE_OUT,
    /// Palm orientation or vertical offset out of band
    W003_ORIENT_OUT,
    /// Too few extended fingers
    W003_FINGERS_SHORT,
    /// No hand is being evaluated (manual selection pending)
    W003_NO_HAND,

    // =========================================================================
    // W004: Hysteresis
    // =========================================================================
    /// Enter thresholds would fail but the loosened exit band holds the state
    W004_HYSTERESIS_HOLD,

    // =========================================================================
    // W005: Overrides
    // =========================================================================
    /// Debug force holds the whisper on regardless of sensors
    W005_DEBUG_FORCED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::W001_STATE_IDLE => "W001_STATE_IDLE",
            Self::W001_STATE_WHISPERING => "W001_STATE_WHISPERING",
            Self::W002_GESTURE_ENTER => "W002_GESTURE_ENTER",
            Self::W002_GESTURE_EXIT => "W002_GESTURE_EXIT",
            Self::W003_DISTANCE_OUT => "W003_DISTANCE_OUT",
            Self::W003_ORIENT_OUT => "W003_ORIENT_OUT",
            Self::W003_FINGERS_SHORT => "W003_FINGERS_SHORT",
            Self::W003_NO_HAND => "W003_NO_HAND",
            Self::W004_HYSTERESIS_HOLD => "W004_HYSTERESIS_HOLD",
            Self::W005_DEBUG_FORCED => "W005_DEBUG_FORCED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::W001_STATE_IDLE => "Idle, no gesture",
            Self::W001_STATE_WHISPERING => "Whispering",
            Self::W002_GESTURE_ENTER => "Whisper gesture recognized",
            Self::W002_GESTURE_EXIT => "Whisper gesture released",
            Self::W003_DISTANCE_OUT => "Hand too far from an ear",
            Self::W003_ORIENT_OUT => "Palm not covering the mouth",
            Self::W003_FINGERS_SHORT => "Not enough extended fingers",
            Self::W003_NO_HAND => "No hand selected for evaluation",
            Self::W004_HYSTERESIS_HOLD => "Held by the loosened exit band",
            Self::W005_DEBUG_FORCED => "Debug force override",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
