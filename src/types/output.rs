//! Detector output snapshot for FX, logging and terminal display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Handedness, ReasonCode, TalkerEvent, WhisperState};

/// Read-only snapshot produced by every detector update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Current state after this frame
    pub state: WhisperState,
    /// Representative hand shown in the breakdown, if any was evaluated
    pub active_hand: Option<Handedness>,
    /// Both ear distances in range for the representative hand
    pub dist_ok: bool,
    /// Orientation band passed for the representative hand
    pub orient_ok: bool,
    /// Extended-finger requirement met for the representative hand
    pub fingers_ok: bool,
    /// Raw signed palm dot of the representative hand
    pub dot_signed: f32,
    /// Raw vertical offset of the representative hand (meters)
    pub dy_raw: f32,
    /// Reason for the current state
    pub reason: ReasonCode,
    /// Transitions and ticks emitted this frame
    pub events: Vec<TalkerEvent>,
}

impl DetectorOutput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: WhisperState,
        active_hand: Option<Handedness>,
        dist_ok: bool,
        orient_ok: bool,
        fingers_ok: bool,
        dot_signed: f32,
        dy_raw: f32,
        reason: ReasonCode,
        events: Vec<TalkerEvent>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            state,
            active_hand,
            dist_ok,
            orient_ok,
            fingers_ok,
            dot_signed,
            dy_raw,
            reason,
            events,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.state.color_code();
        let reset = WhisperState::color_reset();
        let emoji = self.state.emoji();
        let hand = self
            .active_hand
            .map(|h| h.label())
            .unwrap_or("-");

        format!(
            "{}{} state={} | hand={} | dist={} orient={} fingers={} | dot={:.2} dy={:.2}m | {}{}",
            color,
            emoji,
            self.state,
            hand,
            yn(self.dist_ok),
            yn(self.orient_ok),
            yn(self.fingers_ok),
            self.dot_signed,
            self.dy_raw,
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        let hand = self
            .active_hand
            .map(|h| h.label())
            .unwrap_or("-");
        format!(
            "state={} | hand={} | dist={} orient={} fingers={} | dot={:.2} dy={:.2} | reason={}",
            self.state,
            hand,
            yn(self.dist_ok),
            yn(self.orient_ok),
            yn(self.fingers_ok),
            self.dot_signed,
            self.dy_raw,
            self.reason.code()
        )
    }
}

fn yn(ok: bool) -> &'static str {
    if ok {
        "Yes"
    } else {
        "No"
    }
}
