//! Per-frame geometry signals for one hand
//!
//! Recomputed every frame by the geometry evaluator and discarded after
//! the detector consumes it.

use serde::{Deserialize, Serialize};

/// Raw signals extracted from one hand against one candidate ear
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandSample {
    /// Palm-normal dot hand-to-mouth direction, polarity-corrected
    pub dot_signed: f32,
    /// Vertical finger offset above the wrist (meters)
    pub dy_raw: f32,
    /// `dy_raw` normalized by forearm length, clamped to [0, 1.5]
    pub dy_norm: f32,
    /// Fingers passing the extension check (index/middle/ring/little)
    pub extended_fingers: u8,
}

impl HandSample {
    /// All-zero sample for an untracked hand
    pub fn zero() -> Self {
        Self {
            dot_signed: 0.0,
            dy_raw: 0.0,
            dy_norm: 0.0,
            extended_fingers: 0,
        }
    }
}
