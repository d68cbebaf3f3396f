//! WhisperGate: proximity-gated private whisper channel for shared spaces
//!
//! A participant cups a hand by their mouth next to another participant's
//! ear. The gesture detector flips that participant into the Whispering
//! state, the relay announces it to the session, each receiver decides
//! locally whether the whisper is meant for it, and a pooled voice gate
//! reshapes the speaker's audible range so only the chosen ear hears them.

pub mod core;
pub mod types;

// =============================================================================
// DETECTOR THRESHOLDS [C] - enter side
// =============================================================================

/// Hand-to-own-head distance to begin whispering (meters)
pub const SELF_EAR_THRESHOLD_M: f32 = 0.12;

/// Hand-to-other-head distance to begin whispering (meters)
pub const OTHER_EAR_THRESHOLD_M: f32 = 0.12;

/// Fixed orientation mode: palm dot band lower bound
pub const FIXED_DOT_MIN: f32 = 0.45;

/// Fixed orientation mode: palm dot band upper bound
pub const FIXED_DOT_MAX: f32 = 0.70;

/// Fixed orientation mode: raw vertical finger offset floor (meters)
pub const FIXED_DY_RAW_MIN_M: f32 = 0.09;

/// Mode-detection orientation: single palm dot floor
pub const COVER_DOT_SIGNED_THRESH: f32 = 0.35;

/// Mode-detection orientation: normalized vertical offset floor
pub const DY_NORM_THRESH: f32 = 0.75;

/// Extended fingers required to begin whispering
pub const MIN_EXTENDED_FINGERS_ENTER: u8 = 4;

// =============================================================================
// DETECTOR THRESHOLDS [C] - exit side (loosened, the hysteresis band)
// =============================================================================

/// Hand-to-own-head distance to keep whispering (meters)
pub const SELF_EAR_THRESHOLD_EXIT_M: f32 = 0.24;

/// Hand-to-other-head distance to keep whispering (meters)
pub const OTHER_EAR_THRESHOLD_EXIT_M: f32 = 0.24;

/// Exit palm dot band lower bound
pub const EXIT_DOT_MIN: f32 = 0.0;

/// Exit palm dot band upper bound
pub const EXIT_DOT_MAX: f32 = 1.0;

/// Extended fingers required to keep whispering
pub const MIN_EXTENDED_FINGERS_EXIT: u8 = 3;

// =============================================================================
// FINGER EXTENSION [C]
// =============================================================================

/// Bend angle at or under which a finger counts as extended (degrees)
pub const FINGER_CURL_THRESHOLD_DEG: f32 = 40.0;

/// Minimum finger segment length for a position-based bend check (meters)
pub const FINGER_MIN_SEGMENT_LEN_M: f32 = 0.01;

// =============================================================================
// GEOMETRY FALLBACKS [C]
// =============================================================================

/// Amplitude of the rotation-derived pseudo vertical offset (meters)
pub const PSEUDO_TARGET_AMPLITUDE_M: f32 = 0.12;

/// Up-dot treated as "pointing straight up" in the pseudo offset
pub const PSEUDO_DOT_AT_UP: f32 = 0.67;

/// Forearm length substituted when the real one is degenerate (meters)
pub const FOREARM_DEFAULT_LEN_M: f32 = 0.11;

/// Forearm lengths under this are treated as degenerate (meters)
pub const FOREARM_MIN_LEN_M: f32 = 0.07;

/// Clamp ceiling for the normalized vertical offset
pub const DY_NORM_CLAMP_MAX: f32 = 1.5;

/// Mouth sits this far below the head bone (meters)
pub const MOUTH_OFFSET_DOWN_M: f32 = 0.07;

/// Mouth sits this far in front of the head bone (meters)
pub const MOUTH_OFFSET_FORWARD_M: f32 = 0.10;

// =============================================================================
// HAND SELECTION [C]
// =============================================================================

/// Grip axis value treated as a press
pub const GRIP_PRESS_THRESHOLD: f32 = 0.8;

// =============================================================================
// RELAY [C]
// =============================================================================

/// Receiver accepts an Enter only inside this head-to-hand distance (meters)
pub const LISTENER_START_DISTANCE_M: f32 = 0.45;

/// Receiver drops a tracked speaker after this long without a signal (seconds)
pub const LISTENER_TIMEOUT_SEC: f32 = 1.6;

/// Receiver drops a tracked speaker past this head-to-head distance (meters)
pub const LISTENER_END_DISTANCE_M: f32 = 2.0;

/// Interval between Ping broadcasts while whispering (seconds)
pub const WHISPER_PING_INTERVAL_SEC: f32 = 0.5;

/// Redundant Enter re-send delay, covering authority handoff races (seconds)
pub const ENTER_ECHO_DELAY_SEC: f32 = 0.10;

/// Delay before the first Ping after an Enter (seconds)
pub const FIRST_PING_DELAY_SEC: f32 = 0.20;

/// Keepalive pings re-measure with the start distance scaled by this
pub const KEEPALIVE_RADIUS_SCALE: f32 = 1.25;

/// Distance substituted for an untracked hand (meters)
pub const INVALID_DISTANCE_M: f32 = 1e9;

// =============================================================================
// LISTENER STABILIZER [C]
// =============================================================================

/// near = min(dR, dL) at or under this is an on-candidate sample (meters)
pub const RECV_ENTER_DISTANCE_M: f32 = 0.40;

/// near at or over this is an off-candidate sample (meters)
pub const RECV_EXIT_DISTANCE_M: f32 = 0.50;

/// Consecutive same-direction samples needed to flip the receiving state
pub const CONFIRM_COUNT: u32 = 3;

/// Receiving drops after this long without any sample (seconds)
pub const PING_TIMEOUT_SEC: f32 = 1.5;

// =============================================================================
// VOICE GATE [C]
// =============================================================================

/// Whisper voice near distance (meters)
pub const WHISPER_NEAR_M: f32 = 0.0;

/// Whisper voice far distance - only the target is inside it (meters)
pub const WHISPER_FAR_M: f32 = 0.30;

/// Normal voice near distance (meters)
pub const NORMAL_NEAR_M: f32 = 0.0;

/// Normal voice far distance (meters)
pub const NORMAL_FAR_M: f32 = 25.0;

/// Re-apply period when per-frame re-apply is disabled (seconds)
pub const GATE_REAPPLY_INTERVAL_SEC: f32 = 0.25;

/// Default number of pooled gate slots
pub const DEFAULT_GATE_POOL_SIZE: usize = 4;

// =============================================================================
// ROOM CLOCK [C]
// =============================================================================

/// Default virtual frame step (seconds) - 72 Hz headset cadence
pub const DEFAULT_TICK_DT: f32 = 1.0 / 72.0;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";
