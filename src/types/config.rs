//! Static configuration consumed by the engines
//!
//! Tuned defaults live as constants in the crate root; these structs exist
//! so a deployment can load overrides once at session start. Nothing
//! mutates them afterwards.

use serde::{Deserialize, Serialize};

use crate::types::math::Axis;
use crate::*;

/// Which hands the detector evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandsMode {
    RightOnly,
    LeftOnly,
    Both,
}

impl Default for HandsMode {
    fn default() -> Self {
        HandsMode::Both
    }
}

/// Gesture detector thresholds and switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    // distances
    pub self_ear_threshold: f32,
    pub other_ear_threshold: f32,
    pub self_ear_threshold_exit: f32,
    pub other_ear_threshold_exit: f32,
    pub use_exit_loosened_thresholds: bool,
    /// Solo debugging: treat the other-participant distance as passing
    pub debug_pass_other_distance: bool,

    // orientation
    pub use_palm_normal_from_fingers: bool,
    pub palm_axis: Axis,
    pub palm_dot_sign: f32,
    pub enable_mode_detection: bool,
    pub cover_dot_signed_thresh: f32,
    pub dy_norm_thresh: f32,
    pub fixed_dot_min: f32,
    pub fixed_dot_max: f32,
    pub fixed_dy_raw_min: f32,
    pub exit_dot_min: f32,
    pub exit_dot_max: f32,

    // vertical offset fallback
    pub use_rotation_fallback_for_vertical: bool,
    pub finger_axis: Axis,
    pub pseudo_target_amplitude: f32,
    pub pseudo_dot_at_up: f32,
    pub pseudo_dy_sign: f32,

    // finger extension
    pub finger_curl_threshold_deg: f32,
    pub min_extended_fingers_enter: u8,
    pub min_extended_fingers_exit: u8,
    pub finger_min_segment_len: f32,
    pub finger_use_rotation_fallback: bool,

    // hand selection
    pub active_hands: HandsMode,
    pub enable_grip_switch: bool,
    pub grip_press_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            self_ear_threshold: SELF_EAR_THRESHOLD_M,
            other_ear_threshold: OTHER_EAR_THRESHOLD_M,
            self_ear_threshold_exit: SELF_EAR_THRESHOLD_EXIT_M,
            other_ear_threshold_exit: OTHER_EAR_THRESHOLD_EXIT_M,
            use_exit_loosened_thresholds: true,
            debug_pass_other_distance: false,

            use_palm_normal_from_fingers: true,
            palm_axis: Axis::Forward,
            palm_dot_sign: 1.0,
            enable_mode_detection: false,
            cover_dot_signed_thresh: COVER_DOT_SIGNED_THRESH,
            dy_norm_thresh: DY_NORM_THRESH,
            fixed_dot_min: FIXED_DOT_MIN,
            fixed_dot_max: FIXED_DOT_MAX,
            fixed_dy_raw_min: FIXED_DY_RAW_MIN_M,
            exit_dot_min: EXIT_DOT_MIN,
            exit_dot_max: EXIT_DOT_MAX,

            use_rotation_fallback_for_vertical: true,
            finger_axis: Axis::Up,
            pseudo_target_amplitude: PSEUDO_TARGET_AMPLITUDE_M,
            pseudo_dot_at_up: PSEUDO_DOT_AT_UP,
            pseudo_dy_sign: 1.0,

            finger_curl_threshold_deg: FINGER_CURL_THRESHOLD_DEG,
            min_extended_fingers_enter: MIN_EXTENDED_FINGERS_ENTER,
            min_extended_fingers_exit: MIN_EXTENDED_FINGERS_EXIT,
            finger_min_segment_len: FINGER_MIN_SEGMENT_LEN_M,
            finger_use_rotation_fallback: false,

            active_hands: HandsMode::Both,
            enable_grip_switch: true,
            grip_press_threshold: GRIP_PRESS_THRESHOLD,
        }
    }
}

/// Signal protocol timing and distance gates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub listener_start_distance: f32,
    pub listener_timeout: f32,
    pub listener_end_distance: f32,
    pub ping_interval: f32,
    pub enter_echo_delay: f32,
    pub first_ping_delay: f32,
    pub keepalive_radius_scale: f32,
    /// When alone in the session, address broadcasts to everyone
    /// (including self) so the receive path can be exercised solo
    pub loopback_in_solo: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listener_start_distance: LISTENER_START_DISTANCE_M,
            listener_timeout: LISTENER_TIMEOUT_SEC,
            listener_end_distance: LISTENER_END_DISTANCE_M,
            ping_interval: WHISPER_PING_INTERVAL_SEC,
            enter_echo_delay: ENTER_ECHO_DELAY_SEC,
            first_ping_delay: FIRST_PING_DELAY_SEC,
            keepalive_radius_scale: KEEPALIVE_RADIUS_SCALE,
            loopback_in_solo: true,
        }
    }
}

/// Listener stabilizer debounce parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub enter_distance: f32,
    pub exit_distance: f32,
    pub confirm_count: u32,
    pub ping_timeout_sec: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            enter_distance: RECV_ENTER_DISTANCE_M,
            exit_distance: RECV_EXIT_DISTANCE_M,
            confirm_count: CONFIRM_COUNT,
            ping_timeout_sec: PING_TIMEOUT_SEC,
        }
    }
}

/// Voice gate ranges and re-apply behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub whisper_near: f32,
    pub whisper_far: f32,
    pub normal_near: f32,
    pub normal_far: f32,
    /// true: mute the speaker for everyone when the target is gone;
    /// false: restore the normal range instead
    pub mute_all_when_no_target: bool,
    pub reapply_every_frame: bool,
    pub reapply_interval: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            whisper_near: WHISPER_NEAR_M,
            whisper_far: WHISPER_FAR_M,
            normal_near: NORMAL_NEAR_M,
            normal_far: NORMAL_FAR_M,
            mute_all_when_no_target: true,
            reapply_every_frame: true,
            reapply_interval: GATE_REAPPLY_INTERVAL_SEC,
        }
    }
}

/// Everything a simulated room needs at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub detector: DetectorConfig,
    pub relay: RelayConfig,
    pub stabilizer: StabilizerConfig,
    pub gate: GateConfig,
    pub gate_pool_size: usize,
    pub tick_dt: f32,
    pub journal_verbose: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            relay: RelayConfig::default(),
            stabilizer: StabilizerConfig::default(),
            gate: GateConfig::default(),
            gate_pool_size: DEFAULT_GATE_POOL_SIZE,
            tick_dt: DEFAULT_TICK_DT,
            journal_verbose: true,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_thresholds_stricter_than_exit() {
        let cfg = DetectorConfig::default();
        assert!(cfg.self_ear_threshold < cfg.self_ear_threshold_exit);
        assert!(cfg.other_ear_threshold < cfg.other_ear_threshold_exit);
        assert!(cfg.min_extended_fingers_exit < cfg.min_extended_fingers_enter);
        assert!(cfg.exit_dot_min <= cfg.fixed_dot_min);
        assert!(cfg.exit_dot_max >= cfg.fixed_dot_max);
    }

    #[test]
    fn test_stabilizer_dead_zone_exists() {
        let cfg = StabilizerConfig::default();
        assert!(cfg.enter_distance < cfg.exit_distance);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let cfg = RoomConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: RoomConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gate_pool_size, cfg.gate_pool_size);
        assert_eq!(back.stabilizer.confirm_count, cfg.stabilizer.confirm_count);
    }
}
