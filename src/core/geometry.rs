//! Geometry evaluator: raw gesture signals from tracked hand joints
//!
//! Everything here is per-frame and stateless. Missing joints (the exact
//! zero sentinel) never error; each signal falls back to a coarser
//! rotation-based estimate or fails its sub-check closed.

use crate::types::math::Vec3;
use crate::types::{DetectorConfig, FingerChain, HandPose, HandSample, Handedness, HeadPose};

/// Reconstruct the palm normal from the index/little/middle proximal
/// joints and the wrist. Falls back to a fixed hand-local axis rotated by
/// the hand orientation when any source joint is degenerate.
pub fn palm_normal(hand: &HandPose, handedness: Handedness, cfg: &DetectorConfig) -> Vec3 {
    if !cfg.use_palm_normal_from_fingers {
        return palm_normal_fallback(hand, cfg);
    }

    let wrist = hand.wrist;
    let idx_p = hand.index.proximal;
    let lit_p = hand.little.proximal;
    let mid_p = hand.middle.proximal;

    if wrist.is_zero() || idx_p.is_zero() || lit_p.is_zero() || mid_p.is_zero() {
        return palm_normal_fallback(hand, cfg);
    }

    // Across-palm runs knuckle to knuckle; mirrored for the left hand so
    // the normal leaves the palm side on both.
    let across = match handedness {
        Handedness::Right => idx_p - lit_p,
        Handedness::Left => lit_p - idx_p,
    };
    let up_palm = mid_p - wrist;
    if across.length_sq() < 1e-6 || up_palm.length_sq() < 1e-6 {
        return palm_normal_fallback(hand, cfg);
    }

    let n = across.normalized().cross(up_palm.normalized());
    if n.length_sq() < 1e-6 {
        return palm_normal_fallback(hand, cfg);
    }
    n.normalized()
}

fn palm_normal_fallback(hand: &HandPose, cfg: &DetectorConfig) -> Vec3 {
    let n = hand.rotation.rotate(cfg.palm_axis.unit());
    if n.length_sq() < 1e-6 {
        Vec3::FORWARD
    } else {
        n.normalized()
    }
}

/// First valid fingertip, tried in fixed priority order. Valid means
/// tracked (nonzero) and not collapsed onto the wrist.
pub fn valid_finger_tip(hand: &HandPose) -> Option<Vec3> {
    let wrist = hand.wrist;
    let candidates = [
        hand.middle.distal,
        hand.index.distal,
        hand.middle.intermediate,
        hand.index.intermediate,
    ];
    candidates
        .into_iter()
        .find(|tip| !tip.is_zero() && (*tip - wrist).length_sq() > 1e-5)
}

/// Vertical finger offset above the wrist (meters).
///
/// Priority: a valid fingertip, then the middle-proximal direction, then a
/// pseudo offset derived from the hand rotation.
pub fn vertical_offset(hand: &HandPose, cfg: &DetectorConfig) -> f32 {
    let wrist = hand.wrist;

    if let Some(tip) = valid_finger_tip(hand) {
        return tip.y - wrist.y;
    }

    if !cfg.use_rotation_fallback_for_vertical {
        return 0.0;
    }

    let mid_p = hand.middle.proximal;
    if !mid_p.is_zero() {
        let finger_dir = (mid_p - wrist).normalized();
        let up_dot = finger_dir.dot(Vec3::UP);
        let norm = if cfg.pseudo_dot_at_up > 0.01 {
            (up_dot / cfg.pseudo_dot_at_up).clamp(-1.0, 1.0)
        } else {
            up_dot
        };
        return norm * cfg.pseudo_target_amplitude;
    }

    let finger_dir = hand.rotation.rotate(cfg.finger_axis.unit()).normalized();
    let up_dot = finger_dir.dot(Vec3::UP);
    let norm = if cfg.pseudo_dot_at_up > 0.01 {
        (up_dot / cfg.pseudo_dot_at_up).clamp(-1.0, 1.0)
    } else {
        up_dot
    };
    norm * cfg.pseudo_target_amplitude * cfg.pseudo_dy_sign
}

/// Vertical offset normalized by forearm length and clamped to [0, 1.5]
pub fn normalized_vertical_offset(dy_raw: f32, hand: &HandPose) -> f32 {
    let wrist = hand.wrist;
    let forearm = hand.forearm;
    let mut ref_len = if !wrist.is_zero() && !forearm.is_zero() {
        Vec3::distance(wrist, forearm)
    } else {
        crate::FOREARM_DEFAULT_LEN_M
    };
    if ref_len < crate::FOREARM_MIN_LEN_M {
        ref_len = crate::FOREARM_DEFAULT_LEN_M;
    }
    (dy_raw / ref_len).clamp(0.0, crate::DY_NORM_CLAMP_MAX)
}

/// Position-based extension check for one finger: the bend angle between
/// the proximal->intermediate and intermediate->distal segments must stay
/// at or under the curl threshold, and both segments must be long enough
/// to be real. Rotation fallback is optional and off by default.
pub fn finger_extended(chain: &FingerChain, cfg: &DetectorConfig) -> bool {
    let th = cfg.finger_curl_threshold_deg.clamp(1.0, 90.0);
    let min_len_sq = cfg.finger_min_segment_len * cfg.finger_min_segment_len;

    let p0 = chain.proximal;
    let p1 = chain.intermediate;
    let p2 = chain.distal;

    let seg_ok = !p0.is_zero()
        && !p1.is_zero()
        && !p2.is_zero()
        && (p1 - p0).length_sq() >= min_len_sq
        && (p2 - p1).length_sq() >= min_len_sq;

    if seg_ok {
        let bend = Vec3::angle_deg(p1 - p0, p2 - p1);
        return bend <= th;
    }

    if !cfg.finger_use_rotation_fallback {
        return false;
    }

    let f0 = chain.proximal_rot.rotate(Vec3::FORWARD);
    let f1 = chain.distal_rot.rotate(Vec3::FORWARD);
    if f0.length_sq() < 1e-6 || f1.length_sq() < 1e-6 {
        return false;
    }
    Vec3::angle_deg(f0, f1) <= th
}

/// Count of extended fingers among index/middle/ring/little
pub fn extended_finger_count(hand: &HandPose, cfg: &DetectorConfig) -> u8 {
    let mut count = 0;
    for chain in [&hand.index, &hand.middle, &hand.ring, &hand.little] {
        if finger_extended(chain, cfg) {
            count += 1;
        }
    }
    count
}

/// Evaluate one hand against one candidate ear and collect all raw signals
pub fn sample_hand(
    hand: &HandPose,
    handedness: Handedness,
    target_head: &HeadPose,
    cfg: &DetectorConfig,
) -> HandSample {
    let mouth = target_head.mouth_position();
    let hand_to_mouth = (mouth - hand.wrist).normalized();

    let normal = palm_normal(hand, handedness, cfg);
    let sign = if cfg.palm_dot_sign >= 0.0 { 1.0 } else { -1.0 };
    let dot_signed = sign * normal.dot(hand_to_mouth);

    let dy_raw = vertical_offset(hand, cfg);
    let dy_norm = normalized_vertical_offset(dy_raw, hand);
    let extended_fingers = extended_finger_count(hand, cfg);

    HandSample {
        dot_signed,
        dy_raw,
        dy_norm,
        extended_fingers,
    }
}

// =============================================================================
// TESTS
// =============================================================================
