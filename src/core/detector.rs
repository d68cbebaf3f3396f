//! Gesture detector: per-frame whisper decision with asymmetric
//! enter/exit thresholds
//!
//! State transitions:
//! - Idle -> Whispering: some evaluated hand passes ALL of distance
//!   (both ears), orientation and finger-count enter checks
//! - Whispering -> Idle: NO evaluated hand passes the loosened exit
//!   checks (the hysteresis band prevents flicker at the boundary)

use crate::core::geometry;
use crate::types::math::Vec3;
use crate::types::{
    DetectorConfig, DetectorOutput, HandSample, Handedness, HandsMode, PlayerId, ReasonCode,
    Roster, TalkerEvent, WhisperState,
};

/// Result of evaluating one hand against the current threshold set
#[derive(Debug, Clone, Copy)]
struct HandEval {
    ok: bool,
    dist_ok: bool,
    orient_ok: bool,
    fingers_ok: bool,
    dot_signed: f32,
    dy_raw: f32,
}

impl HandEval {
    fn failed() -> Self {
        Self {
            ok: false,
            dist_ok: false,
            orient_ok: false,
            fingers_ok: false,
            dot_signed: 0.0,
            dy_raw: 0.0,
        }
    }
}

/// Per-participant whisper gesture state machine
#[derive(Debug)]
pub struct DetectorEngine {
    cfg: DetectorConfig,
    /// The participant this detector runs for
    local: PlayerId,
    state: WhisperState,
    /// Manual grip-press hand restriction; None = evaluate per hands mode
    selected_hand: Option<Handedness>,
    prev_grip_right: bool,
    prev_grip_left: bool,
    debug_forced: bool,
    update_count: u64,
}

impl DetectorEngine {
    pub fn new(local: PlayerId, cfg: DetectorConfig) -> Self {
        Self {
            cfg,
            local,
            state: WhisperState::Idle,
            selected_hand: None,
            prev_grip_right: false,
            prev_grip_left: false,
            debug_forced: false,
            update_count: 0,
        }
    }

    pub fn state(&self) -> WhisperState {
        self.state
    }

    pub fn is_whispering(&self) -> bool {
        self.state == WhisperState::Whispering
    }

    pub fn selected_hand(&self) -> Option<Handedness> {
        self.selected_hand
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn debug_forced(&self) -> bool {
        self.debug_forced
    }

    /// Hold the state in Whispering regardless of sensor input
    pub fn set_debug_forced(&mut self, forced: bool) {
        self.debug_forced = forced;
    }

    /// Evaluate one frame and return the snapshot with any transitions
    pub fn update(&mut self, roster: &Roster, _now: f32) -> DetectorOutput {
        self.update_count += 1;

        let me = match roster.get(self.local) {
            Some(p) => p,
            None => {
                // A participant with no roster entry behaves as never
                // whispering; recover toward Idle
                let mut events = Vec::new();
                if self.state == WhisperState::Whispering {
                    self.state = WhisperState::Idle;
                    events.push(TalkerEvent::Exit);
                }
                return DetectorOutput::new(
                    self.state,
                    None,
                    false,
                    false,
                    false,
                    0.0,
                    0.0,
                    ReasonCode::W001_STATE_IDLE,
                    events,
                );
            }
        };

        if self.debug_forced {
            let mut events = Vec::new();
            if self.state != WhisperState::Whispering {
                self.state = WhisperState::Whispering;
                events.push(TalkerEvent::Enter);
            }
            events.push(TalkerEvent::Tick);
            return DetectorOutput::new(
                self.state,
                self.selected_hand,
                true,
                true,
                true,
                0.0,
                0.0,
                ReasonCode::W005_DEBUG_FORCED,
                events,
            );
        }

        // Hand selection
        let mut eval_right = self.cfg.active_hands != HandsMode::LeftOnly;
        let mut eval_left = self.cfg.active_hands != HandsMode::RightOnly;

        if self.cfg.enable_grip_switch && self.cfg.active_hands == HandsMode::Both && me.in_vr {
            let r_now = me.grips.right >= self.cfg.grip_press_threshold;
            let l_now = me.grips.left >= self.cfg.grip_press_threshold;
            let r_down = r_now && !self.prev_grip_right;
            let l_down = l_now && !self.prev_grip_left;
            self.prev_grip_right = r_now;
            self.prev_grip_left = l_now;

            if r_down && !l_down {
                self.selected_hand = Some(Handedness::Right);
            } else if l_down && !r_down {
                self.selected_hand = Some(Handedness::Left);
            } else if r_down && l_down {
                self.selected_hand = Some(Handedness::Right);
            }

            match self.selected_hand {
                Some(Handedness::Right) => {
                    eval_right = true;
                    eval_left = false;
                }
                Some(Handedness::Left) => {
                    eval_right = false;
                    eval_left = true;
                }
                None => {
                    eval_right = false;
                    eval_left = false;
                }
            }
        }

        let loosened = self.cfg.use_exit_loosened_thresholds && self.is_whispering();

        let r_eval = if eval_right {
            self.evaluate_hand(roster, Handedness::Right, loosened)
        } else {
            HandEval::failed()
        };
        let l_eval = if eval_left {
            self.evaluate_hand(roster, Handedness::Left, loosened)
        } else {
            HandEval::failed()
        };

        let any_whisper = r_eval.ok || l_eval.ok;

        // Representative hand for the breakdown: a passing one first, then
        // whichever side was evaluated alone
        let use_right = if r_eval.ok {
            true
        } else if l_eval.ok {
            false
        } else {
            eval_right && !eval_left
        };
        let shown = if use_right { r_eval } else { l_eval };
        let active_hand = if eval_right || eval_left {
            Some(if use_right {
                Handedness::Right
            } else {
                Handedness::Left
            })
        } else {
            None
        };

        // Transitions
        let mut events = Vec::new();
        let mut transition = None;
        if any_whisper && self.state == WhisperState::Idle {
            self.state = WhisperState::Whispering;
            events.push(TalkerEvent::Enter);
            transition = Some(ReasonCode::W002_GESTURE_ENTER);
        } else if !any_whisper && self.state == WhisperState::Whispering {
            self.state = WhisperState::Idle;
            events.push(TalkerEvent::Exit);
            transition = Some(ReasonCode::W002_GESTURE_EXIT);
        }
        if self.state == WhisperState::Whispering {
            events.push(TalkerEvent::Tick);
        }

        let reason = match transition {
            Some(r) => r,
            None => self.steady_reason(roster, loosened, any_whisper, use_right, &shown, eval_right || eval_left),
        };

        DetectorOutput::new(
            self.state,
            active_hand,
            shown.dist_ok,
            shown.orient_ok,
            shown.fingers_ok,
            shown.dot_signed,
            shown.dy_raw,
            reason,
            events,
        )
    }

    /// Reason for a frame with no transition
    fn steady_reason(
        &self,
        roster: &Roster,
        loosened: bool,
        any_whisper: bool,
        use_right: bool,
        shown: &HandEval,
        any_evaluated: bool,
    ) -> ReasonCode {
        if self.state == WhisperState::Whispering {
            // Whispering holds; report whether it only survives because of
            // the loosened exit band
            if loosened && any_whisper {
                let handedness = if use_right {
                    Handedness::Right
                } else {
                    Handedness::Left
                };
                let strict = self.evaluate_hand(roster, handedness, false);
                if !strict.ok {
                    return ReasonCode::W004_HYSTERESIS_HOLD;
                }
            }
            return ReasonCode::W001_STATE_WHISPERING;
        }

        if !any_evaluated {
            return ReasonCode::W003_NO_HAND;
        }
        if !shown.dist_ok {
            return ReasonCode::W003_DISTANCE_OUT;
        }
        if !shown.orient_ok {
            return ReasonCode::W003_ORIENT_OUT;
        }
        if !shown.fingers_ok {
            return ReasonCode::W003_FINGERS_SHORT;
        }
        ReasonCode::W001_STATE_IDLE
    }

    /// One hand against the enter or the loosened exit threshold set
    fn evaluate_hand(&self, roster: &Roster, handedness: Handedness, loosened: bool) -> HandEval {
        let me = match roster.get(self.local) {
            Some(p) => p,
            None => return HandEval::failed(),
        };
        let hand = me.pose.hand(handedness);
        let cfg = &self.cfg;

        let need = if loosened {
            cfg.min_extended_fingers_exit.max(1)
        } else {
            cfg.min_extended_fingers_enter.max(1)
        };
        let need = need.min(4);
        let count = geometry::extended_finger_count(hand, cfg);
        let fingers_ok = count >= need;

        // Own ear
        let self_sample = geometry::sample_hand(hand, handedness, &me.pose.head, cfg);
        let orient_self = self.orientation_pass(&self_sample, loosened);
        let self_thr = if loosened {
            cfg.self_ear_threshold_exit
        } else {
            cfg.self_ear_threshold
        };
        let dist_self = Vec3::distance(me.pose.head.position, hand.wrist) < self_thr;

        // Nearest other participant's ear
        let other = roster.nearest_other(self.local, hand.wrist);
        let (orient_other, other_sample, dist_other) = match other {
            Some((other_id, _)) => {
                let o = roster.get(other_id).expect("nearest id resolves");
                let sample = geometry::sample_hand(hand, handedness, &o.pose.head, cfg);
                let pass = self.orientation_pass(&sample, loosened);
                let thr = if loosened {
                    cfg.other_ear_threshold_exit
                } else {
                    cfg.other_ear_threshold
                };
                let dist = cfg.debug_pass_other_distance
                    || Vec3::distance(hand.wrist, o.pose.head.position) < thr;
                (pass, Some(sample), dist)
            }
            None => (false, None, cfg.debug_pass_other_distance),
        };

        let dist_ok = dist_self && dist_other;
        let orient_ok = orient_self || orient_other;

        // The displayed raw values follow whichever ear passed orientation
        let shown: HandSample = if orient_other {
            other_sample.unwrap_or(self_sample)
        } else {
            self_sample
        };

        HandEval {
            ok: dist_ok && orient_ok && fingers_ok,
            dist_ok,
            orient_ok,
            fingers_ok,
            dot_signed: shown.dot_signed,
            dy_raw: shown.dy_raw,
        }
    }

    /// Orientation policy: fixed dot band + raw vertical floor, or the
    /// mode-detection pair of normalized floors. The exit side widens only
    /// the dot band.
    fn orientation_pass(&self, sample: &HandSample, loosened: bool) -> bool {
        let cfg = &self.cfg;
        if !loosened {
            if !cfg.enable_mode_detection {
                let cover = sample.dot_signed >= cfg.fixed_dot_min
                    && sample.dot_signed <= cfg.fixed_dot_max;
                let vertical = sample.dy_raw >= cfg.fixed_dy_raw_min;
                cover && vertical
            } else {
                let cover = sample.dot_signed >= cfg.cover_dot_signed_thresh;
                let vertical = sample.dy_norm >= cfg.dy_norm_thresh;
                cover && vertical
            }
        } else {
            let cover =
                sample.dot_signed >= cfg.exit_dot_min && sample.dot_signed <= cfg.exit_dot_max;
            if !cfg.enable_mode_detection {
                cover && sample.dy_raw >= cfg.fixed_dy_raw_min
            } else {
                cover && sample.dy_norm >= cfg.dy_norm_thresh
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
