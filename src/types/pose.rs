//! Tracked skeletal input for one participant
//!
//! Joints follow the tracker convention that an untracked bone reports the
//! exact zero vector; every consumer treats zero as "missing" and falls
//! back rather than erroring.

use serde::{Deserialize, Serialize};

use crate::types::math::{Quat, Vec3};
use crate::{MOUTH_OFFSET_DOWN_M, MOUTH_OFFSET_FORWARD_M};

/// Which hand a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Right,
    Left,
}

impl Handedness {
    pub fn label(&self) -> &'static str {
        match self {
            Handedness::Right => "R",
            Handedness::Left => "L",
        }
    }
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handedness::Right => write!(f, "Right"),
            Handedness::Left => write!(f, "Left"),
        }
    }
}

/// Three tracked joints of one finger plus the rotations used as fallback
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FingerChain {
    pub proximal: Vec3,
    pub intermediate: Vec3,
    pub distal: Vec3,
    #[serde(default)]
    pub proximal_rot: Quat,
    #[serde(default)]
    pub distal_rot: Quat,
}

/// One tracked hand: wrist, forearm reference and four finger chains
/// (the thumb takes no part in the whisper gesture)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HandPose {
    pub wrist: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    pub forearm: Vec3,
    pub index: FingerChain,
    pub middle: FingerChain,
    pub ring: FingerChain,
    pub little: FingerChain,
}

/// Tracked head bone
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
}

impl HeadPose {
    /// Estimated mouth position: a fixed offset below and in front of the
    /// head bone, rotated with it
    pub fn mouth_position(&self) -> Vec3 {
        let local = Vec3::new(0.0, -MOUTH_OFFSET_DOWN_M, MOUTH_OFFSET_FORWARD_M);
        self.position + self.rotation.rotate(local)
    }
}

/// Everything the evaluators read about one participant's body
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerPose {
    pub head: HeadPose,
    pub right_hand: HandPose,
    pub left_hand: HandPose,
}

impl PlayerPose {
    pub fn hand(&self, handedness: Handedness) -> &HandPose {
        match handedness {
            Handedness::Right => &self.right_hand,
            Handedness::Left => &self.left_hand,
        }
    }
}

/// Raw controller grip axes, 0.0 released to 1.0 pressed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GripState {
    pub right: f32,
    pub left: f32,
}
