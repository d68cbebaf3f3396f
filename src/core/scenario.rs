//! Deterministic pose scripts for the demo, the API and the tests
//!
//! The builders construct tracked poses that pass or fail the detector's
//! default thresholds by known margins, so every scripted frame is
//! reproducible.

use crate::core::room::Room;
use crate::types::math::Vec3;
use crate::types::{FingerChain, HandPose, Handedness, HeadPose, PlayerId, PlayerPose};

/// Direction from the whisper wrist to the target mouth. The z component
/// is what the palm dot measures: 0.6 sits inside the default enter band.
const WRIST_TO_MOUTH_DIR: Vec3 = Vec3::new(0.8, 0.0, 0.6);

/// Wrist-to-mouth reach (meters)
const WRIST_TO_MOUTH_LEN: f32 = 0.10;

/// A hand cupped beside the mouth: fingers straight up, palm facing +z
pub fn cupped_hand(wrist: Vec3, handedness: Handedness) -> HandPose {
    // Knuckle order mirrors between hands so the reconstructed palm
    // normal faces +z on both
    let side = match handedness {
        Handedness::Right => 1.0,
        Handedness::Left => -1.0,
    };
    let chain = |bx: f32| FingerChain {
        proximal: wrist + Vec3::new(bx, 0.03, 0.0),
        intermediate: wrist + Vec3::new(bx, 0.06, 0.0),
        distal: wrist + Vec3::new(bx, 0.10, 0.0),
        ..Default::default()
    };
    HandPose {
        wrist,
        forearm: wrist + Vec3::new(0.0, -0.25, 0.0),
        index: chain(side * 0.02),
        middle: chain(0.0),
        ring: chain(side * -0.01),
        little: chain(side * -0.02),
        ..Default::default()
    }
}

/// A hand hanging at rest: fingers straight down, far from any ear
pub fn lowered_hand(wrist: Vec3) -> HandPose {
    let chain = |bx: f32| FingerChain {
        proximal: wrist + Vec3::new(bx, -0.03, 0.0),
        intermediate: wrist + Vec3::new(bx, -0.06, 0.0),
        distal: wrist + Vec3::new(bx, -0.10, 0.0),
        ..Default::default()
    };
    HandPose {
        wrist,
        forearm: wrist + Vec3::new(0.0, 0.25, 0.0),
        index: chain(0.02),
        middle: chain(0.0),
        ring: chain(-0.01),
        little: chain(-0.02),
        ..Default::default()
    }
}

/// Curl one finger past the extension threshold without untracking it
pub fn curl_finger(chain: &mut FingerChain) {
    // Bend the distal segment 90 degrees off the proximal one
    chain.distal = chain.intermediate + Vec3::new(0.0, 0.0, -0.04);
}

/// A participant standing at rest with both hands down
pub fn idle_pose(head: Vec3) -> PlayerPose {
    PlayerPose {
        head: HeadPose {
            position: head,
            ..Default::default()
        },
        right_hand: lowered_hand(head + Vec3::new(0.25, -0.7, 0.0)),
        left_hand: lowered_hand(head + Vec3::new(-0.25, -0.7, 0.0)),
    }
}

/// A speaker leaning in to whisper at the given listener head: right hand
/// cupped between both mouths, every default enter check passing.
pub fn whispering_speaker(listener_head: Vec3) -> PlayerPose {
    let listener = HeadPose {
        position: listener_head,
        ..Default::default()
    };
    let mouth = listener.mouth_position();
    let wrist = mouth - WRIST_TO_MOUTH_DIR * WRIST_TO_MOUTH_LEN;

    let head = wrist + Vec3::new(0.0, 0.08, -0.05);
    PlayerPose {
        head: HeadPose {
            position: head,
            ..Default::default()
        },
        right_hand: cupped_hand(wrist, Handedness::Right),
        left_hand: lowered_hand(head + Vec3::new(-0.25, -0.7, 0.0)),
    }
}

/// Script phases for the built-in demo choreography
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Speaker stands away from the listener
    Apart { frames: u32 },
    /// Speaker leans in and holds the whisper gesture
    Whisper { frames: u32 },
    /// Speaker steps back again
    Withdraw { frames: u32 },
}

impl Phase {
    fn frames(&self) -> u32 {
        match self {
            Phase::Apart { frames } | Phase::Whisper { frames } | Phase::Withdraw { frames } => {
                *frames
            }
        }
    }
}

/// Plays a phase script into a room, one frame per step
#[derive(Debug)]
pub struct ScenarioPlayer {
    speaker: PlayerId,
    listener: PlayerId,
    bystanders: Vec<PlayerId>,
    listener_head: Vec3,
    phases: Vec<Phase>,
    cursor: usize,
    frame_in_phase: u32,
}

impl ScenarioPlayer {
    /// The standard demo: stand apart, whisper for two seconds, withdraw
    pub fn demo(speaker: PlayerId, listener: PlayerId) -> Self {
        Self::new(
            speaker,
            listener,
            Vec::new(),
            vec![
                Phase::Apart { frames: 36 },
                Phase::Whisper { frames: 144 },
                Phase::Withdraw { frames: 144 },
            ],
        )
    }

    pub fn new(
        speaker: PlayerId,
        listener: PlayerId,
        bystanders: Vec<PlayerId>,
        phases: Vec<Phase>,
    ) -> Self {
        Self {
            speaker,
            listener,
            bystanders,
            listener_head: Vec3::new(0.0, 1.65, 0.0),
            phases,
            cursor: 0,
            frame_in_phase: 0,
        }
    }

    pub fn speaker(&self) -> PlayerId {
        self.speaker
    }

    pub fn listener(&self) -> PlayerId {
        self.listener
    }

    /// All scripted frames consumed; stepping further just idles the room
    pub fn done(&self) -> bool {
        self.cursor >= self.phases.len()
    }

    /// Pose every scripted participant for the current phase, then tick
    pub fn step(&mut self, room: &mut Room) {
        let phase = self.phases.get(self.cursor).copied();

        let speaker_pose = match phase {
            Some(Phase::Whisper { .. }) => whispering_speaker(self.listener_head),
            _ => idle_pose(Vec3::new(-1.5, 1.65, 0.0)),
        };
        room.set_pose(self.speaker, speaker_pose);
        room.set_pose(self.listener, idle_pose(self.listener_head));
        for (i, id) in self.bystanders.iter().enumerate() {
            let x = 2.0 + 0.8 * i as f32;
            room.set_pose(*id, idle_pose(Vec3::new(x, 1.65, 1.0)));
        }

        room.tick();

        if phase.is_some() {
            self.frame_in_phase += 1;
            if self.frame_in_phase >= self.phases[self.cursor].frames() {
                self.cursor += 1;
                self.frame_in_phase = 0;
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
