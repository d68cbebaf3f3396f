//! Core types for WhisperGate

pub mod math;

mod config;
mod events;
mod output;
mod pose;
mod reason;
mod roster;
mod sample;
mod state;

pub use config::{DetectorConfig, GateConfig, HandsMode, RelayConfig, RoomConfig, StabilizerConfig};
pub use events::{Audience, Envelope, ListenerEvent, SignalKind, TalkerEvent};
pub use math::{Axis, Quat, Vec3};
pub use output::DetectorOutput;
pub use pose::{FingerChain, GripState, HandPose, Handedness, HeadPose, PlayerPose};
pub use reason::ReasonCode;
pub use roster::{Participant, PlayerId, Roster, NO_PLAYER};
pub use sample::HandSample;
pub use state::WhisperState;
