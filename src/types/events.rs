//! Event types flowing between detector, relay and listeners

use serde::{Deserialize, Serialize};

use crate::types::roster::PlayerId;

/// Discrete detector transitions, consumed by the relay and by FX/UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalkerEvent {
    /// Rising edge: the local participant started whispering
    Enter,
    /// Emitted every frame while whispering
    Tick,
    /// Falling edge: the local participant stopped whispering
    Exit,
}

/// Wire event kinds broadcast over the shared signaling object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Enter,
    Ping,
    Exit,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignalKind::Enter => "ENTER",
            SignalKind::Ping => "PING",
            SignalKind::Exit => "EXIT",
        };
        write!(f, "{}", name)
    }
}

/// Who a broadcast is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Every participant except the sender
    Others,
    /// Every participant including the sender (solo loopback)
    All,
}

/// One broadcast on the shared signaling object. The sender is implicit:
/// whoever held broadcast authority when the signal left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: SignalKind,
    pub sender: PlayerId,
    pub generation: u64,
    pub audience: Audience,
}

/// Samples a receiver forwards to its stabilizer and FX consumers after
/// locally measuring its head against the speaker's hands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerEvent {
    Enter { d_right: f32, d_left: f32 },
    Ping { d_right: f32, d_left: f32, keep_alive: bool },
    Exit,
}
