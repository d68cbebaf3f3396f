//! Core engines for WhisperGate

pub mod api;
pub mod detector;
pub mod gate;
pub mod geometry;
pub mod journal;
pub mod relay;
pub mod room;
pub mod scenario;
pub mod stabilizer;

pub use api::{create_router, run_server};
pub use detector::DetectorEngine;
pub use gate::{AudioField, GatePool, GateSlotInfo, VoiceGate, VoiceRange};
pub use journal::{load_journal, save_journal, JournalEntry, JournalError, SessionJournal};
pub use relay::{AuthorityToken, SignalBus, WhisperRelay};
pub use room::Room;
pub use scenario::{Phase, ScenarioPlayer};
pub use stabilizer::ListenerStabilizer;
