//! Voice gate pool: per-speaker audio-range overrides
//!
//! Each slot binds one speaker (its authority holder) to one target ear.
//! Spatial audio distance parameters are what actually enforce privacy:
//! the target perceives the speaker at whisper range, everyone else
//! perceives a zero range, which is a mute. Slots re-assert their ranges
//! continuously so no other system overwriting the same parameters in the
//! same tick can win.

use serde::Serialize;

use crate::core::journal::SessionJournal;
use crate::types::{GateConfig, PlayerId, Roster, NO_PLAYER};

/// Near/far audio falloff distances for one speaker as heard by one
/// observer (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceRange {
    pub near: f32,
    pub far: f32,
}

impl VoiceRange {
    /// A zero range: effectively a mute
    pub const SILENT: VoiceRange = VoiceRange { near: 0.0, far: 0.0 };

    pub fn is_audible(&self) -> bool {
        self.far > 0.0
    }
}

/// Per-observer view of every speaker's audible range. The default for an
/// ungated speaker is the normal room range.
#[derive(Debug)]
pub struct AudioField {
    normal: VoiceRange,
    ranges: std::collections::HashMap<(PlayerId, PlayerId), VoiceRange>,
}

impl AudioField {
    pub fn new(cfg: &GateConfig) -> Self {
        Self {
            normal: VoiceRange {
                near: cfg.normal_near,
                far: cfg.normal_far,
            },
            ranges: std::collections::HashMap::new(),
        }
    }

    /// How `observer` currently hears `speaker`
    pub fn range(&self, speaker: PlayerId, observer: PlayerId) -> VoiceRange {
        self.ranges
            .get(&(speaker, observer))
            .copied()
            .unwrap_or(self.normal)
    }

    pub fn set(&mut self, speaker: PlayerId, observer: PlayerId, range: VoiceRange) {
        self.ranges.insert((speaker, observer), range);
    }

    /// Drop every entry mentioning a departed participant
    pub fn remove_player(&mut self, id: PlayerId) {
        self.ranges.retain(|(s, o), _| *s != id && *o != id);
    }
}

/// Debug introspection row for one slot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GateSlotInfo {
    pub index: usize,
    pub owner: PlayerId,
    pub target: PlayerId,
    pub gate_on: bool,
}

/// One pooled gate slot
#[derive(Debug)]
pub struct VoiceGate {
    index: usize,
    cfg: GateConfig,
    owner: PlayerId,
    target: PlayerId,
    gate_on: bool,
    next_reapply: f32,
}

impl VoiceGate {
    pub fn new(index: usize, cfg: GateConfig) -> Self {
        Self {
            index,
            cfg,
            owner: NO_PLAYER,
            target: NO_PLAYER,
            gate_on: false,
            next_reapply: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn target(&self) -> PlayerId {
        self.target
    }

    pub fn gate_on(&self) -> bool {
        self.gate_on
    }

    /// Authority transfer. Last writer wins, unconditionally.
    pub fn set_owner(&mut self, who: PlayerId) {
        self.owner = who;
    }

    /// Speaker API: start gating toward `target`
    pub fn owner_start(&mut self, owner: PlayerId, target: PlayerId) {
        self.owner = owner;
        self.target = target;
        self.gate_on = true;
    }

    /// Speaker API: retarget without toggling the gate
    pub fn owner_update_target(&mut self, owner: PlayerId, target: PlayerId) {
        self.owner = owner;
        self.target = target;
    }

    /// Speaker API: stop gating. Idempotent.
    pub fn owner_stop(&mut self, owner: PlayerId) {
        self.owner = owner;
        self.gate_on = false;
        self.target = NO_PLAYER;
    }

    /// A participant left the session: never keep aiming at them
    pub fn on_player_left(&mut self, id: PlayerId) {
        if self.target == id {
            self.target = NO_PLAYER;
        }
    }

    /// The owner's audible range from one observer's perspective, or None
    /// when the slot has no valid authority holder
    pub fn perceived_range(&self, observer: PlayerId, roster: &Roster) -> Option<VoiceRange> {
        roster.get(self.owner)?;

        if !self.gate_on {
            return Some(VoiceRange {
                near: self.cfg.normal_near,
                far: self.cfg.normal_far,
            });
        }

        let target_valid = roster.is_valid(self.target);
        if !target_valid {
            return Some(if self.cfg.mute_all_when_no_target {
                VoiceRange::SILENT
            } else {
                VoiceRange {
                    near: self.cfg.normal_near,
                    far: self.cfg.normal_far,
                }
            });
        }

        Some(if observer == self.target {
            VoiceRange {
                near: self.cfg.whisper_near,
                far: self.cfg.whisper_far,
            }
        } else {
            VoiceRange::SILENT
        })
    }

    /// Re-assert this slot's ranges into the audio field. Runs every frame
    /// or on the configured period, so same-tick overwrites lose.
    pub fn apply(&mut self, roster: &Roster, field: &mut AudioField, now: f32) {
        if !self.cfg.reapply_every_frame && now < self.next_reapply {
            return;
        }
        self.next_reapply = now + self.cfg.reapply_interval;

        for p in roster.iter() {
            if let Some(range) = self.perceived_range(p.id, roster) {
                field.set(self.owner, p.id, range);
            }
        }
    }

    pub fn info(&self) -> GateSlotInfo {
        GateSlotInfo {
            index: self.index,
            owner: self.owner,
            target: self.target,
            gate_on: self.gate_on,
        }
    }
}

/// Fixed pool of gate slots shared by the session
#[derive(Debug)]
pub struct GatePool {
    gates: Vec<VoiceGate>,
}

impl GatePool {
    pub fn new(size: usize, cfg: GateConfig) -> Self {
        Self {
            gates: (0..size).map(|i| VoiceGate::new(i, cfg.clone())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VoiceGate> {
        self.gates.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut VoiceGate> {
        self.gates.get_mut(index)
    }

    /// Slot currently owned by `speaker`, if any
    pub fn slot_owned_by(&self, speaker: PlayerId) -> Option<usize> {
        if speaker < 0 {
            return None;
        }
        self.gates.iter().position(|g| g.owner == speaker)
    }

    /// Grant a slot to a speaker. Policy, in order: reuse the slot the
    /// speaker already owns; claim the first slot with no valid owner;
    /// fall back to `|speaker| mod N`, taking authority regardless of the
    /// current holder (last writer wins on a collision).
    pub fn claim_for_speaker(
        &mut self,
        speaker: PlayerId,
        roster: &Roster,
        journal: &mut SessionJournal,
    ) -> Option<usize> {
        if self.gates.is_empty() || speaker < 0 {
            return None;
        }

        if let Some(idx) = self.slot_owned_by(speaker) {
            return Some(idx);
        }

        if let Some(idx) = self
            .gates
            .iter()
            .position(|g| !roster.is_valid(g.owner))
        {
            self.gates[idx].set_owner(speaker);
            journal.trace(speaker, "GATE", format!("claimed free slot {}", idx));
            return Some(idx);
        }

        let idx = speaker.unsigned_abs() as usize % self.gates.len();
        self.gates[idx].set_owner(speaker);
        journal.log(speaker, "GATE", format!("fallback steal of slot {}", idx));
        Some(idx)
    }

    pub fn on_player_left(&mut self, id: PlayerId) {
        for gate in &mut self.gates {
            gate.on_player_left(id);
        }
    }

    /// Re-assert every slot
    pub fn apply_all(&mut self, roster: &Roster, field: &mut AudioField, now: f32) {
        for gate in &mut self.gates {
            gate.apply(roster, field, now);
        }
    }

    /// Introspection rows for monitoring tools
    pub fn snapshot(&self) -> Vec<GateSlotInfo> {
        self.gates.iter().map(|g| g.info()).collect()
    }

    /// Multi-line HUD listing of every slot
    pub fn render_hud(&self, roster: &Roster, local: PlayerId) -> String {
        let mut s = String::from("Whisper Gates\n");
        for gate in &self.gates {
            let owner = roster.describe(gate.owner);
            let target = roster.describe(gate.target);
            let you = if gate.target == local && gate.gate_on && local >= 0 {
                " ←YOU"
            } else {
                ""
            };
            let safe = if gate.cfg.mute_all_when_no_target {
                "muteAll=ON"
            } else {
                "muteAll=OFF"
            };
            s.push_str(&format!(
                "{:02}: On={}  {}  Owner={}  Target={}{}\n",
                gate.index, gate.gate_on, safe, owner, target, you
            ));
        }
        s
    }
}

// =============================================================================
// TESTS
// =============================================================================
