//! Room harness: N participants on one fixed-tick virtual clock
//!
//! Every frame runs, in order: gesture detection per participant, protocol
//! emission, signal delivery, relay and stabilizer maintenance, then gate
//! re-application. A state change is therefore visible to dependent
//! systems within the frame it occurs; across participants the bus
//! delivers asynchronously and nothing orders one client against another.

use std::collections::BTreeMap;

use crate::core::detector::DetectorEngine;
use crate::core::gate::{AudioField, GatePool, GateSlotInfo, VoiceRange};
use crate::core::journal::SessionJournal;
use crate::core::relay::{SignalBus, WhisperRelay};
use crate::core::stabilizer::ListenerStabilizer;
use crate::types::{
    Audience, DetectorOutput, PlayerId, PlayerPose, RoomConfig, Roster, TalkerEvent, NO_PLAYER,
};

/// The engines one participant runs locally
#[derive(Debug)]
struct Client {
    detector: DetectorEngine,
    relay: WhisperRelay,
    stabilizer: ListenerStabilizer,
}

/// A shared space full of participants, advanced one frame at a time
#[derive(Debug)]
pub struct Room {
    cfg: RoomConfig,
    frame: u64,
    now: f32,
    roster: Roster,
    bus: SignalBus,
    clients: BTreeMap<PlayerId, Client>,
    pool: GatePool,
    audio: AudioField,
    journal: SessionJournal,
    last_outputs: BTreeMap<PlayerId, DetectorOutput>,
}

impl Room {
    pub fn new(cfg: RoomConfig) -> Self {
        let journal = SessionJournal::new(cfg.journal_verbose);
        let pool = GatePool::new(cfg.gate_pool_size, cfg.gate.clone());
        let audio = AudioField::new(&cfg.gate);
        Self {
            cfg,
            frame: 0,
            now: 0.0,
            roster: Roster::new(),
            bus: SignalBus::new(),
            clients: BTreeMap::new(),
            pool,
            audio,
            journal,
            last_outputs: BTreeMap::new(),
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Virtual room time in seconds
    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn journal(&self) -> &SessionJournal {
        &self.journal
    }

    pub fn audio(&self) -> &AudioField {
        &self.audio
    }

    pub fn gate_snapshot(&self) -> Vec<GateSlotInfo> {
        self.pool.snapshot()
    }

    pub fn render_gate_hud(&self, local: PlayerId) -> String {
        self.pool.render_hud(&self.roster, local)
    }

    /// Add a participant with a full local engine set
    pub fn join(&mut self, display_name: impl Into<String>) -> PlayerId {
        let id = self.roster.join(display_name);
        self.clients.insert(
            id,
            Client {
                detector: DetectorEngine::new(id, self.cfg.detector.clone()),
                relay: WhisperRelay::new(id, self.cfg.relay.clone()),
                stabilizer: ListenerStabilizer::new(id, self.cfg.stabilizer.clone()),
            },
        );
        self.journal.log(id, "JOIN", "joined session");
        id
    }

    /// Remove a participant; stale references elsewhere expire through
    /// timeouts and validity checks
    pub fn leave(&mut self, id: PlayerId) {
        self.roster.leave(id);
        self.clients.remove(&id);
        self.pool.on_player_left(id);
        self.audio.remove_player(id);
        self.last_outputs.remove(&id);
        self.journal.log(id, "LEAVE", "left session");
    }

    pub fn set_pose(&mut self, id: PlayerId, pose: PlayerPose) {
        if let Some(p) = self.roster.get_mut(id) {
            p.pose = pose;
        }
    }

    pub fn set_grips(&mut self, id: PlayerId, right: f32, left: f32) {
        if let Some(p) = self.roster.get_mut(id) {
            p.grips.right = right;
            p.grips.left = left;
        }
    }

    pub fn set_in_vr(&mut self, id: PlayerId, in_vr: bool) {
        if let Some(p) = self.roster.get_mut(id) {
            p.in_vr = in_vr;
        }
    }

    /// Hold a participant's detector in Whispering regardless of sensors
    pub fn set_debug_forced(&mut self, id: PlayerId, forced: bool) {
        if let Some(c) = self.clients.get_mut(&id) {
            c.detector.set_debug_forced(forced);
        }
    }

    pub fn is_whispering(&self, id: PlayerId) -> bool {
        self.clients
            .get(&id)
            .map(|c| c.detector.is_whispering())
            .unwrap_or(false)
    }

    pub fn is_receiving(&self, id: PlayerId) -> bool {
        self.clients
            .get(&id)
            .map(|c| c.stabilizer.is_receiving())
            .unwrap_or(false)
    }

    pub fn receive_status(&self, id: PlayerId) -> Option<&str> {
        self.clients.get(&id).map(|c| c.stabilizer.status())
    }

    pub fn last_output(&self, id: PlayerId) -> Option<&DetectorOutput> {
        self.last_outputs.get(&id)
    }

    /// How `observer` currently hears `speaker`
    pub fn perceived_range(&self, speaker: PlayerId, observer: PlayerId) -> VoiceRange {
        self.audio.range(speaker, observer)
    }

    /// Advance one virtual frame
    pub fn tick(&mut self) {
        self.frame += 1;
        self.now += self.cfg.tick_dt;
        let now = self.now;
        self.journal.set_clock(self.frame, now);

        let ids: Vec<PlayerId> = self.clients.keys().copied().collect();

        // 1. Detection, speaker-side protocol and gate claims
        for id in &ids {
            let client = self.clients.get_mut(id).expect("client exists");
            let out = client.detector.update(&self.roster, now);

            for event in &out.events {
                match event {
                    TalkerEvent::Enter => {
                        client
                            .relay
                            .talker_enter(&mut self.bus, &self.roster, now, &mut self.journal);
                        let target = whisper_target(&self.roster, *id, &out);
                        if let Some(slot) =
                            self.pool
                                .claim_for_speaker(*id, &self.roster, &mut self.journal)
                        {
                            if let Some(gate) = self.pool.get_mut(slot) {
                                gate.owner_start(*id, target);
                            }
                            self.journal.log(
                                *id,
                                "GATE",
                                format!("start slot={} target={}", slot, target),
                            );
                        }
                    }
                    TalkerEvent::Tick => {
                        client
                            .relay
                            .talker_tick(&mut self.bus, &self.roster, now, &mut self.journal);
                        // Keep the gate aimed at whoever is nearest now
                        if let Some(slot) = self.pool.slot_owned_by(*id) {
                            let target = whisper_target(&self.roster, *id, &out);
                            if let Some(gate) = self.pool.get_mut(slot) {
                                if gate.target() != target {
                                    gate.owner_update_target(*id, target);
                                    self.journal
                                        .trace(*id, "GATE", format!("retarget -> {}", target));
                                }
                            }
                        }
                    }
                    TalkerEvent::Exit => {
                        client
                            .relay
                            .talker_exit(&mut self.bus, &self.roster, now, &mut self.journal);
                        if let Some(slot) = self.pool.slot_owned_by(*id) {
                            if let Some(gate) = self.pool.get_mut(slot) {
                                gate.owner_stop(*id);
                            }
                            self.journal.log(*id, "GATE", format!("stop slot={}", slot));
                        }
                    }
                }
            }

            self.last_outputs.insert(*id, out);
        }

        // 2. Signal delivery: every queued broadcast reaches every
        //    addressed participant's receive path
        for env in self.bus.drain() {
            for id in &ids {
                if env.audience == Audience::Others && *id == env.sender {
                    continue;
                }
                let client = self.clients.get_mut(id).expect("client exists");
                if let Some(ev) =
                    client
                        .relay
                        .on_signal(&env, &self.roster, now, &mut self.journal)
                {
                    client.stabilizer.handle(&ev, now, &mut self.journal);
                }
            }
        }

        // 3. Relay maintenance (echo, timeout, geofence) and stabilizer
        //    liveness
        for id in &ids {
            let client = self.clients.get_mut(id).expect("client exists");
            if let Some(ev) = client
                .relay
                .tick(&mut self.bus, &self.roster, now, &mut self.journal)
            {
                client.stabilizer.handle(&ev, now, &mut self.journal);
            }
            client.stabilizer.tick(now, &mut self.journal);
        }

        // 4. Gates re-assert their audio ranges last, overriding anything
        //    written earlier in the frame
        self.pool.apply_all(&self.roster, &mut self.audio, now);
    }

    /// Consume the room and hand back its journal
    pub fn into_journal(self) -> SessionJournal {
        self.journal
    }
}

/// The ear a whisper is aimed at: the participant nearest the active hand
fn whisper_target(roster: &Roster, speaker: PlayerId, out: &DetectorOutput) -> PlayerId {
    let from = match roster.get(speaker) {
        Some(p) => match out.active_hand {
            Some(hand) => p.pose.hand(hand).wrist,
            None => p.pose.head.position,
        },
        None => return NO_PLAYER,
    };
    roster
        .nearest_other(speaker, from)
        .map(|(id, _)| id)
        .unwrap_or(NO_PLAYER)
}

// =============================================================================
// TESTS
// =============================================================================
