//! Signal relay: best-effort whisper announcements over a shared object
//!
//! One signaling object is shared by the whole session. Whoever wants to
//! broadcast first claims authority over it; the sender of a signal is
//! implicitly the authority holder, so authority naturally follows the
//! current speaker. Receivers never trust a signal by itself: each one
//! measures its own head against the announced speaker's hands and decides
//! locally whether the whisper concerns it, and local timeouts plus a
//! distance geofence recover from lost Exit messages.

use std::collections::VecDeque;

use crate::core::journal::SessionJournal;
use crate::types::math::Vec3;
use crate::types::{
    Audience, Envelope, ListenerEvent, Participant, PlayerId, RelayConfig, Roster, SignalKind,
    NO_PLAYER,
};
use crate::INVALID_DISTANCE_M;

/// Transferable broadcast right on the shared signaling object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityToken {
    pub holder: PlayerId,
    /// Bumped on every transfer; lets receivers spot stale sends
    pub generation: u64,
}

/// The shared signaling object: authority token plus outgoing signals
#[derive(Debug)]
pub struct SignalBus {
    token: AuthorityToken,
    outbox: VecDeque<Envelope>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self {
            token: AuthorityToken {
                holder: NO_PLAYER,
                generation: 0,
            },
            outbox: VecDeque::new(),
        }
    }

    pub fn token(&self) -> AuthorityToken {
        self.token
    }

    /// Take authority; a no-op when the claimant already holds it
    pub fn claim(&mut self, who: PlayerId) -> u64 {
        if self.token.holder != who {
            self.token.holder = who;
            self.token.generation += 1;
        }
        self.token.generation
    }

    /// Queue a signal; the sender is whoever holds authority right now
    pub fn broadcast(&mut self, kind: SignalKind, audience: Audience) {
        self.outbox.push_back(Envelope {
            kind,
            sender: self.token.holder,
            generation: self.token.generation,
            audience,
        });
    }

    /// Drain everything queued since the last delivery pass
    pub fn drain(&mut self) -> Vec<Envelope> {
        self.outbox.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

/// Per-participant relay endpoint: speaker-side broadcasting and
/// receiver-side tracking in one struct, exactly one per participant
#[derive(Debug)]
pub struct WhisperRelay {
    cfg: RelayConfig,
    local: PlayerId,

    // Receiver-side tracking
    listener_active: bool,
    speaker_id: PlayerId,
    alive_until: f32,
    /// Which ear was closer on the last measurement; kept for FX even
    /// though placement no longer uses it
    ear_right: bool,

    // Speaker-side scheduling
    next_ping: f32,
    pending_echo: Option<f32>,

    // Debug latch: hold the listener visual on, timeouts suspended
    debug_latched: bool,
}

impl WhisperRelay {
    pub fn new(local: PlayerId, cfg: RelayConfig) -> Self {
        Self {
            cfg,
            local,
            listener_active: false,
            speaker_id: NO_PLAYER,
            alive_until: 0.0,
            ear_right: true,
            next_ping: 0.0,
            pending_echo: None,
            debug_latched: false,
        }
    }

    pub fn listener_active(&self) -> bool {
        self.listener_active
    }

    pub fn speaker_id(&self) -> PlayerId {
        self.speaker_id
    }

    pub fn ear_right(&self) -> bool {
        self.ear_right
    }

    pub fn pending_echo(&self) -> Option<f32> {
        self.pending_echo
    }

    /// Latch the listener-active state on or off for debugging; while
    /// latched on, timeouts keep being pushed out
    pub fn set_debug_latched(&mut self, latched: bool) {
        self.debug_latched = latched;
        self.listener_active = latched;
    }

    // =========================================================================
    // Speaker side
    // =========================================================================

    /// The local detector entered Whispering
    pub fn talker_enter(
        &mut self,
        bus: &mut SignalBus,
        roster: &Roster,
        now: f32,
        journal: &mut SessionJournal,
    ) {
        let audience = self.audience(roster);
        bus.claim(self.local);
        bus.broadcast(SignalKind::Enter, audience);
        journal.trace(
            self.local,
            "SEND",
            format!("ENTER -> {:?} gen={}", audience, bus.token().generation),
        );

        // One redundant re-send shortly after, covering deliveries lost
        // during the authority handoff
        self.pending_echo = Some(now + self.cfg.enter_echo_delay);
        self.next_ping = now + self.cfg.first_ping_delay;
    }

    /// The local detector is still Whispering this frame
    pub fn talker_tick(
        &mut self,
        bus: &mut SignalBus,
        roster: &Roster,
        now: f32,
        journal: &mut SessionJournal,
    ) {
        if now >= self.next_ping {
            let audience = self.audience(roster);
            bus.claim(self.local);
            bus.broadcast(SignalKind::Ping, audience);
            journal.trace(self.local, "SEND", format!("PING -> {:?}", audience));
            self.next_ping = now + self.cfg.ping_interval;
        }
    }

    /// The local detector left Whispering
    pub fn talker_exit(
        &mut self,
        bus: &mut SignalBus,
        roster: &Roster,
        _now: f32,
        journal: &mut SessionJournal,
    ) {
        let audience = self.audience(roster);
        bus.claim(self.local);
        bus.broadcast(SignalKind::Exit, audience);
        journal.trace(self.local, "SEND", format!("EXIT -> {:?}", audience));
        // The scheduled echo is NOT cancelled here; there is no cancel
        // primitive, so an enter-then-exit inside the echo delay still
        // re-sends an Enter that receivers must age out
    }

    fn audience(&self, roster: &Roster) -> Audience {
        if self.cfg.loopback_in_solo && roster.count() <= 1 {
            Audience::All
        } else {
            Audience::Others
        }
    }

    // =========================================================================
    // Receiver side (runs on every participant)
    // =========================================================================

    /// Handle one delivered signal. Returns the sample to forward to the
    /// stabilizer and FX consumers, if the signal was relevant.
    pub fn on_signal(
        &mut self,
        env: &Envelope,
        roster: &Roster,
        now: f32,
        journal: &mut SessionJournal,
    ) -> Option<ListenerEvent> {
        // Own broadcasts only loop back when they were addressed to All
        // (the solo-session case)
        if env.sender == self.local && env.audience == Audience::Others {
            return None;
        }
        let speaker = match roster.get(env.sender) {
            Some(p) => p,
            None => {
                journal.trace(
                    self.local,
                    "RECV",
                    format!("{} from {} ignored (no such participant)", env.kind, env.sender),
                );
                return None;
            }
        };

        match env.kind {
            SignalKind::Enter => self.on_enter(speaker, roster, now, journal),
            SignalKind::Ping => self.on_ping(speaker, roster, now, journal),
            SignalKind::Exit => self.on_exit(speaker, journal),
        }
    }

    fn on_enter(
        &mut self,
        speaker: &Participant,
        roster: &Roster,
        now: f32,
        journal: &mut SessionJournal,
    ) -> Option<ListenerEvent> {
        let (ok, ear_right, d_right, d_left) =
            self.head_near_speaker_hands(speaker, roster, self.cfg.listener_start_distance);
        if !ok {
            journal.trace(
                self.local,
                "RECV",
                format!(
                    "ENTER from {} ignored (too far) dR={:.2} dL={:.2}",
                    speaker.id, d_right, d_left
                ),
            );
            return None;
        }

        self.speaker_id = speaker.id;
        self.ear_right = ear_right;
        self.mark_alive(now);
        journal.log(
            self.local,
            "RECV",
            format!(
                "ENTER from {} ear={} dR={:.2} dL={:.2}",
                speaker.id,
                if ear_right { "R" } else { "L" },
                d_right,
                d_left
            ),
        );
        Some(ListenerEvent::Enter { d_right, d_left })
    }

    fn on_ping(
        &mut self,
        speaker: &Participant,
        roster: &Roster,
        now: f32,
        journal: &mut SessionJournal,
    ) -> Option<ListenerEvent> {
        if self.speaker_id == speaker.id {
            // Keepalive from the tracked speaker; re-measure with a wider
            // radius so a brief lean-back does not break tracking
            let radius = self.cfg.listener_start_distance * self.cfg.keepalive_radius_scale;
            let (_, ear_right, d_right, d_left) =
                self.head_near_speaker_hands(speaker, roster, radius);
            self.ear_right = ear_right;
            self.mark_alive(now);
            journal.trace(
                self.local,
                "RECV",
                format!("PING from {} keepAlive dR={:.2} dL={:.2}", speaker.id, d_right, d_left),
            );
            return Some(ListenerEvent::Ping {
                d_right,
                d_left,
                keep_alive: true,
            });
        }

        // Ping from a speaker we are not tracking: the Enter may have been
        // lost, so re-run the distance gate for a late activation
        let (ok, ear_right, d_right, d_left) =
            self.head_near_speaker_hands(speaker, roster, self.cfg.listener_start_distance);
        if ok {
            self.speaker_id = speaker.id;
            self.ear_right = ear_right;
            self.mark_alive(now);
            journal.log(
                self.local,
                "RECV",
                format!(
                    "PING late activate from {} dR={:.2} dL={:.2}",
                    speaker.id, d_right, d_left
                ),
            );
            Some(ListenerEvent::Ping {
                d_right,
                d_left,
                keep_alive: false,
            })
        } else {
            journal.trace(
                self.local,
                "RECV",
                format!(
                    "PING from {} ignored (not near) dR={:.2} dL={:.2}",
                    speaker.id, d_right, d_left
                ),
            );
            None
        }
    }

    fn on_exit(
        &mut self,
        speaker: &Participant,
        journal: &mut SessionJournal,
    ) -> Option<ListenerEvent> {
        if self.listener_active && self.speaker_id == speaker.id {
            self.listener_active = false;
            journal.log(self.local, "RECV", format!("EXIT from {}", speaker.id));
            Some(ListenerEvent::Exit)
        } else {
            journal.trace(
                self.local,
                "RECV",
                format!("EXIT from {} ignored (not my speaker)", speaker.id),
            );
            None
        }
    }

    // =========================================================================
    // Local per-frame maintenance
    // =========================================================================

    /// Fire the scheduled echo, then run the liveness timeout and the
    /// distance geofence. Returns an Exit sample when the geofence drops
    /// the tracked speaker.
    pub fn tick(
        &mut self,
        bus: &mut SignalBus,
        roster: &Roster,
        now: f32,
        journal: &mut SessionJournal,
    ) -> Option<ListenerEvent> {
        if let Some(due) = self.pending_echo {
            if now >= due {
                self.pending_echo = None;
                // Sent with whatever authority stands now; a raced handoff
                // means the echo carries the newer speaker, which receivers
                // re-gate anyway
                let audience = self.audience(roster);
                bus.broadcast(SignalKind::Enter, audience);
                journal.trace(self.local, "SEND", format!("ENTER (echo) -> {:?}", audience));
            }
        }

        if self.debug_latched {
            self.listener_active = true;
            self.alive_until = now + 3600.0;
            return None;
        }
        if !self.listener_active {
            return None;
        }

        if now >= self.alive_until {
            self.listener_active = false;
            journal.log(self.local, "RECV", "listener timeout -> OFF");
            return None;
        }

        // Geofence: heads drifted apart without a final Exit arriving
        if let Some(speaker) = roster.get(self.speaker_id) {
            let my_head = roster.get(self.local).map(|p| p.pose.head.position);
            let sp_head = speaker.pose.head.position;
            if let Some(my_head) = my_head {
                if !my_head.is_zero() && !sp_head.is_zero() {
                    let dd = Vec3::distance(my_head, sp_head);
                    if dd > self.cfg.listener_end_distance {
                        self.listener_active = false;
                        journal.log(
                            self.local,
                            "RECV",
                            format!("listener end by distance dd={:.2} -> OFF", dd),
                        );
                        return Some(ListenerEvent::Exit);
                    }
                }
            }
        }
        None
    }

    fn mark_alive(&mut self, now: f32) {
        self.listener_active = true;
        self.alive_until = now + self.cfg.listener_timeout;
    }

    /// Measure the local head against both of the speaker's wrists.
    /// Untracked bones read as an effectively infinite distance.
    fn head_near_speaker_hands(
        &self,
        speaker: &Participant,
        roster: &Roster,
        threshold: f32,
    ) -> (bool, bool, f32, f32) {
        let my_head = match roster.get(self.local) {
            Some(p) => p.pose.head.position,
            None => return (false, true, INVALID_DISTANCE_M, INVALID_DISTANCE_M),
        };
        if my_head.is_zero() {
            return (false, true, INVALID_DISTANCE_M, INVALID_DISTANCE_M);
        }

        let rh = speaker.pose.right_hand.wrist;
        let lh = speaker.pose.left_hand.wrist;
        let d_right = if rh.is_zero() {
            INVALID_DISTANCE_M
        } else {
            Vec3::distance(rh, my_head)
        };
        let d_left = if lh.is_zero() {
            INVALID_DISTANCE_M
        } else {
            Vec3::distance(lh, my_head)
        };

        if d_right <= d_left {
            (d_right < threshold, true, d_right, d_left)
        } else {
            (d_left < threshold, false, d_right, d_left)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
