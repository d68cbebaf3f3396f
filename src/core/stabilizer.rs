//! Listener stabilizer: confirm-count debounce over received samples
//!
//! Turns the jittery stream of per-packet proximity samples into a stable
//! "currently receiving" boolean. Three distance bands on
//! near = min(dR, dL): at or under the enter distance is an on-candidate,
//! at or over the exit distance is an off-candidate, and the gap between
//! them is a dead zone that preserves the current state. A candidate must
//! repeat `confirm_count` consecutive samples to flip the state; an
//! explicit Exit or a sample timeout flips it off immediately.

use crate::core::journal::SessionJournal;
use crate::types::{ListenerEvent, PlayerId, StabilizerConfig};

/// Per-listener receive state for one tracked speaker
#[derive(Debug)]
pub struct ListenerStabilizer {
    cfg: StabilizerConfig,
    /// The participant this stabilizer runs for (journal tagging)
    local: PlayerId,
    is_receiving: bool,
    stable_counter: u32,
    unstable_counter: u32,
    last_sample_time: f32,
    status: String,
}

impl ListenerStabilizer {
    pub fn new(local: PlayerId, cfg: StabilizerConfig) -> Self {
        Self {
            cfg,
            local,
            is_receiving: false,
            stable_counter: 0,
            unstable_counter: 0,
            last_sample_time: 0.0,
            status: "recv: pending".to_string(),
        }
    }

    pub fn is_receiving(&self) -> bool {
        self.is_receiving
    }

    /// Display-only status string, refreshed on every evaluated sample
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn stable_counter(&self) -> u32 {
        self.stable_counter
    }

    pub fn unstable_counter(&self) -> u32 {
        self.unstable_counter
    }

    /// Feed one forwarded relay event
    pub fn handle(&mut self, event: &ListenerEvent, now: f32, journal: &mut SessionJournal) {
        match *event {
            ListenerEvent::Enter { d_right, d_left } => {
                self.on_sample(d_right, d_left, "ENTER", now, journal)
            }
            ListenerEvent::Ping {
                d_right,
                d_left,
                keep_alive,
            } => {
                let tag = if keep_alive { "PING_KEEPALIVE" } else { "PING" };
                self.on_sample(d_right, d_left, tag, now, journal)
            }
            ListenerEvent::Exit => self.on_exit(now, journal),
        }
    }

    /// One distance sample; `tag` only flavors the journal line
    pub fn on_sample(
        &mut self,
        d_right: f32,
        d_left: f32,
        tag: &str,
        now: f32,
        journal: &mut SessionJournal,
    ) {
        self.last_sample_time = now;

        // No ear distinction: the closer hand decides
        let near = d_right.min(d_left);
        let in_range = near <= self.cfg.enter_distance;
        let out_range = near >= self.cfg.exit_distance;

        journal.trace(self.local, "SAMPLE", format!("tag={} near={:.2}", tag, near));

        if in_range {
            self.stable_counter += 1;
            self.unstable_counter = 0;

            if !self.is_receiving && self.stable_counter >= self.cfg.confirm_count {
                self.is_receiving = true;
                journal.log(self.local, "RECV_START", format!("near={:.2}", near));
                self.status = format!("recv: ✅ ({:.2}m)", near);
            } else if self.is_receiving {
                self.status = format!("recv: ✅ ({:.2}m)", near);
            }
        } else if out_range {
            self.unstable_counter += 1;
            self.stable_counter = 0;

            if self.is_receiving && self.unstable_counter >= self.cfg.confirm_count {
                self.is_receiving = false;
                journal.log(self.local, "RECV_STOP", format!("near={:.2}", near));
                self.status = format!("recv: ❌ ({:.2}m)", near);
            } else if !self.is_receiving {
                self.status = format!("recv: ❌ ({:.2}m)", near);
            }
        }
        // Dead zone (enter < near < exit): state and counters unchanged
    }

    /// Explicit Exit from the tracked speaker: no debounce wait
    pub fn on_exit(&mut self, now: f32, journal: &mut SessionJournal) {
        self.last_sample_time = now;
        self.unstable_counter = self.cfg.confirm_count;
        self.stable_counter = 0;
        if self.is_receiving {
            self.is_receiving = false;
            journal.log(self.local, "RECV_STOP", "reason=exit");
            self.status = "recv: ❌ (exit)".to_string();
        }
    }

    /// Local per-frame check, independent of any received message
    pub fn tick(&mut self, now: f32, journal: &mut SessionJournal) {
        if self.is_receiving && (now - self.last_sample_time) > self.cfg.ping_timeout_sec {
            self.is_receiving = false;
            self.stable_counter = 0;
            journal.log(self.local, "RECV_STOP", "reason=timeout");
            self.status = "recv: ❌ (timeout)".to_string();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
