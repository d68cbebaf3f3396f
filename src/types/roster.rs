//! Session participant roster
//!
//! The roster is the shared view of who is in the space and where their
//! tracked bones are. Ids are small integers handed out in join order; a
//! stale id simply stops resolving after the participant leaves.

use serde::{Deserialize, Serialize};

use crate::types::math::Vec3;
use crate::types::pose::{GripState, PlayerPose};

/// Session-scoped participant id
pub type PlayerId = i32;

/// Sentinel for "no participant"
pub const NO_PLAYER: PlayerId = -1;

/// One participant as the rest of the system sees them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: PlayerId,
    pub display_name: String,
    pub pose: PlayerPose,
    /// VR participants have grip axes; desktop ones never hand-select
    pub in_vr: bool,
    pub grips: GripState,
}

/// All participants currently in the space
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    players: Vec<Participant>,
    next_id: PlayerId,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a participant and return their id
    pub fn join(&mut self, display_name: impl Into<String>) -> PlayerId {
        let id = self.next_id;
        self.next_id += 1;
        self.players.push(Participant {
            id,
            display_name: display_name.into(),
            pose: PlayerPose::default(),
            in_vr: false,
            grips: GripState::default(),
        });
        id
    }

    /// Remove a participant; a no-op for unknown ids
    pub fn leave(&mut self, id: PlayerId) {
        self.players.retain(|p| p.id != id);
    }

    pub fn get(&self, id: PlayerId) -> Option<&Participant> {
        if id < 0 {
            return None;
        }
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Participant> {
        if id < 0 {
            return None;
        }
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_valid(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.players.iter()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Participant whose head is closest to `from`, excluding `exclude`
    pub fn nearest_other(&self, exclude: PlayerId, from: Vec3) -> Option<(PlayerId, f32)> {
        let mut best: Option<(PlayerId, f32)> = None;
        for p in &self.players {
            if p.id == exclude {
                continue;
            }
            let dist = Vec3::distance(from, p.pose.head.position);
            if best.map(|(_, d)| dist < d).unwrap_or(true) {
                best = Some((p.id, dist));
            }
        }
        best
    }

    /// "3:alice" display form used by logs and the gate HUD
    pub fn describe(&self, id: PlayerId) -> String {
        match self.get(id) {
            Some(p) => format!("{}:{}", p.id, p.display_name),
            None if id >= 0 => id.to_string(),
            None => "-".to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_assigns_increasing_ids() {
        let mut roster = Roster::new();
        let a = roster.join("alice");
        let b = roster.join("bob");
        assert!(b > a);
        assert_eq!(roster.count(), 2);
    }

    #[test]
    fn test_leave_invalidates_id() {
        let mut roster = Roster::new();
        let a = roster.join("alice");
        roster.leave(a);
        assert!(!roster.is_valid(a));
        assert!(roster.get(a).is_none());
    }

    #[test]
    fn test_no_player_never_resolves() {
        let mut roster = Roster::new();
        roster.join("alice");
        assert!(roster.get(NO_PLAYER).is_none());
    }

    #[test]
    fn test_nearest_other_skips_self() {
        let mut roster = Roster::new();
        let a = roster.join("alice");
        let b = roster.join("bob");
        let c = roster.join("carol");
        roster.get_mut(b).unwrap().pose.head.position = Vec3::new(1.0, 0.0, 0.0);
        roster.get_mut(c).unwrap().pose.head.position = Vec3::new(5.0, 0.0, 0.0);

        let (nearest, dist) = roster.nearest_other(a, Vec3::ZERO).unwrap();
        assert_eq!(nearest, b);
        assert!((dist - 1.0).abs() < 1e-6);
    }
}
