//! Integration tests for the voice gate slice
//!
//! The allocator contract (reuse -> free slot -> mod-N steal), the
//! owner-uniqueness invariant, the per-observer range matrix and the
//! continuous re-apply guarantee, exercised both directly and through
//! full room frames.

use pretty_assertions::assert_eq;

use whispergate::core::gate::{AudioField, GatePool, VoiceRange};
use whispergate::core::journal::SessionJournal;
use whispergate::core::room::Room;
use whispergate::core::scenario;
use whispergate::types::{GateConfig, PlayerId, RoomConfig, Roster, Vec3, NO_PLAYER};
use whispergate::{NORMAL_FAR_M, WHISPER_FAR_M};

fn setup(pool_size: usize) -> (GatePool, Roster, SessionJournal) {
    (
        GatePool::new(pool_size, GateConfig::default()),
        Roster::new(),
        SessionJournal::new(false),
    )
}

// =============================================================================
// SCENARIO 1: Allocation policy order
// =============================================================================

#[test]
fn test_policy_reuse_then_free_then_steal() {
    let (mut pool, mut roster, mut journal) = setup(2);
    let a = roster.join("a");
    let b = roster.join("b");
    let c = roster.join("c");

    // Fresh speakers take free slots
    let slot_a = pool.claim_for_speaker(a, &roster, &mut journal).unwrap();
    let slot_b = pool.claim_for_speaker(b, &roster, &mut journal).unwrap();
    assert_ne!(slot_a, slot_b);

    // Reuse beats everything
    assert_eq!(pool.claim_for_speaker(a, &roster, &mut journal).unwrap(), slot_a);

    // Full pool: the third speaker steals |id| mod N
    let slot_c = pool.claim_for_speaker(c, &roster, &mut journal).unwrap();
    assert_eq!(slot_c, c.unsigned_abs() as usize % 2);
    assert_eq!(pool.get(slot_c).unwrap().owner(), c);
}

#[test]
fn test_steal_is_last_writer_wins() {
    let (mut pool, mut roster, mut journal) = setup(1);
    let a = roster.join("a");
    let b = roster.join("b");

    pool.claim_for_speaker(a, &roster, &mut journal);
    // Both fall back to slot 0; the later claim wins unconditionally
    pool.claim_for_speaker(b, &roster, &mut journal);
    assert_eq!(pool.get(0).unwrap().owner(), b);

    pool.claim_for_speaker(a, &roster, &mut journal);
    assert_eq!(pool.get(0).unwrap().owner(), a);
}

#[test]
fn test_owner_uniqueness_invariant_under_churn() {
    let (mut pool, mut roster, mut journal) = setup(4);
    let ids: Vec<PlayerId> = (0..10).map(|i| roster.join(format!("p{}", i))).collect();

    // Everyone claims, some repeatedly, some after others stole from them
    for round in 0..3 {
        for id in &ids {
            pool.claim_for_speaker(*id, &roster, &mut journal);
            let mut owners: Vec<PlayerId> = pool
                .snapshot()
                .iter()
                .map(|g| g.owner)
                .filter(|o| *o >= 0)
                .collect();
            owners.sort();
            let len = owners.len();
            owners.dedup();
            assert_eq!(len, owners.len(), "duplicate owner in round {}", round);
        }
    }
}

// =============================================================================
// SCENARIO 2: Stop idempotence
// =============================================================================

#[test]
fn test_stop_twice_same_terminal_state() {
    let (mut pool, mut roster, mut journal) = setup(1);
    let a = roster.join("a");
    let b = roster.join("b");

    let idx = pool.claim_for_speaker(a, &roster, &mut journal).unwrap();
    pool.get_mut(idx).unwrap().owner_start(a, b);

    pool.get_mut(idx).unwrap().owner_stop(a);
    pool.get_mut(idx).unwrap().owner_stop(a);

    let info = pool.get(idx).unwrap().info();
    assert!(!info.gate_on);
    assert_eq!(info.target, NO_PLAYER);
}

// =============================================================================
// SCENARIO 3: Per-observer range matrix
// =============================================================================

#[test]
fn test_range_matrix_for_active_gate() {
    let (mut pool, mut roster, mut journal) = setup(1);
    let speaker = roster.join("speaker");
    let target = roster.join("target");
    let bystander_1 = roster.join("by1");
    let bystander_2 = roster.join("by2");

    let idx = pool.claim_for_speaker(speaker, &roster, &mut journal).unwrap();
    pool.get_mut(idx).unwrap().owner_start(speaker, target);

    let mut field = AudioField::new(&GateConfig::default());
    pool.apply_all(&roster, &mut field, 0.0);

    // Target: whisper range. Everyone else including the speaker: muted.
    assert_eq!(field.range(speaker, target).far, WHISPER_FAR_M);
    assert_eq!(field.range(speaker, bystander_1), VoiceRange::SILENT);
    assert_eq!(field.range(speaker, bystander_2), VoiceRange::SILENT);
    assert_eq!(field.range(speaker, speaker), VoiceRange::SILENT);

    // An ungated participant keeps the normal range for every observer
    assert_eq!(field.range(target, bystander_1).far, NORMAL_FAR_M);
}

#[test]
fn test_disconnected_target_safe_policies() {
    // Default: mute everyone
    let (mut pool, mut roster, mut journal) = setup(1);
    let speaker = roster.join("speaker");
    let target = roster.join("target");
    let other = roster.join("other");
    let idx = pool.claim_for_speaker(speaker, &roster, &mut journal).unwrap();
    pool.get_mut(idx).unwrap().owner_start(speaker, target);
    roster.leave(target);

    let mut field = AudioField::new(&GateConfig::default());
    pool.apply_all(&roster, &mut field, 0.0);
    assert_eq!(field.range(speaker, other), VoiceRange::SILENT);

    // Alternate policy: revert to normal
    let cfg = GateConfig {
        mute_all_when_no_target: false,
        ..Default::default()
    };
    let mut pool = GatePool::new(1, cfg.clone());
    let mut roster = Roster::new();
    let speaker = roster.join("speaker");
    let target = roster.join("target");
    let other = roster.join("other");
    let idx = pool.claim_for_speaker(speaker, &roster, &mut journal).unwrap();
    pool.get_mut(idx).unwrap().owner_start(speaker, target);
    roster.leave(target);

    let mut field = AudioField::new(&cfg);
    pool.apply_all(&roster, &mut field, 0.0);
    assert_eq!(field.range(speaker, other).far, NORMAL_FAR_M);
}

// =============================================================================
// SCENARIO 4: Re-apply wins the frame
// =============================================================================

#[test]
fn test_reapply_beats_other_writers_every_frame() {
    let (mut pool, mut roster, mut journal) = setup(1);
    let speaker = roster.join("speaker");
    let target = roster.join("target");
    let idx = pool.claim_for_speaker(speaker, &roster, &mut journal).unwrap();
    pool.get_mut(idx).unwrap().owner_start(speaker, target);

    let mut field = AudioField::new(&GateConfig::default());
    for frame in 0..10 {
        let now = frame as f32 / 72.0;
        // A rogue system overwrites first, the gate re-applies after
        field.set(speaker, target, VoiceRange::SILENT);
        field.set(speaker, speaker, VoiceRange { near: 0.0, far: 99.0 });
        pool.apply_all(&roster, &mut field, now);

        assert_eq!(field.range(speaker, target).far, WHISPER_FAR_M);
        assert_eq!(field.range(speaker, speaker), VoiceRange::SILENT);
    }
}

// =============================================================================
// SCENARIO 5: Through full room frames
// =============================================================================

#[test]
fn test_two_simultaneous_whisper_pairs() {
    let mut room = Room::new(RoomConfig::default());
    let head_1 = Vec3::new(0.0, 1.65, 0.0);
    let head_2 = Vec3::new(10.0, 1.65, 0.0);

    let speaker_1 = room.join("s1");
    let listener_1 = room.join("l1");
    let speaker_2 = room.join("s2");
    let listener_2 = room.join("l2");

    room.set_pose(listener_1, scenario::idle_pose(head_1));
    room.set_pose(speaker_1, scenario::whispering_speaker(head_1));
    room.set_pose(listener_2, scenario::idle_pose(head_2));
    room.set_pose(speaker_2, scenario::whispering_speaker(head_2));

    for _ in 0..72 {
        room.tick();
    }

    // Both speakers hold distinct slots aimed at their own listeners
    let gates = room.gate_snapshot();
    let slot_1 = gates.iter().find(|g| g.owner == speaker_1).unwrap();
    let slot_2 = gates.iter().find(|g| g.owner == speaker_2).unwrap();
    assert_ne!(slot_1.index, slot_2.index);
    assert_eq!(slot_1.target, listener_1);
    assert_eq!(slot_2.target, listener_2);

    // Cross-pair audio stays muted
    assert!(room.perceived_range(speaker_1, listener_1).is_audible());
    assert!(!room.perceived_range(speaker_1, listener_2).is_audible());
    assert!(room.perceived_range(speaker_2, listener_2).is_audible());
    assert!(!room.perceived_range(speaker_2, listener_1).is_audible());
}

#[test]
fn test_gate_released_and_reusable_after_stop() {
    let mut room = Room::new(RoomConfig::default());
    let head = Vec3::new(0.0, 1.65, 0.0);
    let speaker = room.join("speaker");
    let listener = room.join("listener");
    room.set_pose(listener, scenario::idle_pose(head));
    room.set_pose(speaker, scenario::whispering_speaker(head));

    for _ in 0..36 {
        room.tick();
    }
    assert!(room.is_whispering(speaker));

    room.set_pose(speaker, scenario::idle_pose(Vec3::new(-2.0, 1.65, 0.0)));
    room.tick();

    let gates = room.gate_snapshot();
    let slot = gates.iter().find(|g| g.owner == speaker).unwrap();
    assert!(!slot.gate_on);
    assert_eq!(slot.target, NO_PLAYER);

    // Whisper again: the same slot comes back
    room.set_pose(speaker, scenario::whispering_speaker(head));
    room.tick();
    let gates = room.gate_snapshot();
    let again = gates.iter().find(|g| g.owner == speaker).unwrap();
    assert_eq!(again.index, slot.index);
    assert!(again.gate_on);
}

#[test]
fn test_departed_target_cleared_in_room() {
    let mut room = Room::new(RoomConfig::default());
    let head = Vec3::new(0.0, 1.65, 0.0);
    let speaker = room.join("speaker");
    let listener = room.join("listener");
    room.set_pose(listener, scenario::idle_pose(head));
    room.set_pose(speaker, scenario::whispering_speaker(head));
    room.tick();

    let slot = room
        .gate_snapshot()
        .into_iter()
        .find(|g| g.owner == speaker)
        .unwrap();
    assert_eq!(slot.target, listener);

    room.leave(listener);
    let slot = room
        .gate_snapshot()
        .into_iter()
        .find(|g| g.owner == speaker)
        .unwrap();
    assert_eq!(slot.target, NO_PLAYER, "departing target must be cleared");
}

#[test]
fn test_hud_marks_the_local_target() {
    let mut room = Room::new(RoomConfig::default());
    let head = Vec3::new(0.0, 1.65, 0.0);
    let speaker = room.join("speaker");
    let listener = room.join("listener");
    room.set_pose(listener, scenario::idle_pose(head));
    room.set_pose(speaker, scenario::whispering_speaker(head));
    room.tick();

    let hud = room.render_gate_hud(listener);
    assert!(hud.contains("←YOU"), "hud:\n{}", hud);
    let hud_other = room.render_gate_hud(speaker);
    assert!(!hud_other.contains("←YOU"));
}
