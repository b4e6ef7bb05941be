//! Integration tests for hubs, the registry, and client mirrors.

use std::sync::Arc;

use knuckle_game::{BoundingBox, JoinOutcome, Role, Seat, SequenceRoller, Session, Zone};
use knuckle_protocol::{
    ParticipantId, ParticipantRecord, Request, SessionId, SnapshotField, Update,
};
use knuckle_sync::{
    Change, InMemoryDirectory, SessionController, SessionRegistry, SyncConfig, SyncError,
};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id)
}

fn sid(id: &str) -> SessionId {
    SessionId::new(id)
}

fn session(name: &str, rolls: &[u8]) -> Session {
    let zone = Zone::new(
        sid(name),
        BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 96.0,
            height: 64.0,
        },
    );
    Session::with_roller(zone, Box::new(SequenceRoller::from_values(rolls)))
}

fn registry() -> SessionRegistry {
    SessionRegistry::new(Arc::new(InMemoryDirectory::new()), SyncConfig::default())
}

/// Everything delivered so far. Call after a round-trip to the hub so
/// earlier commands have been processed.
fn drain(rx: &mut mpsc::UnboundedReceiver<Update>) -> Vec<Update> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

/// A registry with one session and players `a` and `b` seated.
async fn seated(rolls: &[u8]) -> (SessionRegistry, SessionId) {
    let mut reg = registry();
    let id = reg.open_session(session("Knuckles1", rolls)).unwrap();
    reg.on_participant_enter(&id, pid("a")).await.unwrap();
    reg.on_participant_enter(&id, pid("b")).await.unwrap();
    (reg, id)
}

// =========================================================================
// Emission rules
// =========================================================================

#[tokio::test]
async fn test_subscribe_receives_current_state() {
    let mut reg = registry();
    let id = reg.open_session(session("Knuckles1", &[1])).unwrap();
    reg.on_participant_enter(&id, pid("a")).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 1);
    assert!(updates[0].changed.is_empty());
    assert_eq!(updates[0].seq, 1);
    assert_eq!(updates[0].snapshot.player_one_id, Some(pid("a")));
}

#[tokio::test]
async fn test_subscribe_repeats_current_seq_without_advancing_it() {
    let mut reg = registry();
    let id = reg.open_session(session("Knuckles1", &[1])).unwrap();

    let (early_tx, mut early_rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, early_tx).await.unwrap();
    reg.on_participant_enter(&id, pid("a")).await.unwrap();
    let (late_tx, mut late_rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, late_tx).await.unwrap();
    reg.on_participant_enter(&id, pid("b")).await.unwrap();
    reg.snapshot(&id).await.unwrap();

    let early: Vec<u64> = drain(&mut early_rx).iter().map(|u| u.seq).collect();
    let late: Vec<u64> = drain(&mut late_rx).iter().map(|u| u.seq).collect();
    assert_eq!(early, vec![0, 1, 2]);
    assert_eq!(late, vec![1, 2]);
}

#[tokio::test]
async fn test_each_accepted_action_emits_once() {
    let mut reg = registry();
    let id = reg.open_session(session("Knuckles1", &[4])).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    reg.on_participant_enter(&id, pid("a")).await.unwrap();
    reg.on_participant_enter(&id, pid("b")).await.unwrap();
    reg.request(&id, pid("a"), Request::Start).await.unwrap();
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    reg.request(&id, pid("a"), Request::Place { row: 0 }).await.unwrap();
    reg.snapshot(&id).await.unwrap();

    let updates = drain(&mut rx);
    let seqs: Vec<u64> = updates.iter().map(|u| u.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4, 5]);

    assert_eq!(updates[3].changed, vec![SnapshotField::Running]);
    assert_eq!(updates[4].changed, vec![SnapshotField::PendingDie]);
    assert_eq!(updates[4].snapshot.pending_die, Some(4));
    assert_eq!(
        updates[5].changed,
        vec![
            SnapshotField::BoardOne,
            SnapshotField::Turn,
            SnapshotField::PendingDie
        ]
    );
    let last = &updates[5].snapshot;
    assert_eq!(last.board_one[0], [4, 0, 0]);
    assert!(!last.is_player_one_turn);
    assert_eq!(last.pending_die, None);
}

#[tokio::test]
async fn test_rejected_requests_emit_nothing() {
    let (reg, id) = seated(&[2]).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    // Not running yet.
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    reg.request(&id, pid("a"), Request::Start).await.unwrap();
    // Already running.
    reg.request(&id, pid("b"), Request::Start).await.unwrap();
    // Out of turn.
    reg.request(&id, pid("b"), Request::Roll).await.unwrap();
    // Nothing pending.
    reg.request(&id, pid("a"), Request::Place { row: 1 }).await.unwrap();
    // Not in the zone at all.
    reg.request(&id, pid("mallory"), Request::Roll).await.unwrap();
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    // Already holding a die.
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    // No such row.
    reg.request(&id, pid("a"), Request::Place { row: 3 }).await.unwrap();
    reg.snapshot(&id).await.unwrap();

    let updates = drain(&mut rx);
    let changed: Vec<Vec<SnapshotField>> = updates.into_iter().map(|u| u.changed).collect();
    assert_eq!(
        changed,
        vec![
            vec![],
            vec![SnapshotField::Running],
            vec![SnapshotField::PendingDie],
        ]
    );
}

#[tokio::test]
async fn test_reentering_does_not_emit() {
    let (mut reg, id) = seated(&[1]).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    let outcome = reg.on_participant_enter(&id, pid("a")).await.unwrap();
    assert_eq!(outcome, JoinOutcome::AlreadyJoined(Role::Player(Seat::One)));
    reg.snapshot(&id).await.unwrap();

    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test]
async fn test_player_leaving_running_game_broadcasts_reset() {
    let (mut reg, id) = seated(&[5]).await;
    reg.on_participant_enter(&id, pid("c")).await.unwrap();
    reg.request(&id, pid("a"), Request::Start).await.unwrap();
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    reg.request(&id, pid("a"), Request::Place { row: 2 }).await.unwrap();
    reg.request(&id, pid("b"), Request::Roll).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    let departure = reg.on_participant_leave(&id, pid("b")).await.unwrap().unwrap();
    assert!(departure.reset);
    assert_eq!(departure.role, Role::Player(Seat::Two));
    reg.snapshot(&id).await.unwrap();

    let updates = drain(&mut rx);
    assert_eq!(updates.len(), 2);
    let after = &updates[1].snapshot;
    assert!(!after.running);
    assert_eq!(after.board_one, [[0; 3]; 3]);
    assert_eq!(after.pending_die, None);
    assert!(after.is_player_one_turn);
    assert_eq!(after.player_two_id, None);
    assert_eq!(after.spectator_ids, vec![pid("c")]);
}

#[tokio::test]
async fn test_capture_reaches_subscribers() {
    let (reg, id) = seated(&[3, 3]).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    reg.request(&id, pid("a"), Request::Start).await.unwrap();
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    reg.request(&id, pid("a"), Request::Place { row: 1 }).await.unwrap();
    reg.request(&id, pid("b"), Request::Roll).await.unwrap();
    reg.request(&id, pid("b"), Request::Place { row: 1 }).await.unwrap();
    reg.snapshot(&id).await.unwrap();

    let last = drain(&mut rx).pop().unwrap();
    assert!(last.changed.contains(&SnapshotField::BoardOne));
    assert!(last.changed.contains(&SnapshotField::BoardTwo));
    assert_eq!(last.snapshot.board_one[1], [0, 0, 0]);
    assert_eq!(last.snapshot.board_two[1], [3, 0, 0]);
    assert!(last.snapshot.is_player_one_turn);
}

#[tokio::test]
async fn test_dropped_subscriber_is_pruned() {
    let (reg, id) = seated(&[1]).await;
    let (tx, rx) = mpsc::unbounded_channel();
    let (keep_tx, mut keep_rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();
    reg.subscribe(&id, keep_tx).await.unwrap();
    assert_eq!(reg.info(&id).await.unwrap().subscriber_count, 2);

    drop(rx);
    reg.request(&id, pid("a"), Request::Start).await.unwrap();

    let info = reg.info(&id).await.unwrap();
    assert_eq!(info.subscriber_count, 1);
    assert_eq!(drain(&mut keep_rx).len(), 2);
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let (reg, id) = seated(&[1]).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = reg.subscribe(&id, tx).await.unwrap();

    assert!(reg.unsubscribe(&id, sub).await.unwrap());
    assert!(!reg.unsubscribe(&id, sub).await.unwrap());
    reg.request(&id, pid("a"), Request::Start).await.unwrap();
    reg.snapshot(&id).await.unwrap();

    assert_eq!(drain(&mut rx).len(), 1);
}

// =========================================================================
// Participant directory
// =========================================================================

#[tokio::test]
async fn test_snapshot_carries_known_participant_records() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert(ParticipantRecord {
        id: pid("a"),
        user_name: "Alice".into(),
    });
    directory.insert(ParticipantRecord {
        id: pid("c"),
        user_name: "Carol".into(),
    });
    let mut reg = SessionRegistry::new(directory, SyncConfig::default());
    let id = reg.open_session(session("Knuckles1", &[1])).unwrap();
    for who in ["c", "a", "b", "d"] {
        reg.on_participant_enter(&id, pid(who)).await.unwrap();
    }

    let snapshot = reg.snapshot(&id).await.unwrap();
    let names: Vec<&str> = snapshot
        .participants
        .iter()
        .map(|r| r.user_name.as_str())
        .collect();
    // c and a hold the seats; b and d spectate and only c, a are known.
    assert_eq!(names, vec!["Carol", "Alice"]);
}

#[tokio::test]
async fn test_resolution_can_be_disabled() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory.insert(ParticipantRecord {
        id: pid("a"),
        user_name: "Alice".into(),
    });
    let config = SyncConfig {
        resolve_participants: false,
        ..SyncConfig::default()
    };
    let mut reg = SessionRegistry::new(directory, config);
    let id = reg.open_session(session("Knuckles1", &[1])).unwrap();
    reg.on_participant_enter(&id, pid("a")).await.unwrap();

    assert!(reg.snapshot(&id).await.unwrap().participants.is_empty());
}

// =========================================================================
// Registry bookkeeping
// =========================================================================

#[tokio::test]
async fn test_open_duplicate_session_fails() {
    let mut reg = registry();
    reg.open_session(session("Knuckles1", &[1])).unwrap();
    let result = reg.open_session(session("Knuckles1", &[1]));
    assert!(matches!(result, Err(SyncError::DuplicateSession(_))));
    assert_eq!(reg.session_count(), 1);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let mut reg = registry();
    let missing = sid("nowhere");
    assert!(matches!(
        reg.on_participant_enter(&missing, pid("a")).await,
        Err(SyncError::NotFound(_))
    ));
    assert!(matches!(
        reg.request(&missing, pid("a"), Request::Roll).await,
        Err(SyncError::NotFound(_))
    ));
    assert!(reg.link(&missing, pid("a")).is_err());
    assert_eq!(reg.session_of(&pid("a")), None);
}

#[tokio::test]
async fn test_one_session_at_a_time() {
    let mut reg = registry();
    let first = reg.open_session(session("Knuckles1", &[1])).unwrap();
    let second = reg.open_session(session("Knuckles2", &[1])).unwrap();

    reg.on_participant_enter(&first, pid("a")).await.unwrap();
    let result = reg.on_participant_enter(&second, pid("a")).await;
    assert!(matches!(result, Err(SyncError::AlreadyInSession(_, _))));

    reg.on_participant_leave(&first, pid("a")).await.unwrap();
    reg.on_participant_enter(&second, pid("a")).await.unwrap();
    assert_eq!(reg.session_of(&pid("a")), Some(&second));
}

#[tokio::test]
async fn test_leave_is_idempotent() {
    let (mut reg, id) = seated(&[1]).await;
    assert!(reg.on_participant_leave(&id, pid("a")).await.unwrap().is_some());
    assert!(reg.on_participant_leave(&id, pid("a")).await.unwrap().is_none());
    assert!(reg.on_participant_leave(&id, pid("zed")).await.unwrap().is_none());
    assert_eq!(reg.session_of(&pid("a")), None);
    assert_eq!(reg.session_of(&pid("b")), Some(&id));
}

#[tokio::test]
async fn test_close_session_forgets_occupants() {
    let (mut reg, id) = seated(&[1]).await;
    let handle = reg.handle(&id).unwrap().clone();

    reg.close_session(&id).await.unwrap();

    assert_eq!(reg.session_count(), 0);
    assert_eq!(reg.session_of(&pid("a")), None);
    assert!(matches!(
        reg.close_session(&id).await,
        Err(SyncError::NotFound(_))
    ));
    // The hub stops once it has drained the shutdown.
    let mut stopped = false;
    for _ in 0..100 {
        if handle.snapshot().await.is_err() {
            stopped = true;
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(stopped);
}

#[tokio::test]
async fn test_list_sessions_is_sorted() {
    let mut reg = registry();
    reg.open_session(session("Knuckles2", &[1])).unwrap();
    reg.open_session(session("Knuckles1", &[1])).unwrap();

    let ids: Vec<String> = reg
        .list_sessions()
        .await
        .into_iter()
        .map(|info| info.session_id.to_string())
        .collect();
    assert_eq!(ids, vec!["Knuckles1", "Knuckles2"]);

    let mut all = reg.session_ids();
    all.sort();
    assert_eq!(all, vec![sid("Knuckles1"), sid("Knuckles2")]);
}

// =========================================================================
// Client mirrors
// =========================================================================

#[tokio::test]
async fn test_mirror_converges_with_server() {
    let (reg, id) = seated(&[6, 2, 6]).await;
    let initial = reg.snapshot(&id).await.unwrap();
    let alice_link = reg.link(&id, pid("a")).unwrap();
    let bob_link = reg.link(&id, pid("b")).unwrap();
    let mut alice = SessionController::new(pid("a"), initial.clone(), alice_link);
    let mut bob = SessionController::new(pid("b"), initial, bob_link);
    let mut turns = bob.watch(&[SnapshotField::Turn]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();

    alice.request_start().await.unwrap();
    alice.request_roll().await.unwrap();
    alice.request_place(0).await.unwrap();
    reg.snapshot(&id).await.unwrap();
    for update in drain(&mut rx) {
        alice.apply(update.clone()).unwrap();
        bob.apply(update).unwrap();
    }
    assert!(bob.is_my_turn());
    assert!(!alice.is_my_turn());
    assert_eq!(
        turns.try_next(),
        Some(Change::Turn {
            is_player_one_turn: false
        })
    );

    bob.request_roll().await.unwrap();
    bob.request_place(0).await.unwrap();
    alice.request_roll().await.unwrap();
    reg.snapshot(&id).await.unwrap();
    for update in drain(&mut rx) {
        alice.apply(update.clone()).unwrap();
        bob.apply(update).unwrap();
    }

    let server = reg.snapshot(&id).await.unwrap();
    assert_eq!(alice.snapshot(), &server);
    assert_eq!(bob.snapshot(), &server);
    assert_eq!(alice.board_one()[0], [6, 0, 0]);
    assert_eq!(alice.board_two()[0], [2, 0, 0]);
    assert_eq!(alice.pending_die(), Some(6));
}

#[tokio::test]
async fn test_mirror_catches_up_from_latest_update_alone() {
    let (reg, id) = seated(&[5]).await;
    let stale = reg.snapshot(&id).await.unwrap();
    let link = reg.link(&id, pid("c")).unwrap();
    let mut carol = SessionController::new(pid("c"), stale, link);

    let (tx, mut rx) = mpsc::unbounded_channel();
    reg.subscribe(&id, tx).await.unwrap();
    reg.request(&id, pid("a"), Request::Start).await.unwrap();
    reg.request(&id, pid("a"), Request::Roll).await.unwrap();
    reg.snapshot(&id).await.unwrap();

    let latest = drain(&mut rx).pop().unwrap();
    let changes = carol.apply(latest).unwrap();

    let fields: Vec<SnapshotField> = changes.iter().map(|c| c.field()).collect();
    assert_eq!(fields, vec![SnapshotField::Running, SnapshotField::PendingDie]);
    assert_eq!(carol.snapshot(), &reg.snapshot(&id).await.unwrap());
    assert_eq!(carol.my_role(), None);
}
