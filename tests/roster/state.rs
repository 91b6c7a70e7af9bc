use std::{fs, sync::Arc};

use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

use catchkeeper::{
    mechanics::{GateDraw, PrimeGate},
    roster::{InMemoryRosterStore, RosterErrorKind, RosterPersistence},
};

use crate::support::{ScriptedGate, harness_with_store, temp_state_path};

#[tokio::test]
async fn given_committed_workflows_when_reopening_state_then_records_survive() {
    let path = temp_state_path("roster-state");
    let store = InMemoryRosterStore::open(RosterPersistence::new(path.clone()))
        .expect("empty state should open");
    let h = harness_with_store(
        store,
        true,
        Arc::new(ScriptedGate::new([GateDraw::Accepted(17)])),
    );

    let kept = h
        .service
        .capture(Uuid::now_v7(), 25, Some("sparky".to_string()))
        .await
        .expect("capture");
    let released = h
        .service
        .capture(Uuid::now_v7(), 1, None)
        .await
        .expect("capture");
    h.service.release(released.id).await.expect("release");

    let reopened = InMemoryRosterStore::open(RosterPersistence::new(path.clone()))
        .expect("saved state should open");
    let records = reopened.snapshot().await;

    assert_eq!(records.len(), 2);
    let sparky = records
        .iter()
        .find(|record| record.id == kept.id)
        .expect("captured record should be persisted");
    assert_eq!(sparky.nickname, "sparky");
    assert!(!sparky.released);
    let bulbasaur = records
        .iter()
        .find(|record| record.id == released.id)
        .expect("released record should be persisted");
    assert!(bulbasaur.released);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn given_failed_workflow_when_reopening_state_then_nothing_was_written() {
    let path = temp_state_path("roster-state");
    let store = InMemoryRosterStore::open(RosterPersistence::new(path.clone()))
        .expect("empty state should open");
    let h = harness_with_store(store, false, Arc::new(ScriptedGate::default()));

    let err = h
        .service
        .capture(Uuid::now_v7(), 25, None)
        .await
        .expect_err("missed roll");

    assert_eq!(err.kind, RosterErrorKind::CatchFailed);
    assert!(!path.exists());
}

#[tokio::test]
async fn given_corrupt_state_file_when_opening_then_storage_error() {
    let path = temp_state_path("roster-state");
    let dir = path.parent().expect("state path has a parent").to_path_buf();
    fs::create_dir_all(&dir).expect("temp dir should exist");
    fs::write(&path, "{ not json").expect("corrupt file should be written");

    let err = InMemoryRosterStore::open(RosterPersistence::new(path))
        .expect_err("corrupt state must fail");

    assert_eq!(err.kind, RosterErrorKind::Storage);
    let _ = fs::remove_dir_all(dir);
}

#[tokio::test]
async fn given_unwritable_snapshot_when_renaming_then_counter_is_not_consumed() {
    let path = temp_state_path("roster-state");
    let store = InMemoryRosterStore::open(RosterPersistence::new(path.clone()))
        .expect("empty state should open");
    let h = harness_with_store(store, true, Arc::new(ScriptedGate::default()));
    let record = h
        .service
        .capture(Uuid::now_v7(), 25, None)
        .await
        .expect("capture");
    let key = record.id.to_string();

    let blocker = path.with_extension("tmp");
    fs::create_dir_all(&blocker).expect("blocker dir should be created");
    let err = h
        .service
        .rename(record.id)
        .await
        .expect_err("snapshot write must fail");

    assert_eq!(err.kind, RosterErrorKind::Storage);
    assert_eq!(h.counters.peek_index(&key), 0);
    assert_eq!(h.store.snapshot().await, vec![record.clone()]);

    fs::remove_dir_all(&blocker).expect("blocker dir should be removed");
    let renamed = h.service.rename(record.id).await.expect("rename");
    assert_eq!(renamed.nickname, "pikachu-0");
    assert_eq!(h.counters.peek_index(&key), 1);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

#[tokio::test]
async fn given_unwritable_snapshot_when_releasing_then_prime_returns_to_gate() {
    let path = temp_state_path("roster-state");
    let store = InMemoryRosterStore::open(RosterPersistence::new(path.clone()))
        .expect("empty state should open");
    let gate = Arc::new(PrimeGate::with_threshold(0, StdRng::seed_from_u64(7)));
    let h = harness_with_store(store, true, gate.clone());
    let record = h
        .service
        .capture(Uuid::now_v7(), 25, None)
        .await
        .expect("capture");

    let blocker = path.with_extension("tmp");
    fs::create_dir_all(&blocker).expect("blocker dir should be created");
    let err = h
        .service
        .release(record.id)
        .await
        .expect_err("snapshot write must fail");

    assert_eq!(err.kind, RosterErrorKind::Storage);
    let snapshot = gate.snapshot();
    assert!(snapshot.used_primes.is_empty());
    assert_eq!(snapshot.available_primes.len(), 8);
    assert_eq!(snapshot.attempts, snapshot.attempts_threshold);
    assert_eq!(h.store.snapshot().await, vec![record.clone()]);

    fs::remove_dir_all(&blocker).expect("blocker dir should be removed");
    let released = h.service.release(record.id).await.expect("release");
    assert!(released.released);
    assert_eq!(gate.snapshot().used_primes.len(), 1);

    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}
