use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

use catchkeeper::{
    mechanics::{GateDraw, PrimeGate},
    roster::{CreatureRecord, CreatureStatus, RosterErrorKind},
};

use crate::support::{Harness, ScriptedGate, harness};

async fn captured(h: &Harness) -> CreatureRecord {
    h.service
        .capture(Uuid::now_v7(), 25, None)
        .await
        .expect("capture should succeed")
}

#[tokio::test]
async fn given_accepted_prime_when_releasing_then_record_is_released() {
    let h = harness(true, Arc::new(ScriptedGate::new([GateDraw::Accepted(7)])));
    let record = captured(&h).await;

    let released = h.service.release(record.id).await.expect("release should succeed");

    assert_eq!(released.status(), CreatureStatus::Released);
    assert_eq!(h.store.snapshot().await, vec![released]);
}

#[tokio::test]
async fn given_decoy_draw_when_releasing_then_retryable_error_and_record_stays_active() {
    let gate = Arc::new(ScriptedGate::new([GateDraw::Rejected(9), GateDraw::Accepted(3)]));
    let h = harness(true, gate.clone());
    let record = captured(&h).await;

    let err = h
        .service
        .release(record.id)
        .await
        .expect_err("decoy must reject the release");
    assert_eq!(err.kind, RosterErrorKind::DecoyDraw);
    assert!(err.retryable);
    assert!(err.message.contains("(9)"));
    assert_eq!(h.store.snapshot().await, vec![record.clone()]);

    let released = h.service.release(record.id).await.expect("retry should pass");
    assert!(released.released);
    assert_eq!(gate.remaining(), 0);
}

#[tokio::test]
async fn given_composite_acceptance_when_releasing_then_not_prime_and_record_stays_active() {
    let gate = Arc::new(ScriptedGate::new([GateDraw::Accepted(4)]));
    let h = harness(true, gate.clone());
    let record = captured(&h).await;

    let err = h
        .service
        .release(record.id)
        .await
        .expect_err("composite acceptance must fail");

    assert_eq!(err.kind, RosterErrorKind::NotPrime);
    assert_eq!(gate.reverted(), vec![4]);
    assert_eq!(h.store.snapshot().await, vec![record]);
}

#[tokio::test]
async fn given_out_of_range_acceptance_when_releasing_then_out_of_range() {
    let h = harness(true, Arc::new(ScriptedGate::new([GateDraw::Accepted(23)])));
    let record = captured(&h).await;

    let err = h
        .service
        .release(record.id)
        .await
        .expect_err("out of range acceptance must fail");

    assert_eq!(err.kind, RosterErrorKind::OutOfRange);
}

#[tokio::test]
async fn given_released_record_when_releasing_again_then_already_released_without_drawing() {
    let gate = Arc::new(ScriptedGate::new([GateDraw::Accepted(2), GateDraw::Accepted(5)]));
    let h = harness(true, gate.clone());
    let record = captured(&h).await;
    let released = h.service.release(record.id).await.expect("first release");

    let err = h
        .service
        .release(record.id)
        .await
        .expect_err("second release must fail");

    assert_eq!(err.kind, RosterErrorKind::AlreadyReleased);
    assert!(!err.retryable);
    assert_eq!(gate.remaining(), 1);
    assert_eq!(h.store.snapshot().await, vec![released]);
}

#[tokio::test]
async fn given_released_record_when_unreleasing_then_record_is_active_again() {
    let h = harness(true, Arc::new(ScriptedGate::new([GateDraw::Accepted(13)])));
    let record = captured(&h).await;
    h.service.release(record.id).await.expect("release");

    let restored = h.service.unrelease(record.id).await.expect("unrelease");

    assert_eq!(restored.status(), CreatureStatus::Active);
    assert_eq!(restored.nickname, record.nickname);
}

#[tokio::test]
async fn given_active_record_when_unreleasing_then_not_released() {
    let h = harness(true, Arc::new(ScriptedGate::default()));
    let record = captured(&h).await;

    let err = h
        .service
        .unrelease(record.id)
        .await
        .expect_err("active record cannot be unreleased");

    assert_eq!(err.kind, RosterErrorKind::NotReleased);
    assert_eq!(h.store.snapshot().await, vec![record]);
}

#[tokio::test]
async fn given_unknown_id_when_running_workflows_then_not_found() {
    let h = harness(true, Arc::new(ScriptedGate::new([GateDraw::Accepted(2)])));
    let missing = Uuid::now_v7();

    let release = h.service.release(missing).await.expect_err("release");
    let unrelease = h.service.unrelease(missing).await.expect_err("unrelease");
    let rename = h.service.rename(missing).await.expect_err("rename");

    assert_eq!(release.kind, RosterErrorKind::NotFound);
    assert_eq!(unrelease.kind, RosterErrorKind::NotFound);
    assert_eq!(rename.kind, RosterErrorKind::NotFound);
}

#[tokio::test]
async fn given_seeded_gate_with_threshold_two_when_releasing_then_two_decoys_precede_release() {
    let gate = Arc::new(PrimeGate::with_threshold(2, StdRng::seed_from_u64(42)));
    let h = harness(true, gate.clone());
    let record = captured(&h).await;

    for attempt in 1..=2 {
        let err = h
            .service
            .release(record.id)
            .await
            .expect_err("decoys come first");
        assert_eq!(err.kind, RosterErrorKind::DecoyDraw, "attempt {attempt}");
        assert!(err.retryable);
        assert_eq!(gate.snapshot().attempts, attempt);
        assert_eq!(h.store.snapshot().await, vec![record.clone()]);
    }

    let released = h
        .service
        .release(record.id)
        .await
        .expect("third draw hands out a prime");

    assert!(released.released);
    let snapshot = gate.snapshot();
    assert_eq!(snapshot.attempts, 0);
    assert_eq!(snapshot.used_primes.len(), 1);
    assert_eq!(h.store.snapshot().await, vec![released]);
}
