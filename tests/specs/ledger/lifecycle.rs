//! Change lifecycle specs
//!
//! Verify submit/approve/process/cancel transitions and their audit trail.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn full_lifecycle_leaves_ordered_audit_trail() {
    let world = World::new();
    let id = RecordId::new("CHG-300");
    world.submit_scheduled("CHG-300", "Core switch replacement").await;

    world.clock.advance(chrono::Duration::minutes(3));
    world.ledger.approve(&world.ctx(), &id).await.unwrap();
    world.reconcile("CHG-300").await.unwrap();
    world.clock.advance(chrono::Duration::hours(2));
    let record = world
        .ledger
        .mark_processed(&world.ctx(), &id, "ACME")
        .await
        .unwrap();

    assert_eq!(record.status(), ChangeStatus::Processed);
    let kinds: Vec<_> = record.audit_log().iter().map(|e| e.kind.name()).collect();
    assert_eq!(
        kinds,
        vec!["submitted", "approved", "meeting_scheduled", "processed"]
    );
    let entries = record.audit_log().entries();
    assert!(entries.windows(2).all(|w| w[0].at <= w[1].at));
    assert!(entries
        .iter()
        .all(|e| e.actor == world.config.actor_id()));
}

#[tokio::test]
async fn processed_change_cannot_be_reopened() {
    let world = World::new();
    let id = RecordId::new("CHG-301");
    world.submit_scheduled("CHG-301", "DNS cutover").await;
    world
        .ledger
        .mark_processed(&world.ctx(), &id, "ACME")
        .await
        .unwrap();

    let err = world.ledger.cancel(&world.ctx(), &id).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Fatal);
    assert_eq!(
        world.record("CHG-301").await.status(),
        ChangeStatus::Processed
    );
}

#[tokio::test]
async fn audit_log_survives_detail_edits() {
    let world = World::new();
    let id = RecordId::new("CHG-302");
    world.submit_scheduled("CHG-302", "Firewall rules").await;
    world.ledger.approve(&world.ctx(), &id).await.unwrap();
    let before = world.record("CHG-302").await.audit_log().clone();

    world.retitle("CHG-302", "Firewall rules (phase 2)").await;

    let after = world.record("CHG-302").await;
    assert_eq!(after.audit_log(), &before);
    assert_eq!(after.title, "Firewall rules (phase 2)");
}

#[tokio::test]
async fn entries_from_other_origins_keep_their_actor() {
    let world = World::new();
    let id = RecordId::new("CHG-303");
    world.submit_scheduled("CHG-303", "Certificate rotation").await;

    let reviewer = Invocation::new(ActorId::new("alice@example.com"));
    let record = world.ledger.approve(&reviewer, &id).await.unwrap();

    let identities = KnownIdentities::new(["calendar-bot@example.com"])
        .with_actor(&world.config.actor_id());
    let origins: Vec<_> = record
        .audit_log()
        .iter()
        .map(|e| identities.is_self_generated(e.actor.as_str()))
        .collect();
    assert_eq!(origins, vec![true, false]);
}

#[tokio::test]
async fn cancelled_invocation_writes_nothing() {
    let world = World::new();
    let ctx = world.ctx();
    ctx.cancel();

    let err = world
        .ledger
        .submit(&ctx, RecordId::new("CHG-304"), ChangeDetails::new("Never lands"))
        .await
        .unwrap_err();

    assert!(err.is_interrupted());
    assert_eq!(world.blobs.put_count(), 0);
}
