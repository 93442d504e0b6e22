//! Meeting cancellation specs
//!
//! Verify tolerant delete and that cancellations are recorded once.

use crate::prelude::*;
use crate::prelude::assert_eq;

async fn scheduled_world(id: &str) -> (World, Reconciled) {
    let world = World::new();
    world.submit_scheduled(id, "Storage firmware rollout").await;
    let created = world.reconcile(id).await.unwrap();
    world.calendar.clear_calls();
    (world, created)
}

#[tokio::test]
async fn cancel_deletes_meeting_and_records_it() {
    let (world, created) = scheduled_world("CHG-200").await;

    let outcome = world
        .engine
        .cancel_meeting(&world.ctx(), &RecordId::new("CHG-200"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CancelOutcome::Deleted {
            meeting_id: created.meeting.id.clone()
        }
    );
    assert_eq!(world.calendar.meeting_count(), 0);
    let record = world.record("CHG-200").await;
    assert_eq!(
        record.audit_log().last().map(|e| e.kind.clone()),
        Some(ModificationKind::MeetingCancelled)
    );
}

#[tokio::test]
async fn meeting_already_removed_counts_as_cancelled() {
    let (world, created) = scheduled_world("CHG-201").await;
    world.calendar.remove(&created.meeting.id);

    let outcome = world
        .engine
        .cancel_meeting(&world.ctx(), &RecordId::new("CHG-201"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        CancelOutcome::AlreadyGone {
            meeting_id: created.meeting.id
        }
    );
    let record = world.record("CHG-201").await;
    assert_eq!(record.audit_log().last().unwrap().kind.name(), "meeting_cancelled");
}

#[tokio::test]
async fn second_cancel_confirms_without_recording_again() {
    let (world, created) = scheduled_world("CHG-202").await;
    let id = RecordId::new("CHG-202");
    world.engine.cancel_meeting(&world.ctx(), &id).await.unwrap();
    let puts = world.blobs.put_count();

    let outcome = world.engine.cancel_meeting(&world.ctx(), &id).await.unwrap();

    assert_eq!(
        outcome,
        CancelOutcome::AlreadyGone {
            meeting_id: created.meeting.id
        }
    );
    assert_eq!(world.blobs.put_count(), puts);
}

#[tokio::test]
async fn cancel_without_any_meeting_makes_no_calls() {
    let world = World::new();
    world.submit_scheduled("CHG-205", "Never reconciled").await;

    let outcome = world
        .engine
        .cancel_meeting(&world.ctx(), &RecordId::new("CHG-205"))
        .await
        .unwrap();

    assert_eq!(outcome, CancelOutcome::NothingScheduled);
    assert!(world.calendar.calls().is_empty());
}

#[tokio::test]
async fn denied_delete_is_fatal_but_still_recorded() {
    let (world, _) = scheduled_world("CHG-203").await;
    world.calendar.fail_next(
        CalendarOp::Delete,
        CalendarError::PermissionDenied("mailbox is read-only".into()),
    );

    let err = world
        .engine
        .cancel_meeting(&world.ctx(), &RecordId::new("CHG-203"))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Fatal);
    assert!(matches!(
        err.calendar_error(),
        Some(CalendarError::PermissionDenied(_))
    ));
    let record = world.record("CHG-203").await;
    assert_eq!(record.audit_log().last().unwrap().kind.name(), "meeting_cancelled");
}

#[tokio::test]
async fn lifecycle_cancel_and_meeting_cancel_are_separate_entries() {
    let (world, _) = scheduled_world("CHG-204").await;
    let id = RecordId::new("CHG-204");

    world.engine.cancel_meeting(&world.ctx(), &id).await.unwrap();
    let record = world.ledger.cancel(&world.ctx(), &id).await.unwrap();

    let kinds: Vec<_> = record.audit_log().iter().map(|e| e.kind.name()).collect();
    assert_eq!(
        kinds,
        vec!["submitted", "meeting_scheduled", "meeting_cancelled", "cancelled"]
    );
    assert_eq!(record.status(), ChangeStatus::Cancelled);
}

#[tokio::test]
async fn redelivery_after_denied_delete_removes_meeting() {
    let (world, created) = scheduled_world("CHG-206").await;
    let id = RecordId::new("CHG-206");
    world.calendar.fail_next(
        CalendarOp::Delete,
        CalendarError::PermissionDenied("mailbox is read-only".into()),
    );
    world
        .engine
        .cancel_meeting(&world.ctx(), &id)
        .await
        .unwrap_err();

    let outcome = world.engine.cancel_meeting(&world.ctx(), &id).await.unwrap();

    assert_eq!(
        outcome,
        CancelOutcome::Deleted {
            meeting_id: created.meeting.id.clone()
        }
    );
    assert!(world.calendar.meeting(&created.meeting.id).is_none());
    let kinds: Vec<_> = world
        .record("CHG-206")
        .await
        .audit_log()
        .iter()
        .map(|e| e.kind.name())
        .collect();
    assert_eq!(kinds, vec!["submitted", "meeting_scheduled", "meeting_cancelled"]);
}
