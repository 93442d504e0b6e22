//! Record validation specs
//!
//! Verify that invalid entries never reach storage and that corrupt stored
//! records are refused on load.

use crate::prelude::*;
use crate::prelude::assert_eq;

fn store(blobs: &FakeBlobStore) -> VersionedRecordStore<FakeBlobStore> {
    VersionedRecordStore::new(blobs.clone())
}

fn meeting(id: &str) -> MeetingRef {
    MeetingRef {
        id: id.to_string(),
        join_url: format!("https://meet.example/{}", id),
        subject: "Patch window".to_string(),
        start: window().start,
        end: window().end,
    }
}

#[tokio::test]
async fn record_with_empty_audit_log_is_valid() {
    let blobs = FakeBlobStore::new();
    let record = ChangeRecord::new(RecordId::new("CHG-500"), ChangeDetails::new("Draft")).unwrap();

    store(&blobs).create(&record).await.unwrap();
    let loaded = store(&blobs).load(&record.id).await.unwrap();

    assert!(loaded.record.audit_log().is_empty());
    assert_eq!(loaded.record.latest_meeting_reference(), None);
}

#[tokio::test]
async fn scheduled_entry_without_resource_id_is_rejected() {
    let world = World::new();
    let id = RecordId::new("CHG-501");
    world.submit_scheduled("CHG-501", "Patch window").await;
    let puts = world.blobs.put_count();
    let at = world.clock.now();

    let err = world
        .engine
        .store()
        .update(&world.ctx(), &id, |record| {
            record.append(ModificationEntry::meeting_scheduled(
                at,
                ActorId::new("change-ledger"),
                meeting("  "),
            ))
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UpdateError::Rejected {
            source: ValidationError::MissingResourceId,
            ..
        }
    ));
    assert_eq!(world.blobs.put_count(), puts);
}

#[tokio::test]
async fn backdated_entry_is_rejected() {
    let world = World::new();
    let id = RecordId::new("CHG-502");
    world.submit_scheduled("CHG-502", "Patch window").await;
    let earlier = world.clock.now() - chrono::Duration::hours(1);

    let err = world
        .engine
        .store()
        .update(&world.ctx(), &id, |record| {
            record.append(ModificationEntry::approved(earlier, ActorId::new("alice")))
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UpdateError::Rejected {
            source: ValidationError::OutOfOrder { .. },
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Fatal);
}

#[tokio::test]
async fn hand_edited_status_is_refused_on_load() {
    let blobs = FakeBlobStore::new();
    let record = ChangeRecord::new(RecordId::new("CHG-503"), ChangeDetails::new("Tampered"))
        .unwrap()
        .append(ModificationEntry::submitted(
            window_start(),
            ActorId::new("ingest"),
        ))
        .unwrap();
    store(&blobs).create(&record).await.unwrap();

    let key = "changes/CHG-503.json";
    let raw = String::from_utf8(blobs.raw(key).unwrap()).unwrap();
    let edited = raw.replace("\"status\": \"submitted\"", "\"status\": \"processed\"");
    assert_ne!(raw, edited);
    blobs.overwrite(key, edited.into_bytes());

    let err = store(&blobs).load(&record.id).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Invalid {
            source: ValidationError::Inconsistent { field: "status" },
            ..
        }
    ));
    assert_eq!(err.class(), ErrorClass::Fatal);
}

#[tokio::test]
async fn meeting_reference_ignores_cancellations() {
    let world = World::new();
    world.submit_scheduled("CHG-504", "Patch window").await;
    let created = world.reconcile("CHG-504").await.unwrap();
    world
        .engine
        .cancel_meeting(&world.ctx(), &RecordId::new("CHG-504"))
        .await
        .unwrap();

    let record = world.record("CHG-504").await;

    // the log still names the last scheduled meeting
    assert_eq!(record.latest_meeting_reference(), Some(&created.meeting));
}
