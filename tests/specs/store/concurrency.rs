//! Concurrent update specs
//!
//! Verify that racing writers never lose an entry, on both blob backends.

use crate::prelude::*;
use crate::prelude::assert_eq;
use ledger_core::RetryPolicy;
use std::sync::Arc;

fn approve_as(
    actor: String,
) -> impl Fn(ChangeRecord) -> Result<ChangeRecord, ValidationError> + Send + Sync {
    move |record| {
        let at = record.audit_log().next_timestamp(Utc::now());
        record.append(ModificationEntry::approved(at, ActorId::new(actor.clone())))
    }
}

fn seed() -> ChangeRecord {
    let record =
        ChangeRecord::new(RecordId::new("CHG-400"), ChangeDetails::new("Racing writers")).unwrap();
    record
        .append(ModificationEntry::submitted(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            ActorId::new("ingest"),
        ))
        .unwrap()
}

async fn race<B: BlobStore>(store: VersionedRecordStore<B>, writers: usize) -> ChangeRecord {
    let id = RecordId::new("CHG-400");
    store.create(&seed()).await.unwrap();
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for i in 0..writers {
        let store = Arc::clone(&store);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let ctx = Invocation::new(ActorId::new(format!("writer-{}", i)));
            store.update(&ctx, &id, approve_as(format!("writer-{}", i))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    store.load(&id).await.unwrap().record
}

fn assert_every_writer_once(record: &ChangeRecord, writers: usize) {
    assert_eq!(record.audit_log().len(), writers + 1);
    for i in 0..writers {
        let actor = ActorId::new(format!("writer-{}", i));
        let count = record
            .audit_log()
            .iter()
            .filter(|e| e.actor == actor)
            .count();
        assert_eq!(count, 1, "writer-{} appears {} times", i, count);
    }
}

#[tokio::test(start_paused = true)]
async fn racing_writers_on_fake_store_lose_nothing() {
    let blobs = FakeBlobStore::new().with_latency(Duration::from_millis(1));
    let store = VersionedRecordStore::new(blobs.clone()).with_policy(
        RetryPolicy::new(64, Duration::from_millis(20)).with_max_delay(Duration::from_secs(1)),
    );

    let record = race(store, 12).await;

    assert_every_writer_once(&record, 12);
    // at least one writer had to retry
    assert!(blobs.put_count() > 13);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_writers_on_file_store_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = FileBlobStore::open(dir.path()).unwrap();
    let store = VersionedRecordStore::new(blobs).with_policy(
        RetryPolicy::new(100, Duration::from_millis(2)).with_max_delay(Duration::from_millis(50)),
    );

    let record = race(store, 8).await;

    assert_every_writer_once(&record, 8);
}

#[tokio::test(start_paused = true)]
async fn persistent_contention_gives_up_with_fatal_error() {
    let world = World::new();
    world.submit_scheduled("CHG-401", "Hot record").await;
    world.blobs.inject_peer_writes(100);

    let err = world
        .ledger
        .approve(&world.ctx(), &RecordId::new("CHG-401"))
        .await
        .unwrap_err();

    match &err {
        LedgerError::Update(UpdateError::ConcurrencyExhausted { attempts, .. }) => {
            assert_eq!(*attempts, world.config.record_updates.max_attempts);
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
    assert_eq!(err.class(), ErrorClass::Fatal);
}

#[tokio::test(start_paused = true)]
async fn reconcile_retries_record_write_without_repeating_calendar_call() {
    let world = World::new();
    world.submit_scheduled("CHG-402", "Load balancer swap").await;
    let desired = world.desired("CHG-402").await;
    // peers write behind the next two reads, so the record write conflicts
    world.blobs.inject_peer_writes(2);

    let result = world
        .engine
        .reconcile(&world.ctx(), &RecordId::new("CHG-402"), &desired)
        .await
        .unwrap();

    assert_eq!(result.outcome, ReconcileOutcome::Created);
    assert_eq!(world.calendar.meeting_count(), 1);
    let creates = world
        .calendar
        .calls()
        .into_iter()
        .filter(|c| matches!(c, CalendarCall::Create { .. }))
        .count();
    assert_eq!(creates, 1);
}
