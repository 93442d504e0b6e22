//! Shared fixtures for the behavioral specs

#![allow(dead_code)]

pub use chrono::{DateTime, TimeZone, Utc};
pub use ledger_adapters::{
    CalendarCall, CalendarError, CalendarOp, FakeCalendarAdapter, KnownIdentities,
    OriginClassifier, TracedBlobStore, TracedCalendarAdapter,
};
pub use ledger_core::{
    ActorId, AllowList, ChangeDetails, ChangeMetadata, ChangeRecord, ChangeStatus, Classify,
    Clock, DesiredMeeting, ErrorClass, FakeClock, Invocation, LedgerConfig, MeetingRef,
    MeetingWindow, ModificationEntry, ModificationKind, RecordId, ValidationError,
};
pub use ledger_engine::{
    CancelOutcome, Ledger, LedgerError, ReconcileOutcome, Reconciled, ReconciliationEngine,
};
pub use ledger_storage::{
    BlobStore, FakeBlobStore, FileBlobStore, StoreError, UpdateError, VersionedRecordStore,
};
pub use similar_asserts::assert_eq;
pub use std::time::Duration;

/// Retry budgets short enough for tests
pub const TEST_CONFIG: &str = r#"
actor = "change-ledger"

[record_updates]
max_attempts = 5
base_delay = "10ms"
max_delay = "200ms"

[calendar_calls]
max_attempts = 3
base_delay = "10ms"
"#;

pub fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap()
}

pub fn window() -> MeetingWindow {
    MeetingWindow::new(window_start(), window_start() + chrono::Duration::hours(1)).unwrap()
}

pub type Engine = ReconciliationEngine<
    TracedBlobStore<FakeBlobStore>,
    TracedCalendarAdapter<FakeCalendarAdapter>,
    FakeClock,
>;

/// A ledger and reconciliation engine wired to in-memory fakes
pub struct World {
    pub config: LedgerConfig,
    pub blobs: FakeBlobStore,
    pub calendar: FakeCalendarAdapter,
    pub clock: FakeClock,
    pub ledger: Ledger<TracedBlobStore<FakeBlobStore>, FakeClock>,
    pub engine: Engine,
    pub allow_list: AllowList,
}

impl World {
    pub fn new() -> Self {
        let config = LedgerConfig::from_toml_str(TEST_CONFIG).unwrap();
        let blobs = FakeBlobStore::new();
        let calendar = FakeCalendarAdapter::new();
        let clock = FakeClock::new();

        let store = VersionedRecordStore::new(TracedBlobStore::new(blobs.clone()))
            .with_policy(config.record_updates.clone());
        let ledger = Ledger::new(store.clone(), clock.clone());
        let engine = ReconciliationEngine::new(
            store,
            TracedCalendarAdapter::new(calendar.clone()),
            clock.clone(),
        )
        .with_calendar_policy(config.calendar_calls.clone());

        Self {
            config,
            blobs,
            calendar,
            clock,
            ledger,
            engine,
            allow_list: AllowList::new(["@example.com"]),
        }
    }

    /// Invocation acting as the configured service actor
    pub fn ctx(&self) -> Invocation {
        Invocation::new(self.config.actor_id())
    }

    /// Submit a change with a one-hour window and the given title
    pub async fn submit_scheduled(&self, id: &str, title: &str) -> ChangeRecord {
        let details = ChangeDetails::new(title)
            .with_window(window())
            .with_participants(["ops@example.com", "noc@example.com", "vendor@elsewhere.net"]);
        self.ledger
            .submit(&self.ctx(), RecordId::new(id), details)
            .await
            .unwrap()
    }

    /// Desired meeting for the change as currently stored
    pub async fn desired(&self, id: &str) -> DesiredMeeting {
        let record = self.record(id).await;
        DesiredMeeting::from_record(&record, &self.allow_list).unwrap()
    }

    pub async fn record(&self, id: &str) -> ChangeRecord {
        self.engine
            .store()
            .load(&RecordId::new(id))
            .await
            .unwrap()
            .record
    }

    pub async fn reconcile(&self, id: &str) -> Result<Reconciled, LedgerError> {
        let desired = self.desired(id).await;
        self.engine
            .reconcile(&self.ctx(), &RecordId::new(id), &desired)
            .await
    }

    /// Change the title of a stored change, leaving everything else alone
    pub async fn retitle(&self, id: &str, title: &str) {
        let record = self.record(id).await;
        let mut details = record.details();
        details.title = title.to_string();
        self.ledger
            .update_details(&self.ctx(), &RecordId::new(id), details)
            .await
            .unwrap();
    }
}
