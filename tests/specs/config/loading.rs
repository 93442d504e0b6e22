//! Configuration loading specs
//!
//! Verify config files drive the actor and retry budgets of a running ledger.

use crate::prelude::*;
use crate::prelude::assert_eq;
use ledger_core::ConfigError;
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn file_config_is_loaded() {
    let file = write_config(TEST_CONFIG);

    let config = LedgerConfig::load(file.path()).unwrap();

    assert_eq!(config.actor_id(), ActorId::new("change-ledger"));
    assert_eq!(config.record_updates.max_attempts, 5);
    assert_eq!(config.record_updates.max_delay, Some(Duration::from_millis(200)));
    assert_eq!(config.calendar_calls.base_delay, Duration::from_millis(10));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = LedgerConfig::load(&dir.path().join("ledger.toml")).unwrap_err();

    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn zero_attempt_budget_is_rejected() {
    let file = write_config(
        r#"
        [calendar_calls]
        max_attempts = 0
        base_delay = "1s"
        "#,
    );

    let err = LedgerConfig::load(file.path()).unwrap_err();

    assert!(err.to_string().contains("calendar_calls.max_attempts"));
}

#[tokio::test(start_paused = true)]
async fn configured_actor_signs_every_entry() {
    let file = write_config("actor = \"ledger-eu\"\n");
    let config = LedgerConfig::load(file.path()).unwrap();
    let blobs = FakeBlobStore::new();
    let ledger = Ledger::new(
        VersionedRecordStore::new(blobs).with_policy(config.record_updates.clone()),
        FakeClock::new(),
    );
    let ctx = Invocation::new(config.actor_id());
    let id = RecordId::new("CHG-600");

    ledger
        .submit(&ctx, id.clone(), ChangeDetails::new("Regional failover"))
        .await
        .unwrap();
    let record = ledger.approve(&ctx, &id).await.unwrap();

    assert!(record
        .audit_log()
        .iter()
        .all(|e| e.actor.as_str() == "ledger-eu"));
}

#[test]
fn configured_filter_reaches_subscriber_setup() {
    let config = LedgerConfig::from_toml_str("[logging]\nfilter = \"warn,ledger_engine=trace\"\n")
        .unwrap();

    // RUST_LOG takes precedence when the test runner sets it
    if std::env::var_os("RUST_LOG").is_none() {
        let filter = ledger_engine::env_filter(&config.logging).to_string();
        assert!(filter.contains("ledger_engine=trace"), "filter: {}", filter);
    }
}
