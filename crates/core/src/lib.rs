// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ledger-core: domain types for the change ledger
//!
//! This crate provides:
//! - Change records, modification entries and the append-only audit log
//! - Meeting references and desired meeting state
//! - Error classification and bounded retry with backoff
//! - Per-invocation context (actor, cancellation, deadline)
//! - Clock and id abstractions, configuration

pub mod clock;
pub mod id;

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod retry;

// Record model (order matters for dependencies)
pub mod audit;
pub mod entry;
pub mod meeting;
pub mod recipients;
pub mod record;

// Re-exports
pub use audit::AuditLog;
pub use classify::{Classify, ErrorClass};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, LedgerConfig, LoggingConfig};
pub use context::{Interrupt, Invocation};
pub use entry::{ModificationEntry, ModificationKind};
pub use error::ValidationError;
pub use id::{ActorId, IdGen, RecordId, SequentialIdGen, UuidIdGen};
pub use meeting::{DesiredMeeting, MeetingRef, MeetingWindow};
pub use recipients::{filter_recipients, AllowList, FilteredRecipients};
pub use record::{ChangeDetails, ChangeMetadata, ChangeRecord, ChangeStatus};
pub use retry::{RetryError, RetryPolicy};
