// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation errors for records and audit entries

use crate::classify::{Classify, ErrorClass};
use crate::record::ChangeStatus;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A record or entry invariant was violated.
///
/// Always fatal: the same input will fail the same way every time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entry} entry has no timestamp")]
    MissingTimestamp { entry: &'static str },
    #[error("{entry} entry has no actor")]
    MissingActor { entry: &'static str },
    #[error("meeting_scheduled entry has an empty resource id")]
    MissingResourceId,
    #[error("processed entry has an empty actor scope")]
    MissingScope,
    #[error("entry at {attempted} is earlier than the last entry at {previous}")]
    OutOfOrder {
        previous: DateTime<Utc>,
        attempted: DateTime<Utc>,
    },
    #[error("cannot move change from {from} to {to}")]
    IllegalTransition { from: ChangeStatus, to: ChangeStatus },
    #[error("meeting window ends at {end}, not after its start {start}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("change title is empty")]
    MissingTitle,
    #[error("stored {field} does not match the audit log")]
    Inconsistent { field: &'static str },
    #[error("unsupported metadata schema version {0}")]
    UnsupportedSchema(u32),
}

impl Classify for ValidationError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Fatal
    }
}
