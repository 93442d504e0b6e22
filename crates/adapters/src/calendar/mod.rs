// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External calendar adapters

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CalendarCall, CalendarOp, FakeCalendarAdapter, FakeMeeting};

use async_trait::async_trait;
use ledger_core::{Classify, DesiredMeeting, ErrorClass, MeetingRef};
use thiserror::Error;

/// Errors from calendar operations
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("meeting not found: {0}")]
    NotFound(String),
    #[error("calendar throttled: {0}")]
    Throttled(String),
    #[error("calendar unreachable: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl Classify for CalendarError {
    fn class(&self) -> ErrorClass {
        match self {
            CalendarError::Throttled(_) | CalendarError::Network(_) => ErrorClass::Retryable,
            CalendarError::NotFound(_)
            | CalendarError::PermissionDenied(_)
            | CalendarError::Rejected(_) => ErrorClass::Fatal,
        }
    }
}

/// Adapter for the external calendar service
#[async_trait]
pub trait CalendarAdapter: Clone + Send + Sync + 'static {
    /// Create a meeting and return the service's reference to it
    async fn create(&self, desired: &DesiredMeeting) -> Result<MeetingRef, CalendarError>;

    /// Update an existing meeting in place, keeping its id and join link
    async fn update(
        &self,
        meeting: &MeetingRef,
        desired: &DesiredMeeting,
    ) -> Result<(), CalendarError>;

    /// Delete a meeting; `NotFound` when it is already gone
    async fn delete(&self, meeting: &MeetingRef) -> Result<(), CalendarError>;
}
