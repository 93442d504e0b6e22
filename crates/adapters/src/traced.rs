// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::calendar::{CalendarAdapter, CalendarError};
use async_trait::async_trait;
use ledger_core::{Classify, DesiredMeeting, MeetingRef};
use ledger_storage::{Blob, BlobError, BlobStore, VersionToken};
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any CalendarAdapter
#[derive(Clone)]
pub struct TracedCalendarAdapter<C> {
    inner: C,
}

impl<C> TracedCalendarAdapter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: CalendarAdapter> CalendarAdapter for TracedCalendarAdapter<C> {
    async fn create(&self, desired: &DesiredMeeting) -> Result<MeetingRef, CalendarError> {
        let span = tracing::info_span!("calendar.create", subject = %desired.subject);

        async {
            tracing::info!(
                start = %desired.start,
                end = %desired.end,
                attendees = desired.attendees.len(),
                "creating meeting"
            );

            // Precondition: the service rejects empty or inverted windows
            if desired.end <= desired.start {
                tracing::error!("meeting ends before it starts");
                return Err(CalendarError::Rejected(format!(
                    "meeting ends before it starts: {} .. {}",
                    desired.start, desired.end
                )));
            }

            let start = Instant::now();
            let result = self.inner.create(desired).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(meeting) => tracing::info!(meeting_id = %meeting.id, elapsed_ms, "meeting created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, class = %e.class(), "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn update(
        &self,
        meeting: &MeetingRef,
        desired: &DesiredMeeting,
    ) -> Result<(), CalendarError> {
        let span = tracing::info_span!("calendar.update", meeting_id = %meeting.id);

        async {
            tracing::info!(subject = %desired.subject, "updating meeting");

            // Precondition: there must be something to update
            if meeting.id.trim().is_empty() {
                tracing::error!("meeting reference has no id");
                return Err(CalendarError::Rejected(
                    "meeting reference has no id".to_string(),
                ));
            }

            let start = Instant::now();
            let result = self.inner.update(meeting, desired).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "meeting updated"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, class = %e.class(), "update failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, meeting: &MeetingRef) -> Result<(), CalendarError> {
        let span = tracing::info_span!("calendar.delete", meeting_id = %meeting.id);

        async {
            let start = Instant::now();
            let result = self.inner.delete(meeting).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // A meeting that is already gone is often fine for the caller
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "meeting deleted"),
                Err(CalendarError::NotFound(_)) => {
                    tracing::warn!(elapsed_ms, "meeting already gone (may be expected)")
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, class = %e.class(), "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any BlobStore
#[derive(Clone)]
pub struct TracedBlobStore<B> {
    inner: B,
}

impl<B> TracedBlobStore<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: BlobStore> BlobStore for TracedBlobStore<B> {
    async fn get(&self, key: &str) -> Result<Blob, BlobError> {
        let span = tracing::debug_span!("blob.get", key);

        async {
            let start = Instant::now();
            let result = self.inner.get(key).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(blob) => tracing::debug!(
                    version = %blob.version,
                    bytes = blob.bytes.len(),
                    elapsed_ms,
                    "read"
                ),
                Err(BlobError::NotFound(_)) => tracing::debug!(elapsed_ms, "not found"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, class = %e.class(), "read failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        if_match: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError> {
        let span = tracing::debug_span!(
            "blob.put",
            key,
            bytes = bytes.len(),
            if_match = if_match.map(VersionToken::as_str).unwrap_or("<absent>")
        );

        async move {
            let start = Instant::now();
            let result = self.inner.put(key, bytes, if_match).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            // Lost races are routine under contention
            match &result {
                Ok(version) => tracing::debug!(%version, elapsed_ms, "written"),
                Err(BlobError::PreconditionFailed(_)) => {
                    tracing::debug!(elapsed_ms, "precondition failed")
                }
                Err(e) => tracing::warn!(elapsed_ms, error = %e, class = %e.class(), "write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
