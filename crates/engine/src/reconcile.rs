// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting reconciliation
//!
//! Brings the external calendar in line with what a change record says the
//! meeting should be. The calendar call always happens first; the record is
//! only written once the call succeeded, so the log never references a
//! meeting that was not created or updated.

use crate::error::LedgerError;
use ledger_adapters::{CalendarAdapter, CalendarError};
use ledger_core::{
    ChangeRecord, Clock, DesiredMeeting, Invocation, MeetingRef, ModificationEntry,
    ModificationKind, RecordId, RetryPolicy,
};
use ledger_storage::{BlobStore, VersionedRecordStore};
use std::future::Future;
use tracing::Instrument;

/// What reconciliation did to the calendar
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No meeting existed; one was created
    Created,
    /// The existing meeting was updated in place
    Updated { reason: String },
    /// The meeting already matched; nothing was called or written
    Unchanged,
    /// Updating failed, so a replacement was created. The original meeting
    /// is left in the calendar.
    Recreated { reason: String, orphaned: String },
}

/// Result of [`ReconciliationEngine::reconcile`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciled {
    pub meeting: MeetingRef,
    pub outcome: ReconcileOutcome,
    pub record: ChangeRecord,
}

/// What [`ReconciliationEngine::cancel_meeting`] did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    Deleted { meeting_id: String },
    /// The calendar no longer had the meeting
    AlreadyGone { meeting_id: String },
    /// No meeting was ever scheduled, or it was already cancelled
    NothingScheduled,
}

/// Keeps a change's calendar meeting in line with the change
#[derive(Clone)]
pub struct ReconciliationEngine<B, C, K> {
    store: VersionedRecordStore<B>,
    calendar: C,
    clock: K,
    calendar_policy: RetryPolicy,
}

impl<B, C, K> ReconciliationEngine<B, C, K>
where
    B: BlobStore,
    C: CalendarAdapter,
    K: Clock,
{
    pub fn new(store: VersionedRecordStore<B>, calendar: C, clock: K) -> Self {
        Self {
            store,
            calendar,
            clock,
            calendar_policy: RetryPolicy::calendar_calls(),
        }
    }

    /// Budget for retrying throttled or unreachable calendar calls
    pub fn with_calendar_policy(mut self, policy: RetryPolicy) -> Self {
        self.calendar_policy = policy;
        self
    }

    pub fn store(&self) -> &VersionedRecordStore<B> {
        &self.store
    }

    /// Make the calendar match `desired` and record the result.
    ///
    /// Idempotent: reconciling twice with the same desired state returns
    /// the same meeting, and the second call makes no external calls and
    /// writes nothing.
    pub async fn reconcile(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        desired: &DesiredMeeting,
    ) -> Result<Reconciled, LedgerError> {
        let span = tracing::info_span!(
            "reconcile",
            %id,
            invocation = ctx.id(),
            actor = %ctx.actor()
        );
        self.reconcile_inner(ctx, id, desired)
            .instrument(span)
            .await
    }

    async fn reconcile_inner(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        desired: &DesiredMeeting,
    ) -> Result<Reconciled, LedgerError> {
        let current = self.store.load(id).await?;

        let Some(existing) = current.record.latest_meeting_reference() else {
            let meeting = self
                .calendar_call(ctx, "create", move |_| self.calendar.create(desired))
                .await?;
            tracing::info!(meeting_id = %meeting.id, "meeting created");
            let record = self.record_meeting(ctx, id, &meeting).await?;
            return Ok(Reconciled {
                meeting,
                outcome: ReconcileOutcome::Created,
                record,
            });
        };

        let Some(reason) = existing.diff(desired) else {
            tracing::debug!(meeting_id = %existing.id, "meeting up to date");
            return Ok(Reconciled {
                meeting: existing.clone(),
                outcome: ReconcileOutcome::Unchanged,
                record: current.record.clone(),
            });
        };

        tracing::info!(meeting_id = %existing.id, %reason, "meeting out of date");
        let updated = self
            .calendar_call(ctx, "update", move |_| {
                self.calendar.update(existing, desired)
            })
            .await;

        match updated {
            Ok(()) => {
                let meeting = existing.refreshed(desired);
                let record = self.record_meeting(ctx, id, &meeting).await?;
                Ok(Reconciled {
                    meeting,
                    outcome: ReconcileOutcome::Updated { reason },
                    record,
                })
            }
            Err(e) if e.is_interrupted() => Err(e),
            Err(e) => {
                tracing::warn!(
                    meeting_id = %existing.id,
                    error = %e,
                    "update failed, creating a replacement meeting"
                );
                let meeting = self
                    .calendar_call(ctx, "create", move |_| self.calendar.create(desired))
                    .await?;
                tracing::warn!(
                    orphaned = %existing.id,
                    replacement = %meeting.id,
                    "original meeting left orphaned"
                );
                let record = self.record_meeting(ctx, id, &meeting).await?;
                Ok(Reconciled {
                    meeting,
                    outcome: ReconcileOutcome::Recreated {
                        reason,
                        orphaned: existing.id.clone(),
                    },
                    record,
                })
            }
        }
    }

    /// Delete the change's meeting and record the cancellation.
    ///
    /// The delete targets the latest scheduled meeting even when a
    /// cancellation was already recorded, so a redelivery after a failed
    /// delete tries again. A meeting the calendar no longer has counts as
    /// deleted. Any other delete failure is still recorded as a
    /// cancellation before the error is returned. The cancellation entry
    /// is written at most once per scheduled meeting.
    pub async fn cancel_meeting(
        &self,
        ctx: &Invocation,
        id: &RecordId,
    ) -> Result<CancelOutcome, LedgerError> {
        let span = tracing::info_span!(
            "cancel_meeting",
            %id,
            invocation = ctx.id(),
            actor = %ctx.actor()
        );
        self.cancel_inner(ctx, id).instrument(span).await
    }

    async fn cancel_inner(
        &self,
        ctx: &Invocation,
        id: &RecordId,
    ) -> Result<CancelOutcome, LedgerError> {
        let current = self.store.load(id).await?;
        let Some(meeting) = current.record.latest_meeting_reference() else {
            tracing::debug!("no meeting was ever scheduled");
            return Ok(CancelOutcome::NothingScheduled);
        };
        let meeting_id = meeting.id.clone();

        let deleted = self
            .calendar_call(ctx, "delete", move |_| self.calendar.delete(meeting))
            .await;

        let outcome = match deleted {
            Ok(()) => CancelOutcome::Deleted { meeting_id },
            Err(e) if matches!(e.calendar_error(), Some(CalendarError::NotFound(_))) => {
                tracing::info!(%meeting_id, "meeting already gone");
                CancelOutcome::AlreadyGone { meeting_id }
            }
            Err(e) if e.is_interrupted() => return Err(e),
            Err(e) => {
                tracing::warn!(%meeting_id, error = %e, "delete failed, recording cancellation anyway");
                self.record_cancellation(ctx, id).await?;
                return Err(e);
            }
        };

        self.record_cancellation(ctx, id).await?;
        Ok(outcome)
    }

    async fn calendar_call<T, F, Fut>(
        &self,
        ctx: &Invocation,
        operation: &'static str,
        op: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CalendarError>>,
    {
        self.calendar_policy
            .attempt(ctx, operation, op)
            .await
            .map_err(|e| LedgerError::calendar(operation, e))
    }

    async fn record_meeting(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        meeting: &MeetingRef,
    ) -> Result<ChangeRecord, LedgerError> {
        let actor = ctx.actor();
        let record = self
            .store
            .update_after_effect(ctx, id, |record| {
                // Redelivered or raced: the log already points at this meeting
                if record.latest_meeting_reference() == Some(meeting) {
                    return Ok(record);
                }
                let at = record.audit_log().next_timestamp(self.clock.now());
                record.append(ModificationEntry::meeting_scheduled(
                    at,
                    actor.clone(),
                    meeting.clone(),
                ))
            })
            .await?;
        Ok(record)
    }

    async fn record_cancellation(
        &self,
        ctx: &Invocation,
        id: &RecordId,
    ) -> Result<ChangeRecord, LedgerError> {
        let actor = ctx.actor();
        let record = self
            .store
            .update_after_effect(ctx, id, |record| {
                if live_meeting(&record).is_none() {
                    return Ok(record);
                }
                let at = record.audit_log().next_timestamp(self.clock.now());
                record.append(ModificationEntry::meeting_cancelled(at, actor.clone()))
            })
            .await?;
        Ok(record)
    }
}

/// The scheduled meeting, unless a cancellation was recorded after it
fn live_meeting(record: &ChangeRecord) -> Option<&MeetingRef> {
    let latest = record.audit_log().latest_where(|k| {
        matches!(
            k,
            ModificationKind::MeetingScheduled { .. } | ModificationKind::MeetingCancelled
        )
    })?;
    match &latest.kind {
        ModificationKind::MeetingScheduled { meeting } => Some(meeting),
        _ => None,
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
