// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change lifecycle transitions driven by the ingestion layer
//!
//! Deliveries are at-least-once, so every transition is idempotent: a
//! redelivered message finds its entry already in the log and writes
//! nothing.

use crate::error::LedgerError;
use ledger_core::{
    ChangeDetails, ChangeRecord, Clock, Invocation, ModificationEntry, ModificationKind,
    RecordId,
};
use ledger_storage::{BlobStore, StoreError, VersionedRecordStore};
use tracing::Instrument;

/// Entry point for record lifecycle changes
#[derive(Clone)]
pub struct Ledger<B, K> {
    store: VersionedRecordStore<B>,
    clock: K,
}

impl<B, K> Ledger<B, K>
where
    B: BlobStore,
    K: Clock,
{
    pub fn new(store: VersionedRecordStore<B>, clock: K) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &VersionedRecordStore<B> {
        &self.store
    }

    /// Create a change with its `Submitted` entry.
    ///
    /// If the change already exists the stored record is returned as is,
    /// even when `details` differ; use [`update_details`](Self::update_details)
    /// to change them.
    pub async fn submit(
        &self,
        ctx: &Invocation,
        id: RecordId,
        details: ChangeDetails,
    ) -> Result<ChangeRecord, LedgerError> {
        let span = tracing::info_span!(
            "ledger.submit",
            %id,
            invocation = ctx.id(),
            actor = %ctx.actor()
        );

        async move {
            ctx.check()
                .map_err(|interrupt| LedgerError::interrupted("submit", interrupt))?;

            let record = ChangeRecord::new(id.clone(), details)?.append(
                ModificationEntry::submitted(self.clock.now(), ctx.actor().clone()),
            )?;

            match self.store.create(&record).await {
                Ok(_) => {
                    tracing::info!("change submitted");
                    Ok(record)
                }
                Err(StoreError::AlreadyExists(_)) => {
                    tracing::info!("change already submitted");
                    Ok(self.store.load(&id).await?.record)
                }
                Err(e) => Err(e.into()),
            }
        }
        .instrument(span)
        .await
    }

    pub async fn approve(
        &self,
        ctx: &Invocation,
        id: &RecordId,
    ) -> Result<ChangeRecord, LedgerError> {
        self.transition(ctx, id, ModificationKind::Approved).await
    }

    /// Record that the change was carried out for `scope`.
    ///
    /// A change may be processed for several scopes; each is recorded once.
    pub async fn mark_processed(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        scope: &str,
    ) -> Result<ChangeRecord, LedgerError> {
        self.transition(
            ctx,
            id,
            ModificationKind::Processed {
                scope: scope.to_string(),
            },
        )
        .await
    }

    pub async fn cancel(&self, ctx: &Invocation, id: &RecordId) -> Result<ChangeRecord, LedgerError> {
        self.transition(ctx, id, ModificationKind::Cancelled).await
    }

    /// Replace the descriptive fields of a change.
    ///
    /// Status and audit log are untouched; no entry is appended.
    pub async fn update_details(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        details: ChangeDetails,
    ) -> Result<ChangeRecord, LedgerError> {
        details.validate()?;
        let span = tracing::info_span!(
            "ledger.update_details",
            %id,
            invocation = ctx.id(),
            actor = %ctx.actor()
        );
        let record = self
            .store
            .update(ctx, id, |record| record.with_details(details.clone()))
            .instrument(span)
            .await?;
        Ok(record)
    }

    async fn transition(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        kind: ModificationKind,
    ) -> Result<ChangeRecord, LedgerError> {
        let span = tracing::info_span!(
            "ledger.transition",
            %id,
            entry = kind.name(),
            invocation = ctx.id(),
            actor = %ctx.actor()
        );
        let actor = ctx.actor();
        let kind = &kind;

        let record = self
            .store
            .update(ctx, id, |record| {
                if record.audit_log().iter().any(|e| &e.kind == kind) {
                    return Ok(record);
                }
                let at = record.audit_log().next_timestamp(self.clock.now());
                record.append(ModificationEntry::new(at, actor.clone(), kind.clone()))
            })
            .instrument(span.clone())
            .await?;

        span.in_scope(|| tracing::info!(status = %record.status(), "transition applied"));
        Ok(record)
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
