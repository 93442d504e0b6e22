// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned change-record store
//!
//! Records are stored whole, as JSON, one blob per record. Every write is
//! conditioned on the version token from the load it is based on, so a
//! write either lands on exactly the state its author saw or not at all.

use crate::blob::{BlobError, BlobStore, VersionToken};
use ledger_core::{
    ChangeRecord, Classify, ErrorClass, Invocation, RecordId, RetryError, RetryPolicy,
    ValidationError,
};
use std::fmt;
use thiserror::Error;
use tracing::Instrument;

/// Errors from a single load or store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("change record not found: {0}")]
    NotFound(RecordId),
    #[error("change record already exists: {0}")]
    AlreadyExists(RecordId),
    #[error("version conflict writing {0}")]
    VersionConflict(RecordId),
    #[error("blob store error: {0}")]
    Blob(#[source] BlobError),
    #[error("corrupt change record {id}: {source}")]
    Decode {
        id: RecordId,
        source: serde_json::Error,
    },
    #[error("failed to encode change record {id}: {source}")]
    Encode {
        id: RecordId,
        source: serde_json::Error,
    },
    #[error("invalid change record {id}: {source}")]
    Invalid {
        id: RecordId,
        source: ValidationError,
    },
}

impl Classify for StoreError {
    fn class(&self) -> ErrorClass {
        match self {
            StoreError::VersionConflict(_) => ErrorClass::Retryable,
            StoreError::Blob(e) => e.class(),
            StoreError::NotFound(_)
            | StoreError::AlreadyExists(_)
            | StoreError::Decode { .. }
            | StoreError::Encode { .. }
            | StoreError::Invalid { .. } => ErrorClass::Fatal,
        }
    }
}

/// Errors from [`VersionedRecordStore::update_with_retry`]
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("gave up updating {id} after {attempts} conflicting attempts")]
    ConcurrencyExhausted { id: RecordId, attempts: u32 },
    #[error("mutation of {id} rejected: {source}")]
    Rejected {
        id: RecordId,
        source: ValidationError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("update of {id} cancelled")]
    Cancelled { id: RecordId },
    #[error("deadline exceeded updating {id}")]
    DeadlineExceeded { id: RecordId },
}

impl Classify for UpdateError {
    fn class(&self) -> ErrorClass {
        match self {
            UpdateError::ConcurrencyExhausted { .. } | UpdateError::Rejected { .. } => {
                ErrorClass::Fatal
            }
            UpdateError::Store(e) => e.class(),
            UpdateError::Cancelled { .. } | UpdateError::DeadlineExceeded { .. } => {
                ErrorClass::Retryable
            }
        }
    }
}

/// A record together with the version it was loaded at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned {
    pub record: ChangeRecord,
    pub version: VersionToken,
}

/// Outcome of one load-mutate-store attempt.
///
/// Only a conflict is worth another attempt; everything else ends the
/// update no matter how the underlying error would classify on its own.
enum Attempt {
    Conflict(StoreError),
    Abort(UpdateError),
}

impl Attempt {
    fn into_update_error(self) -> UpdateError {
        match self {
            Attempt::Conflict(e) => UpdateError::Store(e),
            Attempt::Abort(e) => e,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Conflict(e) => write!(f, "{}", e),
            Attempt::Abort(e) => write!(f, "{}", e),
        }
    }
}

impl Classify for Attempt {
    fn class(&self) -> ErrorClass {
        match self {
            Attempt::Conflict(_) => ErrorClass::Retryable,
            Attempt::Abort(_) => ErrorClass::Fatal,
        }
    }
}

/// Load/store of change records guarded by version tokens
#[derive(Clone)]
pub struct VersionedRecordStore<B> {
    blobs: B,
    policy: RetryPolicy,
}

impl<B: BlobStore> VersionedRecordStore<B> {
    pub fn new(blobs: B) -> Self {
        Self {
            blobs,
            policy: RetryPolicy::record_updates(),
        }
    }

    /// Backoff used between conflicting attempts
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    fn key(id: &RecordId) -> String {
        format!("changes/{}.json", id)
    }

    /// Load a record and the version it was read at
    pub async fn load(&self, id: &RecordId) -> Result<Versioned, StoreError> {
        let blob = match self.blobs.get(&Self::key(id)).await {
            Ok(blob) => blob,
            Err(BlobError::NotFound(_)) => return Err(StoreError::NotFound(id.clone())),
            Err(e) => return Err(StoreError::Blob(e)),
        };

        let record: ChangeRecord =
            serde_json::from_slice(&blob.bytes).map_err(|source| StoreError::Decode {
                id: id.clone(),
                source,
            })?;
        if record.id != *id {
            return Err(StoreError::Invalid {
                id: id.clone(),
                source: ValidationError::Inconsistent { field: "id" },
            });
        }
        record.validate().map_err(|source| StoreError::Invalid {
            id: id.clone(),
            source,
        })?;

        tracing::trace!(%id, version = %blob.version, entries = record.audit_log().len(), "loaded");
        Ok(Versioned {
            record,
            version: blob.version,
        })
    }

    /// Write `record` under `id` if the stored version is still `version`
    pub async fn store(
        &self,
        id: &RecordId,
        record: &ChangeRecord,
        version: &VersionToken,
    ) -> Result<VersionToken, StoreError> {
        let bytes = self.encode(id, record)?;
        match self.blobs.put(&Self::key(id), bytes, Some(version)).await {
            Ok(next) => {
                tracing::trace!(%id, version = %next, "stored");
                Ok(next)
            }
            Err(BlobError::PreconditionFailed(_)) => Err(StoreError::VersionConflict(id.clone())),
            Err(e) => Err(StoreError::Blob(e)),
        }
    }

    /// Write a record that must not exist yet
    pub async fn create(&self, record: &ChangeRecord) -> Result<VersionToken, StoreError> {
        let id = &record.id;
        let bytes = self.encode(id, record)?;
        match self.blobs.put(&Self::key(id), bytes, None).await {
            Ok(version) => {
                tracing::debug!(%id, %version, "created");
                Ok(version)
            }
            Err(BlobError::PreconditionFailed(_)) => Err(StoreError::AlreadyExists(id.clone())),
            Err(e) => Err(StoreError::Blob(e)),
        }
    }

    fn encode(&self, id: &RecordId, record: &ChangeRecord) -> Result<Vec<u8>, StoreError> {
        if record.id != *id {
            return Err(StoreError::Invalid {
                id: id.clone(),
                source: ValidationError::Inconsistent { field: "id" },
            });
        }
        record.validate().map_err(|source| StoreError::Invalid {
            id: id.clone(),
            source,
        })?;
        serde_json::to_vec_pretty(record).map_err(|source| StoreError::Encode {
            id: id.clone(),
            source,
        })
    }

    /// [`update_with_retry`](Self::update_with_retry) with the configured budget
    pub async fn update<F>(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        mutate: F,
    ) -> Result<ChangeRecord, UpdateError>
    where
        F: Fn(ChangeRecord) -> Result<ChangeRecord, ValidationError> + Send + Sync,
    {
        self.update_with_retry(ctx, id, self.policy.max_attempts, mutate)
            .await
    }

    /// Load, mutate, and conditionally store, retrying on conflict.
    ///
    /// Every attempt starts from a fresh load and writes with that load's
    /// token, so a write never lands on top of a peer's write it has not
    /// seen. Only version conflicts are retried. A mutation that returns
    /// the record unchanged skips the write.
    pub async fn update_with_retry<F>(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        max_attempts: u32,
        mutate: F,
    ) -> Result<ChangeRecord, UpdateError>
    where
        F: Fn(ChangeRecord) -> Result<ChangeRecord, ValidationError> + Send + Sync,
    {
        self.run_update(ctx, id, max_attempts, false, mutate).await
    }

    /// [`update`](Self::update) for recording an external effect that has
    /// already happened.
    ///
    /// The first attempt runs even if the invocation was cancelled or hit
    /// its deadline after the effect, so the record is not left without
    /// it. Cancellation still stops conflict retries.
    pub async fn update_after_effect<F>(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        mutate: F,
    ) -> Result<ChangeRecord, UpdateError>
    where
        F: Fn(ChangeRecord) -> Result<ChangeRecord, ValidationError> + Send + Sync,
    {
        self.run_update(ctx, id, self.policy.max_attempts, true, mutate)
            .await
    }

    async fn run_update<F>(
        &self,
        ctx: &Invocation,
        id: &RecordId,
        max_attempts: u32,
        at_least_once: bool,
        mutate: F,
    ) -> Result<ChangeRecord, UpdateError>
    where
        F: Fn(ChangeRecord) -> Result<ChangeRecord, ValidationError> + Send + Sync,
    {
        let span = tracing::info_span!("record.update", %id, max_attempts);
        let policy = self.policy.clone().with_max_attempts(max_attempts);
        let mutate = &mutate;
        let op = |attempt: u32| async move { self.try_update(id, attempt, mutate).await };

        let result = if at_least_once {
            policy
                .attempt_at_least_once(ctx, "record.update", op)
                .instrument(span.clone())
                .await
        } else {
            policy
                .attempt(ctx, "record.update", op)
                .instrument(span.clone())
                .await
        };

        let _guard = span.enter();
        match result {
            Ok(record) => Ok(record),
            Err(RetryError::Exhausted { attempts, .. }) => {
                tracing::warn!(attempts, "concurrency budget exhausted");
                Err(UpdateError::ConcurrencyExhausted {
                    id: id.clone(),
                    attempts,
                })
            }
            Err(RetryError::Aborted(attempt)) => {
                let e = attempt.into_update_error();
                tracing::warn!(error = %e, class = %e.class(), "update aborted");
                Err(e)
            }
            Err(RetryError::Cancelled { .. }) => Err(UpdateError::Cancelled { id: id.clone() }),
            Err(RetryError::DeadlineExceeded { .. }) => {
                Err(UpdateError::DeadlineExceeded { id: id.clone() })
            }
        }
    }

    async fn try_update<F>(
        &self,
        id: &RecordId,
        attempt: u32,
        mutate: &F,
    ) -> Result<ChangeRecord, Attempt>
    where
        F: Fn(ChangeRecord) -> Result<ChangeRecord, ValidationError>,
    {
        let loaded = self
            .load(id)
            .await
            .map_err(|e| Attempt::Abort(UpdateError::Store(e)))?;

        let updated = mutate(loaded.record.clone()).map_err(|source| {
            Attempt::Abort(UpdateError::Rejected {
                id: id.clone(),
                source,
            })
        })?;

        if updated == loaded.record {
            tracing::debug!(attempt, "mutation is a no-op, skipping write");
            return Ok(updated);
        }

        match self.store(id, &updated, &loaded.version).await {
            Ok(_) => {
                tracing::debug!(attempt, entries = updated.audit_log().len(), "updated");
                Ok(updated)
            }
            Err(e @ StoreError::VersionConflict(_)) => {
                tracing::debug!(attempt, "version conflict");
                Err(Attempt::Conflict(e))
            }
            Err(e) => Err(Attempt::Abort(UpdateError::Store(e))),
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
