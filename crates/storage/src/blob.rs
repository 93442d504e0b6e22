// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob store boundary
//!
//! The ledger persists each record as one opaque blob. Every read returns a
//! version token; every write may be conditioned on one.

use async_trait::async_trait;
use ledger_core::{Classify, ErrorClass};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Opaque value identifying the exact stored state of a blob
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(pub String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Content-derived token (SHA-256 of the bytes)
    pub fn of_content(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A blob with the version it was read at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
}

/// Errors from blob store operations
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("throttled: {0}")]
    Throttled(String),
    #[error("network timeout: {0}")]
    NetworkTimeout(String),
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classify for BlobError {
    fn class(&self) -> ErrorClass {
        match self {
            BlobError::Throttled(_)
            | BlobError::NetworkTimeout(_)
            | BlobError::PreconditionFailed(_) => ErrorClass::Retryable,
            BlobError::NotFound(_)
            | BlobError::AccessDenied(_)
            | BlobError::InvalidKey(_)
            | BlobError::Io(_) => ErrorClass::Fatal,
        }
    }
}

/// Adapter for versioned blob storage
#[async_trait]
pub trait BlobStore: Clone + Send + Sync + 'static {
    /// Read a blob and its current version
    async fn get(&self, key: &str) -> Result<Blob, BlobError>;

    /// Replace a blob.
    ///
    /// With `Some(token)` the write only succeeds if the stored version is
    /// still `token`; with `None` it only succeeds if nothing is stored.
    /// Either way a failed precondition is `PreconditionFailed` and nothing
    /// is written.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        if_match: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError>;
}
