// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Versioned storage for change records

pub mod blob;
mod file;
mod store;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use blob::{Blob, BlobError, BlobStore, VersionToken};
pub use file::FileBlobStore;
pub use store::{StoreError, UpdateError, Versioned, VersionedRecordStore};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{BlobCall, BlobOp, FakeBlobStore};
