// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory blob store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::blob::{Blob, BlobError, BlobStore, VersionToken};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded blob store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobCall {
    Get {
        key: String,
    },
    Put {
        key: String,
        if_match: Option<VersionToken>,
    },
}

/// Which operation an injected fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobOp {
    Get,
    Put,
}

#[derive(Default)]
struct FakeState {
    objects: HashMap<String, (Vec<u8>, u64)>,
    next_version: u64,
    calls: Vec<BlobCall>,
    faults: VecDeque<(BlobOp, BlobError)>,
    peer_writes: usize,
}

impl FakeState {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

fn token(version: u64) -> VersionToken {
    VersionToken::new(format!("v{}", version))
}

/// Fake blob store for testing
///
/// Clones share state. Supports latency (to widen the window between load
/// and store), injected faults, and simulated peer writes.
#[derive(Clone, Default)]
pub struct FakeBlobStore {
    state: Arc<Mutex<FakeState>>,
    latency: Option<Duration>,
}

impl FakeBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every get and put
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BlobCall> {
        self.lock().calls.clone()
    }

    pub fn get_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BlobCall::Get { .. }))
            .count()
    }

    pub fn put_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BlobCall::Put { .. }))
            .count()
    }

    /// Fail the next matching operation with `error`
    pub fn fail_next(&self, op: BlobOp, error: BlobError) {
        self.lock().faults.push_back((op, error));
    }

    /// After each of the next `n` successful gets, a peer overwrites the
    /// blob, so the reader's token is already stale when it writes back.
    pub fn inject_peer_writes(&self, n: usize) {
        self.lock().peer_writes += n;
    }

    /// Stored bytes, bypassing call recording
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(key).map(|(bytes, _)| bytes.clone())
    }

    /// Overwrite a blob unconditionally, as an out-of-band writer would
    pub fn overwrite(&self, key: &str, bytes: Vec<u8>) -> VersionToken {
        let mut state = self.lock();
        let version = state.bump();
        state.objects.insert(key.to_string(), (bytes, version));
        token(version)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_fault(state: &mut FakeState, op: BlobOp) -> Option<BlobError> {
        let index = state.faults.iter().position(|(o, _)| *o == op)?;
        state.faults.remove(index).map(|(_, e)| e)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn get(&self, key: &str) -> Result<Blob, BlobError> {
        self.lock().calls.push(BlobCall::Get {
            key: key.to_string(),
        });
        self.delay().await;

        let mut state = self.lock();
        if let Some(error) = Self::take_fault(&mut state, BlobOp::Get) {
            return Err(error);
        }
        let (bytes, version) = state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))?;

        if state.peer_writes > 0 {
            state.peer_writes -= 1;
            let bumped = state.bump();
            state
                .objects
                .insert(key.to_string(), (bytes.clone(), bumped));
        }

        Ok(Blob {
            bytes,
            version: token(version),
        })
    }

    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        if_match: Option<&VersionToken>,
    ) -> Result<VersionToken, BlobError> {
        self.lock().calls.push(BlobCall::Put {
            key: key.to_string(),
            if_match: if_match.cloned(),
        });
        self.delay().await;

        let mut state = self.lock();
        if let Some(error) = Self::take_fault(&mut state, BlobOp::Put) {
            return Err(error);
        }
        let current = state.objects.get(key).map(|(_, v)| token(*v));
        let matches = match (&current, if_match) {
            (None, None) => true,
            (Some(current), Some(expected)) => current == expected,
            _ => false,
        };
        if !matches {
            return Err(BlobError::PreconditionFailed(key.to_string()));
        }

        let version = state.bump();
        state.objects.insert(key.to_string(), (bytes, version));
        Ok(token(version))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
