// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event origin classification
//!
//! The ingestion layer drops events this system produced itself (for
//! instance the invitation it just sent bouncing back), otherwise every
//! write would trigger another delivery.

use ledger_core::ActorId;
use std::collections::BTreeSet;

/// Decides whether an event came from this system
pub trait OriginClassifier: Send + Sync {
    fn is_self_generated(&self, identity: &str) -> bool;
}

/// Classifier backed by a fixed set of identities this system acts as
///
/// Identities are compared case-insensitively after trimming.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownIdentities {
    identities: BTreeSet<String>,
}

impl KnownIdentities {
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identities: identities
                .into_iter()
                .filter_map(|i| normalize(i.as_ref()))
                .collect(),
        }
    }

    /// Also treat `actor` as this system
    pub fn with_actor(mut self, actor: &ActorId) -> Self {
        if let Some(actor) = normalize(actor.as_str()) {
            self.identities.insert(actor);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

fn normalize(identity: &str) -> Option<String> {
    let identity = identity.trim();
    if identity.is_empty() {
        None
    } else {
        Some(identity.to_lowercase())
    }
}

impl OriginClassifier for KnownIdentities {
    fn is_self_generated(&self, identity: &str) -> bool {
        match normalize(identity) {
            Some(identity) => self.identities.contains(&identity),
            None => false,
        }
    }
}
