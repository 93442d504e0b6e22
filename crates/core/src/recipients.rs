// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipient allow-list filtering
//!
//! The allow list is always passed in by the caller. It is never stored in
//! process-wide state, so invocations for different customers cannot see
//! each other's lists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Addresses that may receive meeting invitations
///
/// Entries are exact addresses (`ops@example.com`) or domain suffixes
/// (`@example.com`). Matching is case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    #[serde(default)]
    allow_all: bool,
    #[serde(default)]
    entries: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allow_all: false,
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Allow list that lets every address through
    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            entries: BTreeSet::new(),
        }
    }

    pub fn allows(&self, address: &str) -> bool {
        if self.allow_all {
            return true;
        }
        let address = address.trim().to_ascii_lowercase();
        if self.entries.contains(&address) {
            return true;
        }
        match address.rfind('@') {
            Some(at) => self.entries.contains(&address[at..]),
            None => false,
        }
    }
}

/// Result of filtering a recipient list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilteredRecipients {
    pub allowed: BTreeSet<String>,
    pub skipped: usize,
}

/// Split `recipients` into those the allow list accepts and a count of the rest
pub fn filter_recipients<I, S>(recipients: I, allow_list: &AllowList) -> FilteredRecipients
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut filtered = FilteredRecipients::default();
    for recipient in recipients {
        let recipient = recipient.as_ref().trim();
        if recipient.is_empty() {
            continue;
        }
        if allow_list.allows(recipient) {
            filtered.allowed.insert(recipient.to_string());
        } else {
            filtered.skipped += 1;
        }
    }
    filtered
}
