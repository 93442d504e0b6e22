// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit log
//!
//! Insertion order is chronological order. Entries are validated on the way
//! in and never touched again: there is no remove, sort, or edit.

use crate::entry::{ModificationEntry, ModificationKind};
use crate::error::ValidationError;
use crate::meeting::MeetingRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<ModificationEntry>,
}

impl AuditLog {
    /// Validate `entry` and append it.
    ///
    /// Rejects entries missing required fields and entries timestamped
    /// before the current last entry. Equal timestamps are accepted.
    pub fn append(&mut self, entry: ModificationEntry) -> Result<(), ValidationError> {
        entry.validate()?;
        if let Some(last) = self.entries.last() {
            if entry.at < last.at {
                return Err(ValidationError::OutOfOrder {
                    previous: last.at,
                    attempted: entry.at,
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ModificationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModificationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ModificationEntry> {
        self.entries.last()
    }

    /// Timestamp for the next entry: `now`, or the last entry's timestamp
    /// if the local clock is behind the writer that appended it.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.entries.last() {
            Some(last) if last.at > now => last.at,
            _ => now,
        }
    }

    /// Most recent entry matching `predicate`
    pub fn latest_where<F>(&self, predicate: F) -> Option<&ModificationEntry>
    where
        F: Fn(&ModificationKind) -> bool,
    {
        self.entries.iter().rev().find(|e| predicate(&e.kind))
    }

    /// Reference carried by the most recent `MeetingScheduled` entry.
    ///
    /// A later `MeetingCancelled` entry does not hide it.
    pub fn latest_meeting_reference(&self) -> Option<&MeetingRef> {
        self.entries.iter().rev().find_map(|e| match &e.kind {
            ModificationKind::MeetingScheduled { meeting } => Some(meeting),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
