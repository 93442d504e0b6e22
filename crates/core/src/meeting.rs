// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting references and desired meeting state
//!
//! A [`MeetingRef`] is this system's last known view of a meeting in the
//! external calendar. A [`DesiredMeeting`] is what the meeting should look
//! like now. Reconciliation compares the two.

use crate::error::ValidationError;
use crate::recipients::{filter_recipients, AllowList};
use crate::record::ChangeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Scheduled implementation window of a change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MeetingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end <= self.start {
            return Err(ValidationError::InvalidWindow {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Reference to a meeting that exists in the external calendar
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingRef {
    /// Calendar-assigned resource id
    pub id: String,
    /// Link attendees use to join
    pub join_url: String,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MeetingRef {
    /// Compare the cached fields against the desired state.
    ///
    /// Returns a human-readable description of every differing field, or
    /// `None` when nothing needs to change.
    pub fn diff(&self, desired: &DesiredMeeting) -> Option<String> {
        let mut changes = Vec::new();
        if self.subject != desired.subject {
            changes.push(format!(
                "subject changed from {:?} to {:?}",
                self.subject, desired.subject
            ));
        }
        if self.start != desired.start {
            changes.push(format!(
                "start changed from {} to {}",
                self.start.to_rfc3339(),
                desired.start.to_rfc3339()
            ));
        }
        if self.end != desired.end {
            changes.push(format!(
                "end changed from {} to {}",
                self.end.to_rfc3339(),
                desired.end.to_rfc3339()
            ));
        }
        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }

    /// Same resource id and join link, with the desired fields cached
    pub fn refreshed(&self, desired: &DesiredMeeting) -> MeetingRef {
        MeetingRef {
            id: self.id.clone(),
            join_url: self.join_url.clone(),
            subject: desired.subject.clone(),
            start: desired.start,
            end: desired.end,
        }
    }
}

/// What the meeting for a change should look like
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredMeeting {
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: BTreeSet<String>,
    pub body: Option<String>,
}

impl DesiredMeeting {
    pub fn new(subject: impl Into<String>, window: MeetingWindow) -> Self {
        Self {
            subject: subject.into(),
            start: window.start,
            end: window.end,
            attendees: BTreeSet::new(),
            body: None,
        }
    }

    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Build the desired meeting for a record.
    ///
    /// Returns `None` when the change has no scheduled window. Participants
    /// outside `allow_list` are dropped.
    pub fn from_record(record: &ChangeRecord, allow_list: &AllowList) -> Option<Self> {
        let window = record.window?;
        let filtered = filter_recipients(record.participants.iter(), allow_list);
        if filtered.skipped > 0 {
            tracing::debug!(
                record = %record.id,
                skipped = filtered.skipped,
                "participants outside allow list"
            );
        }
        let mut desired = Self::new(record.title.clone(), window).with_attendees(filtered.allowed);
        if let Some(notes) = &record.metadata.implementation_notes {
            desired = desired.with_body(notes.clone());
        }
        Some(desired)
    }
}

#[cfg(test)]
#[path = "meeting_tests.rs"]
mod tests;
