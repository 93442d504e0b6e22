// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change records
//!
//! A [`ChangeRecord`] is the unit of concurrency control. Its status and
//! meeting reference are derived from its audit log: both only change by
//! appending an entry, so they can never drift from the log.

use crate::audit::AuditLog;
use crate::entry::{ModificationEntry, ModificationKind};
use crate::error::ValidationError;
use crate::id::RecordId;
use crate::meeting::{MeetingRef, MeetingWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current metadata schema version
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// Lifecycle status of a change
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    #[default]
    Submitted,
    Approved,
    Processed,
    Cancelled,
}

impl ChangeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ChangeStatus::Processed | ChangeStatus::Cancelled)
    }

    /// Status after moving to `next`.
    ///
    /// Re-stating the current status is allowed; leaving a terminal status
    /// or moving back to `Submitted` is not.
    pub fn transition(self, next: ChangeStatus) -> Result<ChangeStatus, ValidationError> {
        use ChangeStatus::*;
        match (self, next) {
            (from, to) if from == to => Ok(to),
            (Submitted, Approved | Processed | Cancelled) => Ok(next),
            (Approved, Processed | Cancelled) => Ok(next),
            (from, to) => Err(ValidationError::IllegalTransition { from, to }),
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeStatus::Submitted => "submitted",
            ChangeStatus::Approved => "approved",
            ChangeStatus::Processed => "processed",
            ChangeStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Structured optional metadata carried by a change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangeMetadata {
    pub schema_version: u32,
    /// Customer code the change belongs to
    pub customer: Option<String>,
    /// Id of the event that first created this change
    pub source_event_id: Option<String>,
    pub ticket_url: Option<String>,
    /// Free text shown in the meeting body
    pub implementation_notes: Option<String>,
}

impl Default for ChangeMetadata {
    fn default() -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            customer: None,
            source_event_id: None,
            ticket_url: None,
            implementation_notes: None,
        }
    }
}

/// Descriptive fields of a change, as supplied by the ingestion layer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetails {
    pub title: String,
    pub window: Option<MeetingWindow>,
    pub participants: BTreeSet<String>,
    pub metadata: ChangeMetadata,
}

impl ChangeDetails {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_window(mut self, window: MeetingWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_participants<I, S>(mut self, participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participants = participants.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: ChangeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if let Some(window) = &self.window {
            window.validate()?;
        }
        if self.metadata.schema_version != METADATA_SCHEMA_VERSION {
            return Err(ValidationError::UnsupportedSchema(self.metadata.schema_version));
        }
        Ok(())
    }
}

/// A versioned change with its audit trail
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeRecord {
    pub id: RecordId,
    pub title: String,
    pub window: Option<MeetingWindow>,
    pub participants: BTreeSet<String>,
    #[serde(default)]
    pub metadata: ChangeMetadata,
    status: ChangeStatus,
    modifications: AuditLog,
    meeting: Option<MeetingRef>,
}

impl ChangeRecord {
    /// A fresh record with an empty audit log
    pub fn new(id: RecordId, details: ChangeDetails) -> Result<Self, ValidationError> {
        details.validate()?;
        Ok(Self {
            id,
            title: details.title,
            window: details.window,
            participants: details.participants,
            metadata: details.metadata,
            status: ChangeStatus::Submitted,
            modifications: AuditLog::default(),
            meeting: None,
        })
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.modifications
    }

    /// Meeting reference from the most recent successful calendar operation
    pub fn meeting(&self) -> Option<&MeetingRef> {
        self.meeting.as_ref()
    }

    /// See [`AuditLog::latest_meeting_reference`]
    pub fn latest_meeting_reference(&self) -> Option<&MeetingRef> {
        self.modifications.latest_meeting_reference()
    }

    pub fn details(&self) -> ChangeDetails {
        ChangeDetails {
            title: self.title.clone(),
            window: self.window,
            participants: self.participants.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Replace the descriptive fields, leaving status and audit log alone
    pub fn with_details(mut self, details: ChangeDetails) -> Result<Self, ValidationError> {
        details.validate()?;
        self.title = details.title;
        self.window = details.window;
        self.participants = details.participants;
        self.metadata = details.metadata;
        Ok(self)
    }

    /// Append an entry and apply its effect on status or meeting reference.
    ///
    /// All checks run before anything changes: on error the record is
    /// dropped untouched from the caller's point of view.
    pub fn append(mut self, entry: ModificationEntry) -> Result<Self, ValidationError> {
        let status = match entry.kind.target_status() {
            Some(next) => self.status.transition(next)?,
            None => self.status,
        };
        let meeting = match &entry.kind {
            ModificationKind::MeetingScheduled { meeting } => Some(meeting.clone()),
            _ => None,
        };

        self.modifications.append(entry)?;

        self.status = status;
        if meeting.is_some() {
            self.meeting = meeting;
        }
        Ok(self)
    }

    /// Re-derive status and meeting reference from the log and compare.
    ///
    /// Used on every decode so a hand-edited or corrupt record is rejected
    /// instead of being written back.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.details().validate()?;

        let mut replay = ChangeRecord {
            modifications: AuditLog::default(),
            status: ChangeStatus::Submitted,
            meeting: None,
            ..self.clone()
        };
        for entry in self.modifications.iter() {
            replay = replay.append(entry.clone())?;
        }

        if replay.status != self.status {
            return Err(ValidationError::Inconsistent { field: "status" });
        }
        if replay.meeting != self.meeting {
            return Err(ValidationError::Inconsistent { field: "meeting" });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
