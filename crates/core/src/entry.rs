// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Modification entries: the unit of the audit log

use crate::error::ValidationError;
use crate::id::ActorId;
use crate::meeting::MeetingRef;
use crate::record::ChangeStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a change
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModificationKind {
    Submitted,
    Approved,
    /// A meeting was created or updated; carries the reference as of that call
    MeetingScheduled {
        meeting: MeetingRef,
    },
    MeetingCancelled,
    /// The change was carried out on behalf of `scope` (e.g. a customer code)
    Processed {
        scope: String,
    },
    Cancelled,
}

impl ModificationKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModificationKind::Submitted => "submitted",
            ModificationKind::Approved => "approved",
            ModificationKind::MeetingScheduled { .. } => "meeting_scheduled",
            ModificationKind::MeetingCancelled => "meeting_cancelled",
            ModificationKind::Processed { .. } => "processed",
            ModificationKind::Cancelled => "cancelled",
        }
    }

    /// Lifecycle status this entry moves the change to, if any
    pub fn target_status(&self) -> Option<ChangeStatus> {
        match self {
            ModificationKind::Submitted => Some(ChangeStatus::Submitted),
            ModificationKind::Approved => Some(ChangeStatus::Approved),
            ModificationKind::Processed { .. } => Some(ChangeStatus::Processed),
            ModificationKind::Cancelled => Some(ChangeStatus::Cancelled),
            ModificationKind::MeetingScheduled { .. } | ModificationKind::MeetingCancelled => None,
        }
    }
}

/// One immutable line of the audit log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModificationEntry {
    pub at: DateTime<Utc>,
    pub actor: ActorId,
    pub kind: ModificationKind,
}

impl ModificationEntry {
    pub fn new(at: DateTime<Utc>, actor: ActorId, kind: ModificationKind) -> Self {
        Self { at, actor, kind }
    }

    pub fn submitted(at: DateTime<Utc>, actor: ActorId) -> Self {
        Self::new(at, actor, ModificationKind::Submitted)
    }

    pub fn approved(at: DateTime<Utc>, actor: ActorId) -> Self {
        Self::new(at, actor, ModificationKind::Approved)
    }

    pub fn meeting_scheduled(at: DateTime<Utc>, actor: ActorId, meeting: MeetingRef) -> Self {
        Self::new(at, actor, ModificationKind::MeetingScheduled { meeting })
    }

    pub fn meeting_cancelled(at: DateTime<Utc>, actor: ActorId) -> Self {
        Self::new(at, actor, ModificationKind::MeetingCancelled)
    }

    pub fn processed(at: DateTime<Utc>, actor: ActorId, scope: impl Into<String>) -> Self {
        Self::new(
            at,
            actor,
            ModificationKind::Processed {
                scope: scope.into(),
            },
        )
    }

    pub fn cancelled(at: DateTime<Utc>, actor: ActorId) -> Self {
        Self::new(at, actor, ModificationKind::Cancelled)
    }

    /// Check the fields every entry needs plus those its variant needs
    pub fn validate(&self) -> Result<(), ValidationError> {
        let entry = self.kind.name();
        if self.at <= DateTime::<Utc>::UNIX_EPOCH {
            return Err(ValidationError::MissingTimestamp { entry });
        }
        if self.actor.is_empty() {
            return Err(ValidationError::MissingActor { entry });
        }
        match &self.kind {
            ModificationKind::MeetingScheduled { meeting } if meeting.id.trim().is_empty() => {
                Err(ValidationError::MissingResourceId)
            }
            ModificationKind::Processed { scope } if scope.trim().is_empty() => {
                Err(ValidationError::MissingScope)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
