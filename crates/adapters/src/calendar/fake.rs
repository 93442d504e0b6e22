// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake calendar adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CalendarAdapter, CalendarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledger_core::{DesiredMeeting, IdGen, MeetingRef, SequentialIdGen};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded calendar call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCall {
    Create { subject: String },
    Update { id: String, subject: String },
    Delete { id: String },
}

/// Which operation an injected fault applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarOp {
    Create,
    Update,
    Delete,
}

/// A meeting as the fake calendar holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMeeting {
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub attendees: BTreeSet<String>,
    pub body: Option<String>,
    pub join_url: String,
}

struct FakeState {
    meetings: HashMap<String, FakeMeeting>,
    calls: Vec<CalendarCall>,
    faults: VecDeque<(CalendarOp, CalendarError)>,
}

/// Fake calendar adapter for testing
///
/// Clones share state. Meeting ids come from a [`SequentialIdGen`], so
/// they are predictable across a test (`meeting-1`, `meeting-2`, ...).
#[derive(Clone)]
pub struct FakeCalendarAdapter {
    state: Arc<Mutex<FakeState>>,
    ids: SequentialIdGen,
}

impl Default for FakeCalendarAdapter {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                meetings: HashMap::new(),
                calls: Vec::new(),
                faults: VecDeque::new(),
            })),
            ids: SequentialIdGen::new("meeting"),
        }
    }
}

impl FakeCalendarAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CalendarCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls, keeping meetings and faults
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Fail the next matching operation with `error`
    pub fn fail_next(&self, op: CalendarOp, error: CalendarError) {
        self.lock().faults.push_back((op, error));
    }

    /// Get a meeting by id
    pub fn meeting(&self, id: &str) -> Option<FakeMeeting> {
        self.lock().meetings.get(id).cloned()
    }

    /// Number of meetings that currently exist
    pub fn meeting_count(&self) -> usize {
        self.lock().meetings.len()
    }

    /// Delete a meeting behind the ledger's back, as a user in the
    /// calendar client would
    pub fn remove(&self, id: &str) -> Option<FakeMeeting> {
        self.lock().meetings.remove(id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take_fault(state: &mut FakeState, op: CalendarOp) -> Option<CalendarError> {
        let index = state.faults.iter().position(|(o, _)| *o == op)?;
        state.faults.remove(index).map(|(_, e)| e)
    }
}

#[async_trait]
impl CalendarAdapter for FakeCalendarAdapter {
    async fn create(&self, desired: &DesiredMeeting) -> Result<MeetingRef, CalendarError> {
        let mut state = self.lock();
        state.calls.push(CalendarCall::Create {
            subject: desired.subject.clone(),
        });
        if let Some(error) = Self::take_fault(&mut state, CalendarOp::Create) {
            return Err(error);
        }

        let id = self.ids.next();
        let join_url = format!("https://meet.example/{}", id);
        state.meetings.insert(
            id.clone(),
            FakeMeeting {
                subject: desired.subject.clone(),
                start: desired.start,
                end: desired.end,
                attendees: desired.attendees.clone(),
                body: desired.body.clone(),
                join_url: join_url.clone(),
            },
        );

        Ok(MeetingRef {
            id,
            join_url,
            subject: desired.subject.clone(),
            start: desired.start,
            end: desired.end,
        })
    }

    async fn update(
        &self,
        meeting: &MeetingRef,
        desired: &DesiredMeeting,
    ) -> Result<(), CalendarError> {
        let mut state = self.lock();
        state.calls.push(CalendarCall::Update {
            id: meeting.id.clone(),
            subject: desired.subject.clone(),
        });
        if let Some(error) = Self::take_fault(&mut state, CalendarOp::Update) {
            return Err(error);
        }

        let existing = state
            .meetings
            .get_mut(&meeting.id)
            .ok_or_else(|| CalendarError::NotFound(meeting.id.clone()))?;
        existing.subject = desired.subject.clone();
        existing.start = desired.start;
        existing.end = desired.end;
        existing.attendees = desired.attendees.clone();
        existing.body = desired.body.clone();
        Ok(())
    }

    async fn delete(&self, meeting: &MeetingRef) -> Result<(), CalendarError> {
        let mut state = self.lock();
        state.calls.push(CalendarCall::Delete {
            id: meeting.id.clone(),
        });
        if let Some(error) = Self::take_fault(&mut state, CalendarOp::Delete) {
            return Err(error);
        }

        match state.meetings.remove(&meeting.id) {
            Some(_) => Ok(()),
            None => Err(CalendarError::NotFound(meeting.id.clone())),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
