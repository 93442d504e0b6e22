// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation context
//!
//! Everything an invocation needs that is not part of the record itself:
//! who is acting, which delivery this is, and when to stop. Nothing in here is shared between
//! invocations, so concurrent deliveries cannot leak state into each other.

use crate::id::{ActorId, IdGen, UuidIdGen};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an invocation stopped early
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

/// Context for a single unit of work
#[derive(Clone, Debug)]
pub struct Invocation {
    id: String,
    actor: ActorId,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Invocation {
    pub fn new(actor: ActorId) -> Self {
        Self {
            id: UuidIdGen.next(),
            actor,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Use the caller's delivery id (e.g. a queue message id) for log correlation
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Abort once `timeout` has elapsed from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Tie this invocation to a caller-owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns the reason to stop, if any
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupt::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Sleep for `delay`, waking early on cancellation.
    ///
    /// A sleep that would run past the deadline fails immediately rather
    /// than waiting only to give up.
    pub async fn sleep(&self, delay: Duration) -> Result<(), Interrupt> {
        self.check()?;
        let wake = Instant::now() + delay;
        if let Some(deadline) = self.deadline {
            if wake > deadline {
                return Err(Interrupt::DeadlineExceeded);
            }
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = tokio::time::sleep_until(wake) => Ok(()),
        }
    }
}
