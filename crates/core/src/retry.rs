// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff with jitter
//!
//! The delay before retry `k` (k >= 1) is `base * 2^(k-1)` (capped by
//! `max_delay` when set) plus a uniform jitter in `[0, base]`. Only errors
//! whose [`Classify`] says retryable get another attempt.

use crate::classify::Classify;
use crate::context::{Interrupt, Invocation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Retry budget and backoff shape
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Ceiling for the exponential part of the delay
    #[serde(default, with = "humantime_serde")]
    pub max_delay: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: None,
        }
    }

    /// Default budget for compare-and-swap record updates
    pub fn record_updates() -> Self {
        Self::new(5, Duration::from_millis(50)).with_max_delay(Duration::from_secs(2))
    }

    /// Default budget for calendar calls made during reconciliation
    pub fn calendar_calls() -> Self {
        Self::new(3, Duration::from_millis(200)).with_max_delay(Duration::from_secs(5))
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Exponential part of the delay before retry `retry`, without jitter
    pub fn base_backoff(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(30);
        let raw = self.base_delay.saturating_mul(1u32 << shift);
        match self.max_delay {
            Some(max) => raw.min(max),
            None => raw,
        }
    }

    /// Full delay before retry `retry`, jitter included
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff(retry).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let span = u64::try_from(self.base_delay.as_micros()).unwrap_or(u64::MAX);
        if span == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::thread_rng().gen_range(0..=span))
    }

    /// Run `op` until it succeeds, fails fatally, or the budget runs out.
    ///
    /// `op` receives the 1-based attempt number. The invocation's
    /// cancellation and deadline are checked before every attempt and
    /// during every backoff sleep.
    pub async fn attempt<T, E, F, Fut>(
        &self,
        ctx: &Invocation,
        op_name: &'static str,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        self.run(ctx, op_name, true, op).await
    }

    /// Like [`attempt`](Self::attempt), but the first try runs even if the
    /// invocation is already cancelled or past its deadline.
    ///
    /// For recording an external effect that has already happened:
    /// dropping that write would make the next delivery repeat the effect.
    /// Cancellation still stops the retries.
    pub async fn attempt_at_least_once<T, E, F, Fut>(
        &self,
        ctx: &Invocation,
        op_name: &'static str,
        op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        self.run(ctx, op_name, false, op).await
    }

    async fn run<T, E, F, Fut>(
        &self,
        ctx: &Invocation,
        op_name: &'static str,
        check_first: bool,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if attempt > 0 || check_first {
                if let Err(interrupt) = ctx.check() {
                    return Err(RetryError::interrupted(interrupt, attempt));
                }
            }
            attempt += 1;

            let error = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_retryable() {
                tracing::debug!(op = op_name, attempt, error = %error, "fatal, not retrying");
                return Err(RetryError::Aborted(error));
            }

            if attempt >= max_attempts {
                tracing::warn!(op = op_name, attempts = attempt, error = %error, "retries exhausted");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }

            let delay = self.backoff(attempt);
            tracing::debug!(
                op = op_name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying"
            );

            if let Err(interrupt) = ctx.sleep(delay).await {
                return Err(RetryError::interrupted(interrupt, attempt));
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::record_updates()
    }
}

/// Why a retried operation gave up
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("{0}")]
    Aborted(E),
    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
    #[error("deadline exceeded after {attempts} attempts")]
    DeadlineExceeded { attempts: u32 },
}

impl<E> RetryError<E> {
    fn interrupted(interrupt: Interrupt, attempts: u32) -> Self {
        match interrupt {
            Interrupt::Cancelled => RetryError::Cancelled { attempts },
            Interrupt::DeadlineExceeded => RetryError::DeadlineExceeded { attempts },
        }
    }

    /// The underlying error, if the operation itself failed
    pub fn into_inner(self) -> Option<E> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            RetryError::Aborted(e) => Some(e),
            RetryError::Cancelled { .. } | RetryError::DeadlineExceeded { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
