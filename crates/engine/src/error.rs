// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the ledger engine

use ledger_adapters::CalendarError;
use ledger_core::{Classify, ErrorClass, Interrupt, RetryError, ValidationError};
use ledger_storage::{StoreError, UpdateError};
use thiserror::Error;

/// Errors returned to the ingestion layer.
///
/// [`Classify::class`] tells the caller whether to redeliver (retryable)
/// or drop (fatal) the triggering message.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("calendar {operation} failed: {source}")]
    Calendar {
        operation: &'static str,
        source: CalendarError,
    },
    #[error("calendar {operation} gave up after {attempts} attempts: {source}")]
    CalendarExhausted {
        operation: &'static str,
        attempts: u32,
        source: CalendarError,
    },
    #[error("invalid change: {0}")]
    Validation(#[from] ValidationError),
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },
}

impl LedgerError {
    pub(crate) fn calendar(operation: &'static str, error: RetryError<CalendarError>) -> Self {
        match error {
            RetryError::Exhausted { attempts, last } => LedgerError::CalendarExhausted {
                operation,
                attempts,
                source: last,
            },
            RetryError::Aborted(source) => LedgerError::Calendar { operation, source },
            RetryError::Cancelled { .. } => LedgerError::Cancelled { operation },
            RetryError::DeadlineExceeded { .. } => LedgerError::DeadlineExceeded { operation },
        }
    }

    pub(crate) fn interrupted(operation: &'static str, interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Cancelled => LedgerError::Cancelled { operation },
            Interrupt::DeadlineExceeded => LedgerError::DeadlineExceeded { operation },
        }
    }

    /// The calendar error behind this failure, if any
    pub fn calendar_error(&self) -> Option<&CalendarError> {
        match self {
            LedgerError::Calendar { source, .. }
            | LedgerError::CalendarExhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            LedgerError::Cancelled { .. }
                | LedgerError::DeadlineExceeded { .. }
                | LedgerError::Update(UpdateError::Cancelled { .. })
                | LedgerError::Update(UpdateError::DeadlineExceeded { .. })
        )
    }
}

impl Classify for LedgerError {
    fn class(&self) -> ErrorClass {
        match self {
            LedgerError::Update(e) => e.class(),
            LedgerError::Store(e) => e.class(),
            LedgerError::Calendar { source, .. } | LedgerError::CalendarExhausted { source, .. } => {
                source.class()
            }
            LedgerError::Validation(e) => e.class(),
            LedgerError::Cancelled { .. } | LedgerError::DeadlineExceeded { .. } => {
                ErrorClass::Retryable
            }
        }
    }
}
