// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Change ledger engine: lifecycle transitions and meeting reconciliation

mod error;
mod ledger;
mod logging;
mod reconcile;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use logging::{env_filter, init_logging};
pub use reconcile::{CancelOutcome, ReconcileOutcome, Reconciled, ReconciliationEngine};
