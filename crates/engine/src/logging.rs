// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup

use ledger_core::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the filter for `config`; `RUST_LOG` wins when set
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns `false` if one was already installed (for example by a test
/// harness or an embedding service); the existing one is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_ansi(config.ansi).with_target(true))
        .try_init()
        .is_ok()
}
