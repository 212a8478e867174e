// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Logger initialization.
//!
//! Simplified from the teacher's span-capturing JSON `FormatEvent` layer
//! (`client/pool_sessions.rs` drives enough state already; this server has
//! no PDU-level spans to carry): a plain `fmt` layer plus an `EnvFilter`
//! derived from `-v`/`-q` verbosity, with an optional JSON output mode.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cfg::cli::LogFormat;

pub fn init_logger(level_filter: log::LevelFilter, format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter.to_string().to_lowercase()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .context("failed to install text log subscriber"),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
            .context("failed to install JSON log subscriber"),
    }
}
