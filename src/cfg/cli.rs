// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Command-line argument definitions, parsed via `clap::Parser`.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

#[derive(Debug, Parser)]
#[command(name = "memo-server", about = "An in-memory key-value data server speaking RESP over TCP")]
pub struct Cli {
    /// TCP listen port.
    #[arg(long = "port", short = 'p', default_value_t = 5678)]
    pub port: u16,

    /// Disable authentication entirely.
    #[arg(long = "noauth", default_value_t = false)]
    pub noauth: bool,

    /// Username required by AUTH/HELLO when authentication is enabled.
    #[arg(long = "user", short = 'u', default_value = "memo")]
    pub user: String,

    /// Password required by AUTH/HELLO when authentication is enabled.
    #[arg(long = "password", visible_alias = "pwd", default_value = "password")]
    pub password: String,

    /// Enable the write-ahead log and replay it on startup.
    #[arg(long = "wal", default_value_t = false)]
    pub wal: bool,

    /// Disable the periodic expired-key sweep.
    #[arg(long = "nocleanup", default_value_t = false)]
    pub nocleanup: bool,

    /// Max number of keys a single sweep tick may remove.
    #[arg(long = "cleanup-limit", default_value_t = 20)]
    pub cleanup_limit: i64,

    /// Seconds between sweep ticks.
    #[arg(long = "cleanup-interval", default_value_t = 1)]
    pub cleanup_interval: u64,

    /// Emit logs as JSON instead of the default human-readable format.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
