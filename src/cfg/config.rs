// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Resolved server configuration, built from the parsed CLI flags (§6).

use std::path::PathBuf;

use crate::{cfg::cli::Cli, wal::DEFAULT_WAL_NAME};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub auth_enabled: bool,
    pub user: String,
    pub password: String,
    pub wal_enabled: bool,
    pub cleanup_enabled: bool,
    pub cleanup_limit: i64,
    pub cleanup_interval_secs: u64,
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        ServerConfig {
            port: cli.port,
            auth_enabled: !cli.noauth,
            user: cli.user.clone(),
            password: cli.password.clone(),
            wal_enabled: cli.wal,
            cleanup_enabled: !cli.nocleanup,
            cleanup_limit: cli.cleanup_limit,
            cleanup_interval_secs: cli.cleanup_interval,
        }
    }

    /// Path to the write-ahead log in the current working directory.
    pub fn wal_path(&self) -> PathBuf {
        PathBuf::from(DEFAULT_WAL_NAME)
    }
}
