// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Command-line parsing, the resulting server configuration, and logger
//! initialization.

pub mod cli;
pub mod config;
pub mod logger;

pub use config::ServerConfig;
