// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The user-visible error taxonomy.
//!
//! Every variant here maps to exactly one RESP error line (`-<CODE>
//! <message>\r\n`). These are reply-level errors: producing one never closes
//! the connection (see `dispatcher`).

use thiserror::Error;

/// Errors raised while decoding or encoding a RESP frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("ERR protocol error: malformed frame: {0}")]
    MalformedFrame(String),
    #[error("ERR protocol error: unsupported frame shape")]
    UnsupportedShape,
    #[error("ERR unsupported type for request")]
    UnsupportedType,
}

/// Errors raised while splitting a request line into tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("ERR unbalanced quotes")]
pub struct UnbalancedQuotes;

/// Errors produced while parsing or executing a command against the
/// keyspace. Every variant's `Display` impl is the exact RESP error message
/// this engine sends back to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR invalid number of arguments for command '{0}'")]
    ArgumentCount(String),

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR unbalanced quotes")]
    UnbalancedQuotes,

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("NOAUTH Authentication required")]
    NoAuth,

    #[error("WRONGPASS invalid username-password pair or user is disabled")]
    WrongPass,

    #[error("NOPROTO unsupported protocol version")]
    NoProto,

    #[error("ERR unsupported type for request")]
    UnsupportedType,
}

impl From<UnbalancedQuotes> for EngineError {
    fn from(_: UnbalancedQuotes) -> Self {
        EngineError::UnbalancedQuotes
    }
}

impl From<CodecError> for EngineError {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::UnsupportedType | CodecError::UnsupportedShape => {
                EngineError::UnsupportedType
            },
            CodecError::MalformedFrame(_) => EngineError::UnsupportedType,
        }
    }
}
