// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Splits a single text request line into an argument vector.
//!
//! Whitespace separates tokens; a token may instead be a `"`- or
//! `'`-delimited span, taken verbatim (no escape processing) up to the
//! matching terminator. Only used for the single-bulk-string request shape
//! (WAL replay lines, or a client that sent one bulk) — when the frame
//! arrives as an array of bulks, each element is already a token.

use crate::error::UnbalancedQuotes;

/// Split `line` into tokens. Empty input yields an empty vector.
pub fn split_tokens(line: &str) -> Result<Vec<String>, UnbalancedQuotes> {
    let chars: Vec<char> = line.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i] == '"' || chars[i] == '\'' {
            let term = chars[i];
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != term {
                i += 1;
            }
            if i >= chars.len() {
                return Err(UnbalancedQuotes);
            }
            out.push(chars[start..i].iter().collect());
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        out.push(chars[start..i].iter().collect());
    }

    Ok(out)
}

/// Re-quote a token for WAL/array-to-line canonicalization (§4.8): wrap in
/// double quotes if it contains whitespace, otherwise leave it bare.
pub fn quote_if_needed(token: &str) -> String {
    if token.chars().any(char::is_whitespace) {
        format!("\"{token}\"")
    } else {
        token.to_string()
    }
}

/// Join tokens with single spaces, re-quoting any that contain whitespace.
pub fn stringify_tokens(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| quote_if_needed(t))
        .collect::<Vec<_>>()
        .join(" ")
}
