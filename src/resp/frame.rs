// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Inbound frame decoding.
//!
//! Recognized shapes: simple string (`+`), bulk string (`$`, including the
//! nil bulk `$-1`), integer (`:`), array (`*`), boolean (`#`), and error
//! (`-`). The top-level request the dispatcher cares about is always either
//! a bulk string or an array of bulk strings; the other shapes exist so the
//! codec round-trips on any valid frame (see the module tests below).

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::CodecError;

/// A decoded top-level RESP value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    /// `None` represents the nil bulk string (`$-1\r\n`).
    Bulk(Option<Vec<u8>>),
    Boolean(bool),
    Array(Vec<Frame>),
}

impl Frame {
    /// The request shapes the dispatcher accepts: a whole command line as
    /// one bulk string, or an array of bulk-string arguments.
    pub fn into_tokens(self) -> Result<Vec<String>, CodecError> {
        match self {
            Frame::Bulk(Some(bytes)) => {
                let text = String::from_utf8(bytes)
                    .map_err(|_| CodecError::MalformedFrame("non-UTF-8 bulk".into()))?;
                crate::tokenizer::split_tokens(&text)
                    .map_err(|_| CodecError::MalformedFrame("unbalanced quotes".into()))
            },
            Frame::Bulk(None) => Ok(Vec::new()),
            Frame::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Frame::Bulk(Some(bytes)) => String::from_utf8(bytes)
                        .map_err(|_| CodecError::MalformedFrame("non-UTF-8 bulk".into())),
                    Frame::Bulk(None) => Ok(String::new()),
                    _ => Err(CodecError::UnsupportedShape),
                })
                .collect(),
            _ => Err(CodecError::UnsupportedShape),
        }
    }
}

/// Read one line terminated by `\r\n`, returning its content without the
/// terminator.
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, CodecError> {
    let mut buf = Vec::new();
    let n = reader
        .read_until(b'\n', &mut buf)
        .await
        .map_err(|e| CodecError::MalformedFrame(e.to_string()))?;
    if n == 0 {
        return Err(CodecError::MalformedFrame("unexpected EOF".into()));
    }
    while buf.last() == Some(&b'\n') || buf.last() == Some(&b'\r') {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|_| CodecError::MalformedFrame("non-UTF-8 line".into()))
}

fn parse_len(text: &str) -> Result<i64, CodecError> {
    text.parse::<i64>()
        .map_err(|_| CodecError::MalformedFrame(format!("invalid length header: {text}")))
}

/// Read one top-level RESP frame, recursing into arrays.
pub async fn read_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Frame, CodecError> {
    let line = read_line(reader).await?;
    if line.is_empty() {
        return Err(CodecError::MalformedFrame("empty line".into()));
    }
    let (marker, rest) = line.split_at(1);

    match marker {
        "+" => Ok(Frame::Simple(rest.to_string())),
        "-" => Ok(Frame::Error(rest.to_string())),
        ":" => Ok(Frame::Integer(
            rest.parse()
                .map_err(|_| CodecError::MalformedFrame(format!("invalid integer: {rest}")))?,
        )),
        "#" => match rest {
            "t" => Ok(Frame::Boolean(true)),
            "f" => Ok(Frame::Boolean(false)),
            _ => Err(CodecError::MalformedFrame(format!("invalid boolean: {rest}"))),
        },
        "$" => {
            let len = parse_len(rest)?;
            if len < 0 {
                return Ok(Frame::Bulk(None));
            }
            let len = len as usize;
            let mut payload = vec![0u8; len];
            reader
                .read_exact(&mut payload)
                .await
                .map_err(|e| CodecError::MalformedFrame(e.to_string()))?;
            let mut crlf = [0u8; 2];
            reader
                .read_exact(&mut crlf)
                .await
                .map_err(|e| CodecError::MalformedFrame(e.to_string()))?;
            if &crlf != b"\r\n" {
                return Err(CodecError::MalformedFrame("bulk missing CRLF terminator".into()));
            }
            Ok(Frame::Bulk(Some(payload)))
        },
        "*" => {
            let len = parse_len(rest)?;
            if len < 0 {
                return Ok(Frame::Array(Vec::new()));
            }
            let mut items = Vec::with_capacity(len as usize);
            for _ in 0..len {
                items.push(Box::pin(read_frame(reader)).await?);
            }
            Ok(Frame::Array(items))
        },
        _ => Err(CodecError::UnsupportedShape),
    }
}

/// Encode a [`Frame`] back into RESP bytes. Used by the test client harness
/// and by the round-trip property tests.
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    match frame {
        Frame::Simple(s) => format!("+{s}\r\n").into_bytes(),
        Frame::Error(s) => format!("-{s}\r\n").into_bytes(),
        Frame::Integer(n) => format!(":{n}\r\n").into_bytes(),
        Frame::Boolean(b) => format!("#{}\r\n", if *b { "t" } else { "f" }).into_bytes(),
        Frame::Bulk(None) => b"$-1\r\n".to_vec(),
        Frame::Bulk(Some(bytes)) => {
            let mut out = format!("${}\r\n", bytes.len()).into_bytes();
            out.extend_from_slice(bytes);
            out.extend_from_slice(b"\r\n");
            out
        },
        Frame::Array(items) => {
            let mut out = format!("*{}\r\n", items.len()).into_bytes();
            for item in items {
                out.extend(encode_frame(item));
            }
            out
        },
    }
}
