// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Serialization of engine reply values into RESP bytes (§4.1's "Outbound
//! serialization" table).

/// Everything the dispatcher can hand back to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `+OK\r\n`
    Ok,
    /// `+PONG\r\n`
    Pong,
    Bulk(String),
    Integer(i64),
    Boolean(bool),
    Nil,
    Array(Vec<Reply>),
    /// A RESP map (`%n\r\n`) with fields serialized in the given order.
    Map(Vec<(String, Reply)>),
    Error(String),
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Reply::Ok => b"+OK\r\n".to_vec(),
            Reply::Pong => b"+PONG\r\n".to_vec(),
            Reply::Bulk(s) => {
                let mut out = format!("${}\r\n", s.len()).into_bytes();
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
                out
            },
            Reply::Integer(n) => format!(":{n}\r\n").into_bytes(),
            Reply::Boolean(b) => format!("#{}\r\n", if *b { "t" } else { "f" }).into_bytes(),
            Reply::Nil => b"$-1\r\n".to_vec(),
            Reply::Array(items) => {
                let mut out = format!("*{}\r\n", items.len()).into_bytes();
                for item in items {
                    out.extend(item.encode());
                }
                out
            },
            Reply::Map(fields) => {
                let mut out = format!("%{}\r\n", fields.len()).into_bytes();
                for (key, value) in fields {
                    out.extend(Reply::Bulk(key.clone()).encode());
                    out.extend(value.encode());
                }
                out
            },
            Reply::Error(msg) => format!("-{msg}\r\n").into_bytes(),
        }
    }
}

impl From<Vec<String>> for Reply {
    fn from(items: Vec<String>) -> Self {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }
}
