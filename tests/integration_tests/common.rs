// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A minimal smoke-test client and in-process server harness. Deliberately
//! not part of the library crate (see spec.md's "smoke-test client" as an
//! out-of-scope external collaborator): it reimplements just enough RESP
//! reading to assert on replies, including the `%` map shape the engine
//! emits for ServerInfo, which the inbound codec never needs to parse.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use memo_rs::{
    cfg::config::ServerConfig,
    dispatcher::{EngineContext, serve},
    keyspace::Keyspace,
    wal::WalWriter,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter},
    net::{TcpListener, TcpStream},
};
use tokio_util::sync::CancellationToken;

/// A reply value as read back off the wire, for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum TestReply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Option<String>),
    Boolean(bool),
    Array(Vec<TestReply>),
    Map(Vec<(String, TestReply)>),
}

pub struct TestServer {
    pub addr: std::net::SocketAddr,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<Result<()>>,
}

impl TestServer {
    pub async fn start(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.context("bind ephemeral port")?;
        let addr = listener.local_addr().context("local addr")?;
        let keyspace = Keyspace::new();
        let ctx = EngineContext::new(keyspace, config, WalWriter::disabled());
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move { serve(listener, ctx, task_cancel).await });
        Ok(TestServer { addr, cancel, task })
    }

    pub async fn connect(&self) -> Result<Client> {
        Client::connect(self.addr).await
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

pub struct Client {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: BufWriter<tokio::net::tcp::OwnedWriteHalf>,
}

impl Client {
    pub async fn connect(addr: std::net::SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.context("connect to test server")?;
        let (read_half, write_half) = stream.into_split();
        Ok(Client { reader: BufReader::new(read_half), writer: BufWriter::new(write_half) })
    }

    /// Send a command as a single bulk string (the array form is exercised
    /// separately in `lists.rs`).
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let payload = line.as_bytes();
        let mut bytes = format!("${}\r\n", payload.len()).into_bytes();
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(b"\r\n");
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send a command as a RESP array of bulk strings.
    pub async fn send_array(&mut self, parts: &[&str]) -> Result<()> {
        let mut bytes = format!("*{}\r\n", parts.len()).into_bytes();
        for part in parts {
            let payload = part.as_bytes();
            bytes.extend(format!("${}\r\n", payload.len()).into_bytes());
            bytes.extend_from_slice(payload);
            bytes.extend_from_slice(b"\r\n");
        }
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn read_reply(&mut self) -> Result<TestReply> {
        Box::pin(read_reply(&mut self.reader)).await
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf).await.context("read line")?;
    if n == 0 {
        bail!("unexpected EOF from test server");
    }
    while buf.last() == Some(&b'\n') || buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(String::from_utf8(buf)?)
}

async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<TestReply> {
    let line = read_line(reader).await?;
    let (marker, rest) = line.split_at(1);
    match marker {
        "+" => Ok(TestReply::Simple(rest.to_string())),
        "-" => Ok(TestReply::Error(rest.to_string())),
        ":" => Ok(TestReply::Integer(rest.parse().context("invalid integer reply")?)),
        "#" => Ok(TestReply::Boolean(rest == "t")),
        "$" => {
            let len: i64 = rest.parse().context("invalid bulk length")?;
            if len < 0 {
                return Ok(TestReply::Bulk(None));
            }
            let mut payload = vec![0u8; len as usize];
            reader.read_exact(&mut payload).await.context("read bulk payload")?;
            let mut crlf = [0u8; 2];
            reader.read_exact(&mut crlf).await.context("read bulk terminator")?;
            Ok(TestReply::Bulk(Some(String::from_utf8(payload)?)))
        },
        "*" => {
            let len: i64 = rest.parse().context("invalid array length")?;
            let mut items = Vec::with_capacity(len.max(0) as usize);
            for _ in 0..len.max(0) {
                items.push(Box::pin(read_reply(reader)).await?);
            }
            Ok(TestReply::Array(items))
        },
        "%" => {
            let len: i64 = rest.parse().context("invalid map length")?;
            let mut fields = Vec::with_capacity(len.max(0) as usize);
            for _ in 0..len.max(0) {
                let TestReply::Bulk(Some(key)) = Box::pin(read_reply(reader)).await? else {
                    bail!("map key was not a bulk string");
                };
                let value = Box::pin(read_reply(reader)).await?;
                fields.push((key, value));
            }
            Ok(TestReply::Map(fields))
        },
        other => bail!("unrecognized reply marker {other:?}"),
    }
}

pub fn default_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        auth_enabled: false,
        user: "memo".to_string(),
        password: "password".to_string(),
        wal_enabled: false,
        cleanup_enabled: false,
        cleanup_limit: 20,
        cleanup_interval_secs: 1,
    }
}

pub fn auth_enabled_config() -> ServerConfig {
    ServerConfig { auth_enabled: true, ..default_config() }
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
