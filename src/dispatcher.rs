// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! TCP accept loop, per-connection state machine, and command execution
//! against the keyspace (§4.7).

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncWriteExt, BufReader, BufWriter},
    net::{TcpListener, TcpStream},
    time::{Duration, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    cfg::ServerConfig,
    command::{AuthOptions, Command, CommandKind, parse_command},
    error::EngineError,
    keyspace::Keyspace,
    resp::{Reply, frame::read_frame},
    tokenizer::stringify_tokens,
    wal::WalWriter,
};

const SERVER_NAME: &str = "memo";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const SUPPORTED_RESP_VERSION: &str = "2";

/// Everything a connection task needs to execute commands: the shared
/// keyspace, the resolved configuration, the WAL submission handle, and the
/// process-wide connection counter (surfaced via INFO/HELLO).
#[derive(Clone)]
pub struct EngineContext {
    pub keyspace: Keyspace,
    pub config: ServerConfig,
    pub wal: WalWriter,
    pub connections: Arc<AtomicI64>,
}

impl EngineContext {
    pub fn new(keyspace: Keyspace, config: ServerConfig, wal: WalWriter) -> Self {
        EngineContext { keyspace, config, wal, connections: Arc::new(AtomicI64::new(0)) }
    }

    fn credentials_match(&self, auth: &AuthOptions) -> bool {
        auth.user == self.config.user && auth.password == self.config.password
    }

    fn server_info(&self) -> Reply {
        Reply::Map(vec![
            ("Server".to_string(), Reply::Bulk(SERVER_NAME.to_string())),
            ("Version".to_string(), Reply::Bulk(SERVER_VERSION.to_string())),
            ("Proto".to_string(), Reply::Bulk(SUPPORTED_RESP_VERSION.to_string())),
            ("Mode".to_string(), Reply::Bulk("standalone".to_string())),
            (
                "Modules".to_string(),
                Reply::Array(
                    ["scalar", "queue", "list", "set"]
                        .into_iter()
                        .map(|m| Reply::Bulk(m.to_string()))
                        .collect(),
                ),
            ),
            ("Connections".to_string(), Reply::Integer(self.connections.load(Ordering::Relaxed))),
        ])
    }
}

/// Connection-local authentication state (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnState {
    AwaitingAuth,
    Active,
}

/// Apply a single mutating command directly to `keyspace`, discarding its
/// reply value. Used by WAL replay, which only ever sees mutating commands
/// and runs with no connection/auth context.
pub async fn apply_mutating(keyspace: &Keyspace, command: &Command) -> Result<(), EngineError> {
    let Some(kind) = &command.kind else {
        return Err(EngineError::UnknownCommand(String::new()));
    };
    match kind {
        CommandKind::Set => {
            keyspace.set(&command.key, &command.value, command.expire_seconds).await;
            Ok(())
        },
        CommandKind::Del => {
            keyspace.del(&command.keys).await;
            Ok(())
        },
        CommandKind::FlushAll => {
            keyspace.flushall().await;
            Ok(())
        },
        CommandKind::Expire => {
            keyspace.expire(&command.key, command.expire_seconds).await;
            Ok(())
        },
        CommandKind::QAdd => keyspace.qadd(&command.key, &command.values, command.priority).await,
        CommandKind::QPop => keyspace.qpop(&command.key).await.map(|_| ()),
        CommandKind::LPush => keyspace.lpush(&command.key, &command.values).await.map(|_| ()),
        CommandKind::LPop => keyspace.lpop(&command.key).await.map(|_| ()),
        CommandKind::RPush => keyspace.rpush(&command.key, &command.values).await.map(|_| ()),
        CommandKind::RPop => keyspace.rpop(&command.key).await.map(|_| ()),
        CommandKind::SAdd => keyspace.sadd(&command.key, &command.values).await.map(|_| ()),
        CommandKind::SRem => keyspace.srem(&command.key, &command.values).await.map(|_| ()),
        other => {
            let _ = other;
            Ok(())
        },
    }
}

/// Execute any command (mutating or not) and produce the reply to send
/// back. AUTH/HELLO transitions to `Active` are reported via the returned
/// `bool`; the caller updates its own connection state accordingly.
async fn execute(ctx: &EngineContext, command: &Command) -> (Reply, Option<ConnState>) {
    let Some(kind) = &command.kind else {
        return (Reply::Error(EngineError::UnknownCommand(String::new()).to_string()), None);
    };

    let result: Result<(Reply, Option<ConnState>), EngineError> = async {
        match kind {
            CommandKind::Version => {
                Ok((Reply::Bulk(format!("Memo server version {SERVER_VERSION}")), None))
            },
            CommandKind::Ping => Ok((Reply::Pong, None)),
            CommandKind::Info => Ok((ctx.server_info(), None)),
            CommandKind::DbSize => Ok((Reply::Integer(ctx.keyspace.dbsize().await), None)),
            CommandKind::FlushAll => {
                ctx.keyspace.flushall().await;
                Ok((Reply::Ok, None))
            },
            CommandKind::Keys => {
                let keys = ctx.keyspace.keys(&command.pattern).await?;
                Ok((keys.into(), None))
            },
            CommandKind::Cleanup => {
                Ok((Reply::Integer(ctx.keyspace.cleanup(command.limit).await), None))
            },
            CommandKind::Expire => {
                let existed = ctx.keyspace.expire(&command.key, command.expire_seconds).await;
                Ok((Reply::Integer(i64::from(existed)), None))
            },
            CommandKind::Auth => {
                if !ctx.credentials_match(&command.auth) {
                    return Err(EngineError::WrongPass);
                }
                Ok((Reply::Ok, Some(ConnState::Active)))
            },
            CommandKind::Hello => {
                if command.resp_version != SUPPORTED_RESP_VERSION {
                    return Err(EngineError::NoProto);
                }
                if ctx.config.auth_enabled {
                    if command.auth == AuthOptions::default() {
                        return Err(EngineError::NoAuth);
                    }
                    if !ctx.credentials_match(&command.auth) {
                        return Err(EngineError::WrongPass);
                    }
                }
                Ok((ctx.server_info(), Some(ConnState::Active)))
            },
            CommandKind::Set => {
                ctx.keyspace.set(&command.key, &command.value, command.expire_seconds).await;
                Ok((Reply::Ok, None))
            },
            CommandKind::Get => {
                let value = ctx.keyspace.get(&command.key).await?;
                Ok((value.map_or(Reply::Nil, Reply::Bulk), None))
            },
            CommandKind::Del => Ok((Reply::Integer(ctx.keyspace.del(&command.keys).await), None)),
            CommandKind::QAdd => {
                ctx.keyspace.qadd(&command.key, &command.values, command.priority).await?;
                Ok((Reply::Ok, None))
            },
            CommandKind::QPop => {
                let popped = ctx.keyspace.qpop(&command.key).await?;
                Ok((if popped.is_empty() { Reply::Nil } else { Reply::Bulk(popped) }, None))
            },
            CommandKind::QLen => {
                let len = ctx.keyspace.qlen(&command.key).await?;
                Ok((len.map_or(Reply::Nil, Reply::Integer), None))
            },
            CommandKind::LPush => {
                let len = ctx.keyspace.lpush(&command.key, &command.values).await?;
                Ok((Reply::Integer(len), None))
            },
            CommandKind::RPush => {
                let len = ctx.keyspace.rpush(&command.key, &command.values).await?;
                Ok((Reply::Integer(len), None))
            },
            CommandKind::LPop => {
                let popped = ctx.keyspace.lpop(&command.key).await?;
                Ok((if popped.is_empty() { Reply::Nil } else { Reply::Bulk(popped) }, None))
            },
            CommandKind::RPop => {
                let popped = ctx.keyspace.rpop(&command.key).await?;
                Ok((if popped.is_empty() { Reply::Nil } else { Reply::Bulk(popped) }, None))
            },
            CommandKind::LLen => {
                let len = ctx.keyspace.llen(&command.key).await?;
                Ok((len.map_or(Reply::Nil, Reply::Integer), None))
            },
            CommandKind::SAdd => {
                let n = ctx.keyspace.sadd(&command.key, &command.values).await?;
                Ok((Reply::Integer(n), None))
            },
            CommandKind::SRem => {
                let n = ctx.keyspace.srem(&command.key, &command.values).await?;
                Ok((Reply::Integer(n), None))
            },
            CommandKind::SMembers => {
                let members = ctx.keyspace.smembers(&command.key).await?;
                Ok((members.into(), None))
            },
            CommandKind::SIsMember => {
                let present = ctx.keyspace.sismember(&command.key, &command.value).await?;
                Ok((Reply::Boolean(present), None))
            },
            CommandKind::SCard => Ok((Reply::Integer(ctx.keyspace.scard(&command.key).await?), None)),
            CommandKind::SInter => {
                let members = ctx.keyspace.sinter(&command.keys).await?;
                Ok((members.into(), None))
            },
        }
    }
    .await;

    match result {
        Ok((reply, transition)) => (reply, transition),
        Err(err) => (Reply::Error(err.to_string()), None),
    }
}

/// True for AUTH/HELLO, the only commands a connection in `AwaitingAuth`
/// may issue.
fn allowed_before_auth(kind: &CommandKind) -> bool {
    matches!(kind, CommandKind::Auth | CommandKind::Hello)
}

/// Serve one accepted TCP connection until EOF or an unrecoverable I/O
/// error.
async fn handle_connection(ctx: EngineContext, stream: TcpStream, cancel: CancellationToken) {
    let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "?".to_string());
    ctx.connections.fetch_add(1, Ordering::Relaxed);

    let mut state = if ctx.config.auth_enabled { ConnState::AwaitingAuth } else { ConnState::Active };
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(write_half);

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = read_frame(&mut reader) => frame,
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                debug!(%peer, error = %err, "connection closed");
                break;
            },
        };

        let tokens = match frame.into_tokens() {
            Ok(tokens) => tokens,
            Err(err) => {
                let reply = Reply::Error(EngineError::from(err).to_string());
                if write_reply(&mut writer, &reply).await.is_err() {
                    break;
                }
                continue;
            },
        };

        if tokens.is_empty() {
            continue;
        }

        let command = match parse_command(&tokens) {
            Ok(command) => command,
            Err(err) => {
                let reply = Reply::Error(err.to_string());
                if write_reply(&mut writer, &reply).await.is_err() {
                    break;
                }
                continue;
            },
        };
        let Some(kind) = command.kind.clone() else {
            continue;
        };

        if state == ConnState::AwaitingAuth && !allowed_before_auth(&kind) {
            let reply = Reply::Error(EngineError::NoAuth.to_string());
            if write_reply(&mut writer, &reply).await.is_err() {
                break;
            }
            continue;
        }

        if kind.is_mutating() && ctx.config.wal_enabled {
            ctx.wal.submit(stringify_tokens(&tokens));
        }

        let (reply, transition) = execute(&ctx, &command).await;
        if let Some(next) = transition {
            state = next;
        }

        if write_reply(&mut writer, &reply).await.is_err() {
            break;
        }
    }

    ctx.connections.fetch_sub(1, Ordering::Relaxed);
    debug!(%peer, "connection closed");
}

async fn write_reply<W: AsyncWriteExt + Unpin>(writer: &mut W, reply: &Reply) -> std::io::Result<()> {
    writer.write_all(&reply.encode()).await?;
    writer.flush().await
}

/// Accept connections until `cancel` fires, spawning one task per
/// connection.
pub async fn serve(listener: TcpListener, ctx: EngineContext, cancel: CancellationToken) -> Result<()> {
    info!(addr = %listener.local_addr().context("listener has no local address")?, "accepting connections");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("shutting down accept loop");
                return Ok(());
            },
            accepted = listener.accept() => {
                let (stream, _) = accepted.context("accept failed")?;
                let ctx = ctx.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    handle_connection(ctx, stream, cancel).await;
                });
            }
        }
    }
}

/// Periodically sweep the keyspace for expired keys until `cancel` fires.
pub async fn run_sweep(keyspace: Keyspace, limit: i64, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval(period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let removed = keyspace.cleanup(limit).await;
                if removed > 0 {
                    debug!(removed, "swept expired keys");
                }
            }
        }
    }
}

/// Binds the configured TCP port. Split out so `main` can surface a clean
/// startup error without half-constructing the rest of the server.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let addr = format!("0.0.0.0:{}", config.port);
    TcpListener::bind(&addr).await.with_context(|| format!("binding {addr}"))
}
