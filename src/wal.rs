// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Write-ahead log: every mutating command is appended, RESP-bulk-string
//! encoded, before it's applied. On startup the log is replayed against an
//! empty keyspace to recover state (§4.9, §6).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};

use crate::{
    command::parse_command,
    keyspace::Keyspace,
    resp::frame::{Frame, encode_frame, read_frame},
};

pub const DEFAULT_WAL_NAME: &str = "wal.log";

/// Handle used by the dispatcher to submit a command line for durable
/// logging before applying it.
#[derive(Clone)]
pub struct WalWriter {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl WalWriter {
    /// A writer that discards everything (used during replay and when the
    /// WAL is disabled).
    pub fn disabled() -> Self {
        WalWriter { tx: None }
    }

    /// Queue `line` (already stringified via
    /// [`crate::tokenizer::stringify_tokens`]) for durable append. Silently
    /// a no-op if the writer task has gone away or the WAL is disabled.
    pub fn submit(&self, line: String) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(line);
        }
    }
}

/// Spawns the background task that owns the WAL file and serializes writes
/// to it. Returns a [`WalWriter`] handle and the task's `JoinHandle`.
pub async fn spawn_writer(path: impl AsRef<Path>) -> Result<(WalWriter, tokio::task::JoinHandle<()>)> {
    let path = path.as_ref().to_path_buf();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .with_context(|| format!("opening WAL file {}", path.display()))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            let frame = Frame::Bulk(Some(line.into_bytes()));
            let bytes = encode_frame(&frame);
            if let Err(err) = file.write_all(&bytes).await {
                warn!(error = %err, "WAL append failed");
                break;
            }
            if let Err(err) = file.flush().await {
                warn!(error = %err, "WAL flush failed");
                break;
            }
        }
    });

    Ok((WalWriter { tx: Some(tx) }, handle))
}

/// Replay every entry in `path` against `keyspace`. Each entry must decode
/// as a RESP bulk string holding a stringified command line; anything else
/// is a corrupt log, in which case the keyspace is flushed and the error is
/// returned rather than risking a partially-applied replay.
///
/// Returns the number of commands successfully applied.
pub async fn replay(path: impl AsRef<Path>, keyspace: &Keyspace) -> Result<u64> {
    let path: PathBuf = path.as_ref().to_path_buf();
    if !path.exists() {
        return Ok(0);
    }

    let file = File::open(&path).await.with_context(|| format!("opening WAL file {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut applied = 0u64;

    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(frame) => frame,
            Err(err) if err.to_string().contains("unexpected EOF") => break,
            Err(err) => {
                keyspace.flushall().await;
                bail!("corrupt WAL entry at record {applied}: {err}");
            },
        };

        let Frame::Bulk(Some(bytes)) = frame else {
            keyspace.flushall().await;
            bail!("corrupt WAL entry at record {applied}: expected a bulk string");
        };
        let line = String::from_utf8(bytes).with_context(|| "WAL entry is not valid UTF-8")?;
        let tokens = crate::tokenizer::split_tokens(&line).with_context(|| "WAL entry has unbalanced quotes")?;
        let command = parse_command(&tokens).with_context(|| format!("WAL entry does not parse: {line}"))?;

        crate::dispatcher::apply_mutating(keyspace, &command)
            .await
            .with_context(|| format!("WAL entry failed to apply: {line}"))?;
        applied += 1;
    }

    info!(applied, path = %path.display(), "replayed write-ahead log");
    Ok(applied)
}
