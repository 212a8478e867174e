// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use memo_rs::{
    dispatcher::{EngineContext, serve},
    keyspace::Keyspace,
    wal,
};
use tempfile::tempdir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::integration_tests::common::{Client, TestReply, default_config};

/// Simulates a restart: one server writes through the WAL, is torn down,
/// and a fresh keyspace replays the same WAL file before serving again.
#[tokio::test]
async fn state_survives_a_restart_via_wal_replay() -> Result<()> {
    let dir = tempdir().context("tempdir")?;
    let wal_path = dir.path().join("wal.log");

    let config = default_config();

    // First "process": WAL enabled, take a few mutations, then shut down
    // without an explicit flush (the writer task flushes on every append).
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.context("bind")?;
        let addr = listener.local_addr().context("local addr")?;
        let keyspace = Keyspace::new();
        let (writer, handle) = wal::spawn_writer(&wal_path).await.context("spawn writer")?;
        let mut config = config.clone();
        config.wal_enabled = true;
        let ctx = EngineContext::new(keyspace, config, writer);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let server = tokio::spawn(async move { serve(listener, ctx, task_cancel).await });

        let mut client = Client::connect(addr).await?;
        client.send_line("SET name bill").await?;
        assert_eq!(client.read_reply().await?, TestReply::Simple("OK".to_string()));
        client.send_array(&["LPUSH", "xs", "1", "2", "3"]).await?;
        assert_eq!(client.read_reply().await?, TestReply::Integer(3));
        // GET is non-mutating and must not appear in the replayed log.
        client.send_line("GET name").await?;
        assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("bill".to_string())));

        cancel.cancel();
        let _ = server.await;
        drop(client);
        let _ = handle.await;
    }

    // Second "process": fresh keyspace, replay the same WAL file.
    let keyspace = Keyspace::new();
    let applied = wal::replay(&wal_path, &keyspace).await.context("replay")?;
    assert_eq!(applied, 2);

    let listener = TcpListener::bind("127.0.0.1:0").await.context("bind")?;
    let addr = listener.local_addr().context("local addr")?;
    let (writer, _handle) = wal::spawn_writer(&wal_path).await.context("spawn writer")?;
    let mut config = config;
    config.wal_enabled = true;
    let ctx = EngineContext::new(keyspace, config, writer);
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let server = tokio::spawn(async move { serve(listener, ctx, task_cancel).await });

    let mut client = Client::connect(addr).await?;
    client.send_line("GET name").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("bill".to_string())));
    client.send_line("LLEN xs").await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(3));

    cancel.cancel();
    let _ = server.await;
    Ok(())
}

#[tokio::test]
async fn replay_of_absent_wal_file_yields_an_empty_keyspace() -> Result<()> {
    let dir = tempdir().context("tempdir")?;
    let wal_path = dir.path().join("never-written.log");

    let keyspace = Keyspace::new();
    let applied = wal::replay(&wal_path, &keyspace).await.context("replay")?;
    assert_eq!(applied, 0);
    assert_eq!(keyspace.dbsize().await, 0);
    Ok(())
}
