// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::integration_tests::common::{TestReply, TestServer, default_config};

#[tokio::test]
async fn lower_priority_wins_and_key_is_removed_on_drain() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_line("QADD q a").await?;
    assert_eq!(client.read_reply().await?, TestReply::Simple("OK".to_string()));

    client.send_array(&["QADD", "q", "b", "PR", "0"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Simple("OK".to_string()));

    client.send_line("QPOP q").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("b".to_string())));

    client.send_line("QPOP q").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("a".to_string())));

    client.send_line("QLEN q").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(None));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn qpop_on_empty_queue_returns_nil_never_errors() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_line("QPOP nosuch").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(None));

    server.shutdown().await;
    Ok(())
}
