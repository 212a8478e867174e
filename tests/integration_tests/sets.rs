// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::integration_tests::common::{TestReply, TestServer, default_config};

#[tokio::test]
async fn sadd_reply_is_argument_count_scenario() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["SADD", "s", "a", "b", "c"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(3));

    client.send_array(&["SADD", "s", "a"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(1));

    client.send_line("SCARD s").await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(3));

    client.send_array(&["SISMEMBER", "s", "b"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Boolean(true));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn sinter_is_empty_when_an_operand_is_missing() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["SADD", "a", "x", "y"]).await?;
    client.read_reply().await?;

    client.send_array(&["SINTER", "a", "nope"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Array(vec![]));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn srem_keeps_key_when_set_empties() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["SADD", "s", "only"]).await?;
    client.read_reply().await?;

    client.send_array(&["SREM", "s", "only"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(1));

    client.send_line("SCARD s").await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(0));

    server.shutdown().await;
    Ok(())
}
