// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::integration_tests::common::{TestReply, TestServer, default_config};

#[tokio::test]
async fn set_get_scenario() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_line("SET name bill").await?;
    assert_eq!(client.read_reply().await?, TestReply::Simple("OK".to_string()));

    client.send_line("GET name").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("bill".to_string())));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn list_push_pop_scenario_matches_spec() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["LPUSH", "xs", "1", "2", "3"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(3));

    client.send_array(&["RPUSH", "xs", "4", "5"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(5));

    client.send_line("LPOP xs").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("3".to_string())));

    client.send_line("RPOP xs").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("5".to_string())));

    client.send_line("LLEN xs").await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(3));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn pop_on_drained_list_removes_key_and_returns_nil() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["LPUSH", "only", "a"]).await?;
    client.read_reply().await?;

    client.send_line("LPOP only").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("a".to_string())));

    client.send_line("LLEN only").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(None));

    client.send_line("LPOP only").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(None));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn get_against_a_list_key_is_wrong_type() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["LPUSH", "xs", "1"]).await?;
    client.read_reply().await?;

    client.send_line("GET xs").await?;
    assert_eq!(
        client.read_reply().await?,
        TestReply::Error("WRONGTYPE Operation against a key holding the wrong kind of value".to_string())
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn del_removes_multiple_keys_atomically() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_line("SET a 1").await?;
    client.read_reply().await?;
    client.send_line("SET b 2").await?;
    client.read_reply().await?;

    client.send_array(&["DEL", "a", "b", "c"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(2));

    client.send_line("DBSIZE").await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(0));

    server.shutdown().await;
    Ok(())
}
