// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::Result;

use crate::integration_tests::common::{TestReply, TestServer, default_config, sleep_ms};

#[tokio::test]
async fn set_with_ex_expires_after_the_deadline() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_array(&["SET", "k", "v", "EX", "1"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Simple("OK".to_string()));

    client.send_line("GET k").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(Some("v".to_string())));

    sleep_ms(1100).await;

    client.send_line("GET k").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(None));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn expire_with_nonpositive_seconds_deletes_immediately() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    client.send_line("SET k v").await?;
    client.read_reply().await?;

    client.send_array(&["EXPIRE", "k", "0"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(1));

    client.send_line("GET k").await?;
    assert_eq!(client.read_reply().await?, TestReply::Bulk(None));

    client.send_array(&["EXPIRE", "missing", "10"]).await?;
    assert_eq!(client.read_reply().await?, TestReply::Integer(0));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn keys_glob_matching() -> Result<()> {
    let server = TestServer::start(default_config()).await?;
    let mut client = server.connect().await?;

    for key in ["user:1", "user:2", "order:1"] {
        client.send_array(&["SET", key, "v"]).await?;
        client.read_reply().await?;
    }

    client.send_array(&["KEYS", "user:*"]).await?;
    let reply = client.read_reply().await?;
    let TestReply::Array(mut items) = reply else {
        panic!("expected array reply");
    };
    items.sort_by_key(|item| format!("{item:?}"));
    assert_eq!(
        items,
        vec![TestReply::Bulk(Some("user:1".to_string())), TestReply::Bulk(Some("user:2".to_string()))]
    );

    server.shutdown().await;
    Ok(())
}
