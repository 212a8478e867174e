// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use clap::Parser;
use memo_rs::{
    cfg::{cli::Cli, config::ServerConfig, logger::init_logger},
    dispatcher::{bind, run_sweep, serve, EngineContext},
    keyspace::Keyspace,
    wal,
};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbosity.log_level_filter(), cli.log_format).context("failed to initialize logger")?;

    let config = ServerConfig::from_cli(&cli);
    let keyspace = Keyspace::new();

    if config.wal_enabled {
        match wal::replay(config.wal_path(), &keyspace).await {
            Ok(applied) => info!(applied, "replayed write-ahead log on startup"),
            Err(err) => error!(error = %err, "WAL replay failed; continuing with an empty keyspace"),
        }
    }

    let wal_writer = if config.wal_enabled {
        let (writer, _handle) = wal::spawn_writer(config.wal_path())
            .await
            .context("failed to open write-ahead log")?;
        writer
    } else {
        wal::WalWriter::disabled()
    };

    let listener = bind(&config).await?;
    let ctx = EngineContext::new(keyspace.clone(), config.clone(), wal_writer);
    let cancel = CancellationToken::new();

    let mut tasks = Vec::new();
    if config.cleanup_enabled {
        let keyspace = keyspace.clone();
        let limit = config.cleanup_limit;
        let period = Duration::from_secs(config.cleanup_interval_secs.max(1));
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(run_sweep(keyspace, limit, period, cancel)));
    }

    let serve_cancel = cancel.clone();
    let mut serve_task = tokio::spawn(async move { serve(listener, ctx, serve_cancel).await });

    tokio::select! {
        result = &mut serve_task => {
            result.context("accept loop task panicked")??;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
            cancel.cancel();
            serve_task.await.context("accept loop task panicked")??;
        },
    }

    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}
