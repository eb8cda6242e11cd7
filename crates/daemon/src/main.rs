// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! allci-runner binary entry point.

use std::sync::Arc;

use allci_adapters::LocalProcessAdapter;
use allci_runner::{env, logging, Args, Poller, ServiceClient, Settings};
use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(env::log_dir().as_deref()).context("cannot install logger")?;

    let settings = Settings::resolve(&args).context("invalid runner configuration")?;
    tracing::info!(
        runner = %settings.runner_name,
        service_url = %settings.service_url,
        build_root = %settings.build_root.display(),
        cache_root = %settings.cache_root.display(),
        "starting allci-runner"
    );

    let client = ServiceClient::new(&settings.service_url, settings.runner_name.clone())
        .context("invalid service url")?;
    let config = Arc::new(settings.engine_config());
    let poller = Poller::new(client, LocalProcessAdapter::new(), config)
        .with_intervals(settings.poll_frequency, settings.failed_poll_frequency);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    poller.run(shutdown, settings.once).await;
    Ok(())
}

/// Cancel `shutdown` on the first Ctrl-C or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot watch SIGTERM");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown requested, finishing current task");
    shutdown.cancel();
}
