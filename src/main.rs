// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::Client;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reloader::config::Config;
use reloader::fingerprint::ResourceKind;
use reloader::kubernetes::is_openshift;
use reloader::metrics::Metrics;
use reloader::reconcilers::{Context, ResourceController};
use reloader::upgrade::UpgradeStrategy;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Reloader");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: namespace={}, ignored_namespaces={}, auto_reload_all={}",
        config.namespace.as_deref().unwrap_or("<all>"),
        config.ignored_namespaces.len(),
        config.auto_reload_all
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let openshift = match is_openshift(&client).await {
        Ok(found) => found,
        Err(e) => {
            warn!("OpenShift detection failed, DeploymentConfigs disabled: {}", e);
            false
        }
    };

    let ctx = Arc::new(Context::new(
        client,
        config.scope_filter(),
        UpgradeStrategy::enabled(openshift),
        config.upgrade_options(),
        Arc::new(Metrics::new()),
        config.controller_settings(),
    ));

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut controllers = tokio::task::JoinSet::new();
    if config.watches(ResourceKind::ConfigMap) {
        controllers.spawn(ResourceController::<ConfigMap>::new(ctx.clone()).run(stop_rx.clone()));
    }
    if config.watches(ResourceKind::Secret) {
        controllers.spawn(ResourceController::<Secret>::new(ctx.clone()).run(stop_rx.clone()));
    }
    if controllers.is_empty() {
        warn!("Both ConfigMaps and Secrets are ignored, nothing to watch");
        return Ok(());
    }

    let stopped = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            None
        }
        result = controllers.join_next() => result,
    };

    let _ = stop_tx.send(true);
    if let Some(result) = stopped {
        warn!("A controller stopped unexpectedly");
        result??;
    }
    while let Some(result) = controllers.join_next().await {
        result??;
    }

    if let Ok(text) = ctx.metrics.encode() {
        info!("Final metrics:\n{}", text);
    }
    Ok(())
}
