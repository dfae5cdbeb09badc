// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controllers that watch ConfigMaps and Secrets and roll dependent workloads.

pub mod changes;
pub mod retry;
pub mod watched;

pub use changes::ChangeDetector;
pub use retry::{ExponentialBackoff, RetryBudget};
pub use watched::WatchedResource;

use crate::error::{ReloaderError, Result};
use crate::filter::ScopeFilter;
use crate::metrics::{Metrics, ReconcileOutcome};
use crate::upgrade::{rolling_upgrade, UpgradeOptions, UpgradeStrategy};
use futures::{future::FutureExt, stream, Future, Stream, StreamExt};
use kube::runtime::controller::{self, Action, Controller};
use kube::runtime::reflector::{self, store::Writer};
use kube::runtime::WatchStreamExt;
use kube::{Api, Client, ResourceExt};
use kube_runtime::watcher::{self, Config as WatcherConfig, Event};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Tuning shared by every controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub workers: usize,
    pub max_retries: u32,
    pub backoff: ExponentialBackoff,
    pub reload_on_create: bool,
}

/// Everything a reconciliation pass needs.
pub struct Context {
    pub client: Client,
    pub filter: Arc<ScopeFilter>,
    pub strategies: Vec<UpgradeStrategy>,
    pub options: UpgradeOptions,
    pub metrics: Arc<Metrics>,
    pub settings: ControllerSettings,
    pub retries: RetryBudget,
}

impl Context {
    pub fn new(
        client: Client,
        filter: ScopeFilter,
        strategies: Vec<UpgradeStrategy>,
        options: UpgradeOptions,
        metrics: Arc<Metrics>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            client,
            filter: Arc::new(filter),
            strategies,
            options,
            metrics,
            settings,
            retries: RetryBudget::new(settings.max_retries, settings.backoff),
        }
    }
}

/// Watches one resource kind and reconciles the objects whose data changed.
pub struct ResourceController<K: WatchedResource> {
    api: Api<K>,
    ctx: Arc<Context>,
}

impl<K: WatchedResource> ResourceController<K> {
    pub fn new(ctx: Arc<Context>) -> Self {
        let api = match ctx.filter.watch_namespace() {
            Some(namespace) => Api::namespaced(ctx.client.clone(), namespace),
            None => Api::all(ctx.client.clone()),
        };
        Self { api, ctx }
    }

    /// Run until `stop` flips to true or its sender is dropped.
    pub async fn run(self, stop: watch::Receiver<bool>) -> anyhow::Result<()> {
        let events = watcher::watcher(self.api.clone(), WatcherConfig::default()).default_backoff();
        self.run_with(events, stop).await
    }

    /// Run on an already established watch event stream.
    ///
    /// Passes in flight when `stop` fires are allowed to finish.
    pub async fn run_with<S>(self, events: S, stop: watch::Receiver<bool>) -> anyhow::Result<()>
    where
        S: Stream<Item = std::result::Result<Event<K>, watcher::Error>> + Send + 'static,
    {
        let (reader, writer) = reflector::store();
        let detector = ChangeDetector::new(self.ctx.filter.clone(), self.ctx.settings.reload_on_create);
        let concurrency = u16::try_from(self.ctx.settings.workers.max(1)).unwrap_or(u16::MAX);

        info!(
            "Starting {} controller with {} workers",
            K::KIND,
            concurrency
        );

        Controller::for_stream(trigger_stream(events, writer, detector), reader)
            .with_config(controller::Config::default().concurrency(concurrency))
            .graceful_shutdown_on(stopped(stop))
            .run(reconcile::<K>, error_policy::<K>, self.ctx)
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled {}", obj),
                    Err(e) => warn!("{} reconciliation error: {}", K::KIND, e),
                }
            })
            .await;

        info!("{} controller stopped", K::KIND);
        Ok(())
    }
}

/// Reflect `events` into the store, then emit the objects whose data changed.
///
/// The reflector writes each event to the store before yielding it, so an
/// emitted object is never newer than what the store holds.
pub(crate) fn trigger_stream<K, S>(
    events: S,
    writer: Writer<K>,
    mut detector: ChangeDetector<K>,
) -> impl Stream<Item = std::result::Result<K, watcher::Error>> + Send + 'static
where
    K: WatchedResource,
    S: Stream<Item = std::result::Result<Event<K>, watcher::Error>> + Send + 'static,
{
    reflector::reflector(writer, events).flat_map(move |event| {
        let triggers: Vec<std::result::Result<K, watcher::Error>> = match event {
            Ok(event) => detector.triggers(event).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        stream::iter(triggers)
    })
}

fn stopped(mut stop: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + Sync + 'static {
    async move {
        let _ = stop.wait_for(|stopped| *stopped).await;
    }
    .boxed()
    .shared()
}

fn retry_key<K: WatchedResource>(obj: &K) -> String {
    format!("{}/{}/{}", K::KIND, obj.namespace().unwrap_or_default(), obj.name_any())
}

async fn reconcile<K: WatchedResource>(obj: Arc<K>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = obj.namespace().unwrap_or_default();
    let name = obj.name_any();

    if !ctx.filter.in_scope(&namespace) {
        debug!("Skipping {} {}/{}: namespace out of scope", K::KIND, namespace, name);
        ctx.metrics.record_reconcile(K::KIND, ReconcileOutcome::Skipped);
        return Ok(Action::await_change());
    }

    let record = obj.change_record();
    if record.is_ignored() {
        debug!("{} {}/{} is annotated to be ignored", K::KIND, namespace, name);
        ctx.metrics.record_reconcile(K::KIND, ReconcileOutcome::Skipped);
        return Ok(Action::await_change());
    }

    let report = rolling_upgrade(
        &ctx.client,
        &ctx.strategies,
        &record,
        ctx.options,
        &ctx.metrics,
    )
    .await
    .into_result()?;

    if report.total() == 0 {
        debug!("No workloads depend on {} {}/{}", K::KIND, namespace, name);
    }
    ctx.retries.reset(&retry_key(obj.as_ref()));
    ctx.metrics.record_reconcile(K::KIND, ReconcileOutcome::Success);
    Ok(Action::await_change())
}

fn error_policy<K: WatchedResource>(obj: Arc<K>, error: &ReloaderError, ctx: Arc<Context>) -> Action {
    let key = retry_key(obj.as_ref());

    if error.is_retryable() {
        if let Some(delay) = ctx.retries.next_delay(&key) {
            warn!(
                "Error syncing {} (retry {} of {} in {:?}): {}",
                key,
                ctx.retries.retries(&key),
                ctx.settings.max_retries,
                delay,
                error
            );
            ctx.metrics.record_reconcile(K::KIND, ReconcileOutcome::Retry);
            return Action::requeue(delay);
        }
    }

    ctx.retries.reset(&key);
    error!("Dropping {} until its next change: {}", key, error);
    ctx.metrics.record_reconcile(K::KIND, ReconcileOutcome::Dropped);
    Action::await_change()
}
