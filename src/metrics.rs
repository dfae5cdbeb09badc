// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Prometheus counters for reconciliations and triggered reloads.
//!
//! Exported metrics:
//! - `reloader_reconcile_total` (counter): passes per watched resource kind and result.
//! - `reloader_reload_executed_total` (counter): workload updates per workload kind and success.

use crate::fingerprint::ResourceKind;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Success,
    /// Out of scope, deleted, or opted out
    Skipped,
    /// Failed and requeued with backoff
    Retry,
    /// Failed with the retry budget exhausted
    Dropped,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Success => "success",
            ReconcileOutcome::Skipped => "skipped",
            ReconcileOutcome::Retry => "retry",
            ReconcileOutcome::Dropped => "dropped",
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReconcileLabels {
    pub resource: String,
    pub result: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReloadLabels {
    /// Workload kind, e.g. "Deployment"
    pub workload: String,
    pub success: String,
}

pub struct Metrics {
    registry: Registry,
    reconcile: Family<ReconcileLabels, Counter>,
    reloads: Family<ReloadLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("reloader");
        let reconcile = Family::<ReconcileLabels, Counter>::default();
        let reloads = Family::<ReloadLabels, Counter>::default();

        registry.register(
            "reconcile",
            "Reconciliation passes by watched resource kind and result",
            reconcile.clone(),
        );
        registry.register(
            "reload_executed",
            "Workload rolling upgrades by workload kind and success",
            reloads.clone(),
        );

        Self {
            registry,
            reconcile,
            reloads,
        }
    }

    pub fn record_reconcile(&self, kind: ResourceKind, outcome: ReconcileOutcome) {
        self.reconcile
            .get_or_create(&reconcile_labels(kind, outcome))
            .inc();
    }

    pub fn record_reload(&self, workload: &str, success: bool) {
        self.reloads.get_or_create(&reload_labels(workload, success)).inc();
    }

    pub fn reconcile_count(&self, kind: ResourceKind, outcome: ReconcileOutcome) -> u64 {
        self.reconcile
            .get_or_create(&reconcile_labels(kind, outcome))
            .get()
    }

    pub fn reload_count(&self, workload: &str, success: bool) -> u64 {
        self.reloads.get_or_create(&reload_labels(workload, success)).get()
    }

    /// Render all metrics in the OpenMetrics text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn reconcile_labels(kind: ResourceKind, outcome: ReconcileOutcome) -> ReconcileLabels {
    ReconcileLabels {
        resource: kind.as_str().to_string(),
        result: outcome.as_str().to_string(),
    }
}

fn reload_labels(workload: &str, success: bool) -> ReloadLabels {
    ReloadLabels {
        workload: workload.to_string(),
        success: success.to_string(),
    }
}
