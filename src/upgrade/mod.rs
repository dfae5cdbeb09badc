// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rolling upgrade triggers for the supported workload kinds.
//!
//! Each [`UpgradeStrategy`] lists the workloads of one kind in a namespace.
//! A listed [`Target`] can tell whether it depends on a change and, if so,
//! receives the trigger environment variable; the platform's own controller
//! then performs the rollout.

pub mod envvar;
pub mod matching;

use crate::error::{ReloaderError, Result};
use crate::fingerprint::ChangeRecord;
use crate::metrics::Metrics;
use crate::types::DeploymentConfig;
use envvar::{env_var_name, upsert_env_var};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{ListParams, PostParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::{debug, error, info, instrument};

/// One supported workload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStrategy {
    Deployment,
    DaemonSet,
    StatefulSet,
    /// OpenShift only
    DeploymentConfig,
}

impl UpgradeStrategy {
    /// Strategies available on the current platform
    pub fn enabled(openshift: bool) -> Vec<Self> {
        let mut strategies = vec![
            UpgradeStrategy::Deployment,
            UpgradeStrategy::DaemonSet,
            UpgradeStrategy::StatefulSet,
        ];
        if openshift {
            strategies.push(UpgradeStrategy::DeploymentConfig);
        }
        strategies
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpgradeStrategy::Deployment => "Deployment",
            UpgradeStrategy::DaemonSet => "DaemonSet",
            UpgradeStrategy::StatefulSet => "StatefulSet",
            UpgradeStrategy::DeploymentConfig => "DeploymentConfig",
        }
    }

    /// All workloads of this kind in `namespace`
    #[instrument(skip(self, client), fields(kind = self.kind()))]
    pub async fn list(&self, client: &Client, namespace: &str) -> Result<Vec<Target>> {
        let listed = match self {
            UpgradeStrategy::Deployment => list_as(client, namespace, Target::Deployment).await,
            UpgradeStrategy::DaemonSet => list_as(client, namespace, Target::DaemonSet).await,
            UpgradeStrategy::StatefulSet => list_as(client, namespace, Target::StatefulSet).await,
            UpgradeStrategy::DeploymentConfig => {
                list_as(client, namespace, Target::DeploymentConfig).await
            }
        };

        listed.map_err(|source| ReloaderError::ListFailed {
            kind: self.kind(),
            namespace: namespace.to_string(),
            source,
        })
    }
}

async fn list_as<K, F>(
    client: &Client,
    namespace: &str,
    wrap: F,
) -> std::result::Result<Vec<Target>, kube::Error>
where
    F: Fn(K) -> Target,
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    let list = api.list(&ListParams::default()).await?;
    Ok(list.items.into_iter().map(wrap).collect())
}

/// What applying a change did to a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Updated,
    /// The template already carried the fingerprint
    Unchanged,
}

/// A workload that may be rolled.
#[derive(Debug, Clone)]
pub enum Target {
    Deployment(Deployment),
    DaemonSet(DaemonSet),
    StatefulSet(StatefulSet),
    DeploymentConfig(DeploymentConfig),
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Deployment(_) => UpgradeStrategy::Deployment.kind(),
            Target::DaemonSet(_) => UpgradeStrategy::DaemonSet.kind(),
            Target::StatefulSet(_) => UpgradeStrategy::StatefulSet.kind(),
            Target::DeploymentConfig(_) => UpgradeStrategy::DeploymentConfig.kind(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Target::Deployment(o) => o.name_any(),
            Target::DaemonSet(o) => o.name_any(),
            Target::StatefulSet(o) => o.name_any(),
            Target::DeploymentConfig(o) => o.name_any(),
        }
    }

    pub fn namespace(&self) -> String {
        let namespace = match self {
            Target::Deployment(o) => o.namespace(),
            Target::DaemonSet(o) => o.namespace(),
            Target::StatefulSet(o) => o.namespace(),
            Target::DeploymentConfig(o) => o.namespace(),
        };
        namespace.unwrap_or_default()
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        match self {
            Target::Deployment(o) => o.annotations(),
            Target::DaemonSet(o) => o.annotations(),
            Target::StatefulSet(o) => o.annotations(),
            Target::DeploymentConfig(o) => o.annotations(),
        }
    }

    pub fn pod_template(&self) -> Option<&PodTemplateSpec> {
        match self {
            Target::Deployment(o) => o.spec.as_ref().map(|s| &s.template),
            Target::DaemonSet(o) => o.spec.as_ref().map(|s| &s.template),
            Target::StatefulSet(o) => o.spec.as_ref().map(|s| &s.template),
            Target::DeploymentConfig(o) => o.spec.template.as_ref(),
        }
    }

    fn pod_template_mut(&mut self) -> Option<&mut PodTemplateSpec> {
        match self {
            Target::Deployment(o) => o.spec.as_mut().map(|s| &mut s.template),
            Target::DaemonSet(o) => o.spec.as_mut().map(|s| &mut s.template),
            Target::StatefulSet(o) => o.spec.as_mut().map(|s| &mut s.template),
            Target::DeploymentConfig(o) => o.spec.template.as_mut(),
        }
    }

    /// True if this workload depends on the changed resource
    pub fn matches(&self, record: &ChangeRecord, auto_reload_all: bool) -> bool {
        self.pod_template().is_some_and(|template| {
            matching::should_reload(self.annotations(), template, record, auto_reload_all)
        })
    }

    /// Set the trigger variable and persist the workload if it changed.
    ///
    /// The replace carries the resourceVersion that was listed, so a
    /// concurrent modification surfaces as a 409 conflict.
    #[instrument(skip(self, client, record), fields(kind = self.kind(), name = %self.name()))]
    pub async fn apply(&self, client: &Client, record: &ChangeRecord) -> Result<ApplyOutcome> {
        let mut updated = self.clone();
        let Some(template) = updated.pod_template_mut() else {
            return Err(ReloaderError::MissingPodTemplate(format!(
                "{} {}/{}",
                self.kind(),
                self.namespace(),
                self.name()
            )));
        };

        if !upsert_env_var(template, &env_var_name(record), &record.sha_value) {
            return Ok(ApplyOutcome::Unchanged);
        }

        let namespace = self.namespace();
        match &updated {
            Target::Deployment(o) => replace(client, &namespace, o).await?,
            Target::DaemonSet(o) => replace(client, &namespace, o).await?,
            Target::StatefulSet(o) => replace(client, &namespace, o).await?,
            Target::DeploymentConfig(o) => replace(client, &namespace, o).await?,
        }
        Ok(ApplyOutcome::Updated)
    }
}

async fn replace<K>(client: &Client, namespace: &str, object: &K) -> Result<()>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    api.replace(&object.name_any(), &PostParams::default(), object)
        .await?;
    Ok(())
}

/// Settings shared by all strategies
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeOptions {
    pub auto_reload_all: bool,
}

/// Per-target results of one rolling upgrade pass.
#[derive(Debug, Default)]
pub struct UpgradeReport {
    /// `Kind/name` of every updated workload
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub failed: Vec<(String, ReloaderError)>,
    pub list_errors: Vec<ReloaderError>,
}

impl UpgradeReport {
    /// Matched workloads, whatever happened to them
    pub fn total(&self) -> usize {
        self.updated.len() + self.unchanged + self.failed.len()
    }

    /// Fails if any kind could not be listed or any workload failed to update
    pub fn into_result(mut self) -> Result<Self> {
        if !self.list_errors.is_empty() {
            return Err(self.list_errors.remove(0));
        }
        if !self.failed.is_empty() {
            return Err(ReloaderError::UpgradeFailed {
                failed: self.failed.len(),
                total: self.total(),
            });
        }
        Ok(self)
    }
}

/// Roll every workload in the record's namespace that depends on it.
///
/// A failure on one workload or one kind does not stop the others.
#[instrument(skip_all, fields(resource = %format!("{}/{}", record.namespace, record.resource_name), kind = %record.kind))]
pub async fn rolling_upgrade(
    client: &Client,
    strategies: &[UpgradeStrategy],
    record: &ChangeRecord,
    options: UpgradeOptions,
    metrics: &Metrics,
) -> UpgradeReport {
    let mut report = UpgradeReport::default();

    for strategy in strategies {
        let targets = match strategy.list(client, &record.namespace).await {
            Ok(t) => t,
            Err(e) => {
                error!("{}", e);
                report.list_errors.push(e);
                continue;
            }
        };

        for target in targets
            .iter()
            .filter(|t| t.matches(record, options.auto_reload_all))
        {
            let id = format!("{}/{}", target.kind(), target.name());
            match target.apply(client, record).await {
                Ok(ApplyOutcome::Updated) => {
                    info!(
                        "Changes detected in {} {}, updated {} in namespace {}",
                        record.kind, record.resource_name, id, record.namespace
                    );
                    metrics.record_reload(target.kind(), true);
                    report.updated.push(id);
                }
                Ok(ApplyOutcome::Unchanged) => {
                    debug!("{} already carries the current fingerprint", id);
                    report.unchanged += 1;
                }
                Err(e) => {
                    error!("Failed to update {}: {}", id, e);
                    metrics.record_reload(target.kind(), false);
                    report.failed.push((id, e));
                }
            }
        }
    }

    report
}
