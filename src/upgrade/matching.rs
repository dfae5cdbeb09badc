// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decides whether a workload depends on a changed ConfigMap or Secret.

use crate::constants::annotations;
use crate::fingerprint::{ChangeRecord, ResourceKind};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, Volume};
use std::collections::BTreeMap;
use tracing::debug;

/// Annotations of a workload, falling back to its pod template.
struct WorkloadAnnotations<'a> {
    workload: &'a BTreeMap<String, String>,
    template: Option<&'a BTreeMap<String, String>>,
}

impl<'a> WorkloadAnnotations<'a> {
    fn get(&self, key: &str) -> Option<&'a str> {
        self.workload
            .get(key)
            .or_else(|| self.template.and_then(|t| t.get(key)))
            .map(|v| v.trim())
    }

    fn is_true(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

/// True if the workload must be rolled for `record`.
pub fn should_reload(
    workload_annotations: &BTreeMap<String, String>,
    template: &PodTemplateSpec,
    record: &ChangeRecord,
    auto_reload_all: bool,
) -> bool {
    let found = WorkloadAnnotations {
        workload: workload_annotations,
        template: template
            .metadata
            .as_ref()
            .and_then(|m| m.annotations.as_ref()),
    };

    if let Some(names) = found.get(record.annotation) {
        if names.split(',').any(|n| n.trim() == record.resource_name) {
            debug!("Matched {} {} via reload annotation", record.kind, record.resource_name);
            return true;
        }
    }

    if found.is_true(annotations::SEARCH) && record.is_match_enabled() {
        debug!("Matched {} {} via search annotation", record.kind, record.resource_name);
        return true;
    }

    if auto_enabled(&found, record.kind, auto_reload_all) {
        if let Some(spec) = &template.spec {
            return references(spec, record.kind, &record.resource_name);
        }
    }

    false
}

fn auto_enabled(found: &WorkloadAnnotations<'_>, kind: ResourceKind, global: bool) -> bool {
    match found.get(annotations::AUTO) {
        Some(v) if v.eq_ignore_ascii_case("false") => false,
        Some(v) if v.eq_ignore_ascii_case("true") => true,
        _ => global || found.is_true(kind.auto_annotation()),
    }
}

/// True if the pod spec mounts or injects the named resource.
pub fn references(spec: &PodSpec, kind: ResourceKind, name: &str) -> bool {
    let in_volumes = spec
        .volumes
        .iter()
        .flatten()
        .any(|v| volume_references(v, kind, name));

    let in_containers = spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten())
        .any(|c| container_references(c, kind, name));

    in_volumes || in_containers
}

fn volume_references(volume: &Volume, kind: ResourceKind, name: &str) -> bool {
    let direct = match kind {
        ResourceKind::ConfigMap => volume
            .config_map
            .as_ref()
            .is_some_and(|cm| cm.name == name),
        ResourceKind::Secret => volume
            .secret
            .as_ref()
            .is_some_and(|s| s.secret_name.as_deref() == Some(name)),
    };
    if direct {
        return true;
    }

    volume
        .projected
        .as_ref()
        .and_then(|p| p.sources.as_ref())
        .is_some_and(|sources| {
            sources.iter().any(|source| match kind {
                ResourceKind::ConfigMap => source
                    .config_map
                    .as_ref()
                    .is_some_and(|cm| cm.name == name),
                ResourceKind::Secret => source
                    .secret
                    .as_ref()
                    .is_some_and(|s| s.name == name),
            })
        })
}

fn container_references(container: &Container, kind: ResourceKind, name: &str) -> bool {
    let env_from = container.env_from.iter().flatten().any(|source| match kind {
        ResourceKind::ConfigMap => source
            .config_map_ref
            .as_ref()
            .is_some_and(|r| r.name == name),
        ResourceKind::Secret => source
            .secret_ref
            .as_ref()
            .is_some_and(|r| r.name == name),
    });
    if env_from {
        return true;
    }

    container
        .env
        .iter()
        .flatten()
        .filter_map(|e| e.value_from.as_ref())
        .any(|source| match kind {
            ResourceKind::ConfigMap => source
                .config_map_key_ref
                .as_ref()
                .is_some_and(|r| r.name == name),
            ResourceKind::Secret => source
                .secret_key_ref
                .as_ref()
                .is_some_and(|r| r.name == name),
        })
}
