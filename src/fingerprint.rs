// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Content fingerprints for ConfigMaps and Secrets.
//!
//! The fingerprint only covers the data entries of a resource. Labels,
//! annotations and any other metadata never contribute to it, so metadata
//! churn on a ConfigMap or Secret does not look like a change.

use crate::constants::{annotations, env};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::ResourceExt;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of watched resource a change originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ConfigMap,
    Secret,
}

impl ResourceKind {
    /// Postfix of the injected environment variable
    pub fn env_var_postfix(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => env::CONFIGMAP_POSTFIX,
            ResourceKind::Secret => env::SECRET_POSTFIX,
        }
    }

    /// Workload annotation listing resources of this kind to reload on
    pub fn reload_annotation(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => annotations::CONFIGMAP_RELOAD,
            ResourceKind::Secret => annotations::SECRET_RELOAD,
        }
    }

    /// Workload annotation enabling automatic mode for this kind only
    pub fn auto_annotation(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => annotations::CONFIGMAP_AUTO,
            ResourceKind::Secret => annotations::SECRET_AUTO,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ConfigMap => "configmap",
            ResourceKind::Secret => "secret",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rolling upgrade needs to know about one observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub namespace: String,
    pub resource_name: String,
    pub kind: ResourceKind,
    /// Opt-in annotation key matching `kind`
    pub annotation: &'static str,
    pub sha_value: String,
    pub resource_annotations: BTreeMap<String, String>,
}

impl ChangeRecord {
    pub fn from_configmap(configmap: &ConfigMap) -> Self {
        Self::new(configmap, ResourceKind::ConfigMap, sha_from_configmap(configmap))
    }

    pub fn from_secret(secret: &Secret) -> Self {
        Self::new(secret, ResourceKind::Secret, sha_from_secret(secret))
    }

    fn new<K: ResourceExt>(resource: &K, kind: ResourceKind, sha_value: String) -> Self {
        Self {
            namespace: resource.namespace().unwrap_or_default(),
            resource_name: resource.name_any(),
            kind,
            annotation: kind.reload_annotation(),
            sha_value,
            resource_annotations: resource.annotations().clone(),
        }
    }

    /// True if the resource opted out of triggering rollouts
    pub fn is_ignored(&self) -> bool {
        annotation_is_true(&self.resource_annotations, annotations::IGNORE)
    }

    /// True if the resource takes part in search/match mode
    pub fn is_match_enabled(&self) -> bool {
        annotation_is_true(&self.resource_annotations, annotations::MATCH)
    }
}

pub(crate) fn annotation_is_true(annotations: &BTreeMap<String, String>, key: &str) -> bool {
    annotations
        .get(key)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Fingerprint of a ConfigMap's `data` and `binaryData`
pub fn sha_from_configmap(configmap: &ConfigMap) -> String {
    let mut entries: Vec<(&str, Vec<u8>)> = Vec::new();

    if let Some(data) = &configmap.data {
        entries.extend(data.iter().map(|(k, v)| (k.as_str(), v.as_bytes().to_vec())));
    }
    if let Some(binary) = &configmap.binary_data {
        entries.extend(
            binary
                .iter()
                .map(|(k, v)| (k.as_str(), STANDARD.encode(&v.0).into_bytes())),
        );
    }

    hash_entries(entries)
}

/// Fingerprint of a Secret's `data`
pub fn sha_from_secret(secret: &Secret) -> String {
    let entries = secret
        .data
        .iter()
        .flatten()
        .map(|(k, v)| (k.as_str(), v.0.clone()))
        .collect();

    hash_entries(entries)
}

/// Hash entries sorted by key. Every key and value is prefixed with its
/// big-endian `u64` length, so no two distinct maps feed the same bytes.
fn hash_entries(mut entries: Vec<(&str, Vec<u8>)>) -> String {
    entries.sort();

    let mut hasher = Sha256::new();
    for (key, value) in &entries {
        hasher.update((key.len() as u64).to_be_bytes());
        hasher.update(key.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    hex::encode(hasher.finalize())
}
