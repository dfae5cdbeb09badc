// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource kinds whose changes trigger rollouts.

use crate::fingerprint::{sha_from_configmap, sha_from_secret, ChangeRecord, ResourceKind};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::NamespaceResourceScope;
use kube::Resource;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// A ConfigMap or Secret as seen by a controller.
pub trait WatchedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + Debug
    + Send
    + Sync
    + 'static
{
    const KIND: ResourceKind;

    fn fingerprint(&self) -> String;

    fn change_record(&self) -> ChangeRecord;
}

impl WatchedResource for ConfigMap {
    const KIND: ResourceKind = ResourceKind::ConfigMap;

    fn fingerprint(&self) -> String {
        sha_from_configmap(self)
    }

    fn change_record(&self) -> ChangeRecord {
        ChangeRecord::from_configmap(self)
    }
}

impl WatchedResource for Secret {
    const KIND: ResourceKind = ResourceKind::Secret;

    fn fingerprint(&self) -> String {
        sha_from_secret(self)
    }

    fn change_record(&self) -> ChangeRecord {
        ChangeRecord::from_secret(self)
    }
}
