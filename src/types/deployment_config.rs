// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::core::v1::PodTemplateSpec;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenShift `apps.openshift.io/v1` DeploymentConfig.
///
/// Only the pod template is modelled. Every other spec field is kept as raw
/// JSON so a read-modify-replace cycle does not drop it.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug)]
#[kube(
    group = "apps.openshift.io",
    version = "v1",
    kind = "DeploymentConfig",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}
