// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource types not shipped with k8s-openapi.

pub mod deployment_config;

pub use deployment_config::DeploymentConfig;
