// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes cluster capability checks.

pub mod discovery;

pub use discovery::is_openshift;
