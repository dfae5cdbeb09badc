// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReloaderError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Workload has no pod template: {0}")]
    MissingPodTemplate(String),

    #[error("Failed to list {kind} in namespace {namespace}: {source}")]
    ListFailed {
        kind: &'static str,
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("Rolling upgrade failed for {failed} of {total} workloads")]
    UpgradeFailed { failed: usize, total: usize },
}

impl ReloaderError {
    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReloaderError::KubeError(e) => is_transient(e),
            // retried regardless of status code
            ReloaderError::ListFailed { .. } | ReloaderError::UpgradeFailed { .. } => true,
            ReloaderError::MissingPodTemplate(_) => false,
        }
    }
}

fn is_transient(error: &kube::Error) -> bool {
    match error {
        kube::Error::Api(resp) => resp.code == 409 || resp.code == 429 || resp.code >= 500,
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        _ => false,
    }
}

pub type Result<T> = std::result::Result<T, ReloaderError>;
