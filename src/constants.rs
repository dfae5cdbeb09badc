// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys understood by the reloader
pub mod annotations {
    /// Comma-separated ConfigMap names a workload reloads on
    pub const CONFIGMAP_RELOAD: &str = "configmap.reloader.stakater.com/reload";
    /// Comma-separated Secret names a workload reloads on
    pub const SECRET_RELOAD: &str = "secret.reloader.stakater.com/reload";
    /// When "true", reload on any ConfigMap or Secret the pod template references
    pub const AUTO: &str = "reloader.stakater.com/auto";
    /// Automatic mode restricted to ConfigMaps
    pub const CONFIGMAP_AUTO: &str = "configmap.reloader.stakater.com/auto";
    /// Automatic mode restricted to Secrets
    pub const SECRET_AUTO: &str = "secret.reloader.stakater.com/auto";
    /// Workload side of search/match mode
    pub const SEARCH: &str = "reloader.stakater.com/search";
    /// Resource side of search/match mode
    pub const MATCH: &str = "reloader.stakater.com/match";
    /// Set on a ConfigMap or Secret to never trigger rollouts from it
    pub const IGNORE: &str = "reloader.stakater.com/ignore";
}

/// Environment variable naming for the rollout trigger
pub mod env {
    pub const PREFIX: &str = "STAKATER_";
    pub const CONFIGMAP_POSTFIX: &str = "CONFIGMAP";
    pub const SECRET_POSTFIX: &str = "SECRET";
}

/// OpenShift API group checked at startup
pub mod openshift {
    pub const APPS_GROUP: &str = "apps.openshift.io";
    pub const DEPLOYMENT_CONFIG_KIND: &str = "DeploymentConfig";
}

/// Controller concurrency and retry defaults
pub mod controller {
    pub const DEFAULT_WORKERS: usize = 1;
    pub const DEFAULT_MAX_RETRIES: u32 = 5;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 5;
    pub const DEFAULT_MAX_DELAY_SECS: u64 = 1000;
}
