// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::controller::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_SECS, DEFAULT_MAX_RETRIES, DEFAULT_WORKERS,
};
use crate::filter::{IgnoredNamespaces, ScopeFilter};
use crate::fingerprint::ResourceKind;
use crate::reconcilers::{ControllerSettings, ExponentialBackoff};
use crate::upgrade::UpgradeOptions;
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Only watch this namespace when set
    pub namespace: Option<String>,
    pub ignored_namespaces: IgnoredNamespaces,
    /// Kinds that get no controller
    pub resources_to_ignore: Vec<ResourceKind>,
    pub auto_reload_all: bool,
    pub reload_on_create: bool,
    pub workers: usize,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ignored = get("IGNORED_NAMESPACES").unwrap_or_default();
        let ignored_namespaces = IgnoredNamespaces::parse(&ignored)
            .with_context(|| format!("invalid IGNORED_NAMESPACES pattern in {ignored:?}"))?;

        let resources_to_ignore = get("RESOURCES_TO_IGNORE")
            .map(|v| parse_resources(&v))
            .transpose()?
            .unwrap_or_default();

        let workers: usize = parse_or(get("CONTROLLER_WORKERS"), "CONTROLLER_WORKERS", DEFAULT_WORKERS)?;
        if workers == 0 {
            bail!("CONTROLLER_WORKERS must be at least 1");
        }

        Ok(Config {
            namespace: get("KUBERNETES_NAMESPACE"),
            ignored_namespaces,
            resources_to_ignore,
            auto_reload_all: parse_or(get("AUTO_RELOAD_ALL"), "AUTO_RELOAD_ALL", false)?,
            reload_on_create: parse_or(get("RELOAD_ON_CREATE"), "RELOAD_ON_CREATE", false)?,
            workers,
            max_retries: parse_or(get("MAX_RETRIES"), "MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_delay: Duration::from_millis(parse_or(
                get("RETRY_BASE_DELAY_MS"),
                "RETRY_BASE_DELAY_MS",
                DEFAULT_BASE_DELAY_MS,
            )?),
            retry_max_delay: Duration::from_secs(parse_or(
                get("RETRY_MAX_DELAY_SECS"),
                "RETRY_MAX_DELAY_SECS",
                DEFAULT_MAX_DELAY_SECS,
            )?),
        })
    }

    /// Whether a controller should run for `kind`
    pub fn watches(&self, kind: ResourceKind) -> bool {
        !self.resources_to_ignore.contains(&kind)
    }

    pub fn scope_filter(&self) -> ScopeFilter {
        ScopeFilter::new(self.namespace.clone(), self.ignored_namespaces.clone())
    }

    pub fn upgrade_options(&self) -> UpgradeOptions {
        UpgradeOptions {
            auto_reload_all: self.auto_reload_all,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            workers: self.workers,
            max_retries: self.max_retries,
            backoff: ExponentialBackoff {
                base: self.retry_base_delay,
                max: self.retry_max_delay,
            },
            reload_on_create: self.reload_on_create,
        }
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .parse()
            .with_context(|| format!("invalid value {v:?} for {key}")),
        None => Ok(default),
    }
}

fn parse_resources(value: &str) -> Result<Vec<ResourceKind>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_ascii_lowercase().as_str() {
            "configmaps" => Ok(ResourceKind::ConfigMap),
            "secrets" => Ok(ResourceKind::Secret),
            _ => bail!("invalid RESOURCES_TO_IGNORE entry {s:?}, expected configMaps or secrets"),
        })
        .collect()
}
