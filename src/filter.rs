// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace scoping for watch events.

use glob::{Pattern, PatternError};

/// Ordered list of namespace patterns that never trigger rollouts.
#[derive(Debug, Clone, Default)]
pub struct IgnoredNamespaces {
    patterns: Vec<Pattern>,
}

impl IgnoredNamespaces {
    /// Parse a comma-separated list of glob patterns. Empty items are skipped.
    pub fn parse(value: &str) -> Result<Self, PatternError> {
        let patterns = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Pattern::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    pub fn matches(&self, namespace: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(namespace))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

/// Decides whether an event in a namespace is handled by this instance.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    watch_namespace: Option<String>,
    ignored: IgnoredNamespaces,
}

impl ScopeFilter {
    pub fn new(watch_namespace: Option<String>, ignored: IgnoredNamespaces) -> Self {
        Self {
            watch_namespace: watch_namespace.filter(|ns| !ns.is_empty()),
            ignored,
        }
    }

    pub fn in_scope(&self, namespace: &str) -> bool {
        if let Some(watched) = &self.watch_namespace {
            if watched != namespace {
                return false;
            }
        }
        !self.ignored.matches(namespace)
    }

    pub fn watch_namespace(&self) -> Option<&str> {
        self.watch_namespace.as_deref()
    }
}
