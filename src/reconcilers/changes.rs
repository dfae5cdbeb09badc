// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns reflected watch events into reconcile triggers.
//!
//! Only data changes count. The detector remembers the last fingerprint of
//! every in-scope object and lets an object through when its fingerprint
//! moved. The initial list only seeds the fingerprints. Objects changed by a
//! relist are released at `InitDone`, after the reflector swapped in the
//! relisted state.

use crate::filter::ScopeFilter;
use crate::reconcilers::watched::WatchedResource;
use kube::ResourceExt;
use kube_runtime::watcher::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ChangeDetector<K: WatchedResource> {
    filter: Arc<ScopeFilter>,
    reload_on_create: bool,
    synced: bool,
    fingerprints: HashMap<String, String>,
    /// Fingerprints seen by the relist in progress
    relisted: Option<HashMap<String, String>>,
    pending: Vec<K>,
}

impl<K: WatchedResource> ChangeDetector<K> {
    pub fn new(filter: Arc<ScopeFilter>, reload_on_create: bool) -> Self {
        Self {
            filter,
            reload_on_create,
            synced: false,
            fingerprints: HashMap::new(),
            relisted: None,
            pending: Vec::new(),
        }
    }

    pub fn has_synced(&self) -> bool {
        self.synced
    }

    /// Objects to reconcile because of `event`.
    pub fn triggers(&mut self, event: Event<K>) -> Vec<K> {
        match event {
            Event::Init => {
                self.relisted = Some(HashMap::new());
                self.pending.clear();
                Vec::new()
            }
            Event::InitApply(obj) => {
                let Some(key) = self.scoped_key(&obj) else {
                    return Vec::new();
                };
                let fingerprint = obj.fingerprint();
                if self.synced && self.is_change(&key, &fingerprint) {
                    self.pending.push(obj);
                }
                self.relisted
                    .get_or_insert_with(HashMap::new)
                    .insert(key, fingerprint);
                Vec::new()
            }
            Event::InitDone => {
                if let Some(listed) = self.relisted.take() {
                    self.fingerprints = listed;
                }
                if !self.synced {
                    info!("{} cache synced with {} objects", K::KIND, self.fingerprints.len());
                    self.synced = true;
                }
                std::mem::take(&mut self.pending)
            }
            Event::Apply(obj) => {
                let Some(key) = self.scoped_key(&obj) else {
                    return Vec::new();
                };
                let fingerprint = obj.fingerprint();
                let changed = self.is_change(&key, &fingerprint);
                self.fingerprints.insert(key, fingerprint);
                if changed {
                    vec![obj]
                } else {
                    Vec::new()
                }
            }
            Event::Delete(obj) => {
                if let Some(key) = self.scoped_key(&obj) {
                    debug!("{} {} deleted, nothing to reload", K::KIND, key);
                    self.fingerprints.remove(&key);
                }
                Vec::new()
            }
        }
    }

    fn scoped_key(&self, obj: &K) -> Option<String> {
        let namespace = obj.namespace().unwrap_or_default();
        let key = format!("{}/{}", namespace, obj.name_any());
        if self.filter.in_scope(&namespace) {
            Some(key)
        } else {
            debug!("Ignoring {} {}: namespace out of scope", K::KIND, key);
            None
        }
    }

    fn is_change(&self, key: &str, fingerprint: &str) -> bool {
        match self.fingerprints.get(key) {
            Some(old) if old == fingerprint => {
                debug!("{} {} updated without data change", K::KIND, key);
                false
            }
            Some(_) => true,
            None => self.reload_on_create,
        }
    }
}
