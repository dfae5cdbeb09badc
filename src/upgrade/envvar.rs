// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The environment variable that forces a pod template change.

use crate::constants::env;
use crate::fingerprint::ChangeRecord;
use k8s_openapi::api::core::v1::{EnvVar, PodTemplateSpec};

/// Name of the trigger variable, e.g. `STAKATER_APP_CONFIG_CONFIGMAP`.
pub fn env_var_name(record: &ChangeRecord) -> String {
    format!(
        "{}{}_{}",
        env::PREFIX,
        convert_to_env_var_name(&record.resource_name),
        record.kind.env_var_postfix()
    )
}

fn convert_to_env_var_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Sets the trigger variable on every container of the template.
///
/// Returns whether anything changed. A container already carrying the
/// fingerprint is left untouched.
pub fn upsert_env_var(template: &mut PodTemplateSpec, name: &str, value: &str) -> bool {
    let Some(spec) = template.spec.as_mut() else {
        return false;
    };

    let mut changed = false;
    for container in spec.containers.iter_mut() {
        let env = container.env.get_or_insert_with(Vec::new);
        match env.iter_mut().find(|e| e.name == name) {
            Some(existing)
                if existing.value.as_deref() == Some(value) && existing.value_from.is_none() => {}
            Some(existing) => {
                existing.value = Some(value.to_string());
                existing.value_from = None;
                changed = true;
            }
            None => {
                env.push(EnvVar {
                    name: name.to_string(),
                    value: Some(value.to_string()),
                    value_from: None,
                });
                changed = true;
            }
        }
    }
    changed
}
