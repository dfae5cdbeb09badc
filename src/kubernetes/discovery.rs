// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API discovery used to enable platform specific workload kinds.

use crate::constants::openshift::{APPS_GROUP, DEPLOYMENT_CONFIG_KIND};
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use tracing::{debug, info};

/// Whether the cluster serves `apps.openshift.io` DeploymentConfigs.
pub async fn is_openshift(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[APPS_GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() != APPS_GROUP {
            continue;
        }
        for (ar, _) in group.recommended_resources() {
            if ar.kind == DEPLOYMENT_CONFIG_KIND {
                info!("Detected OpenShift, {} {} is available", ar.api_version, ar.kind);
                return Ok(true);
            }
        }
    }

    debug!("{} not served by this cluster", APPS_GROUP);
    Ok(false)
}
