// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Start/tag/stop handling for kinds that refuse tag updates while
//! stopped.

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::kinds::ResourceKind;
use crate::resource::Resource;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

pub async fn start(client: &ApiClient, kind: ResourceKind, id: &str) -> Result<(), ApiError> {
    info!(kind = kind.label(), id, "starting resource for tag update");
    client
        .post(kind.service(), &kind.action_path(id, "start"), &json!({}))
        .await
}

pub async fn stop(client: &ApiClient, kind: ResourceKind, id: &str) -> Result<(), ApiError> {
    // MySQL requires a shutdown type; other services take an empty body.
    let body = match kind {
        ResourceKind::MysqlDbSystem => json!({"shutdownType": "SLOW"}),
        _ => json!({}),
    };
    info!(kind = kind.label(), id, "stopping resource after tag update");
    client
        .post(kind.service(), &kind.action_path(id, "stop"), &body)
        .await
}

/// Polls the resource until it reaches any of `targets`, re-reading it
/// every `interval`. Stop transitions accept both the transitional and the
/// final state, since a fast shutdown can skip past the former between
/// polls.
pub async fn wait_for_state(
    client: &ApiClient,
    kind: ResourceKind,
    id: &str,
    targets: &[&str],
    interval: Duration,
    timeout: Duration,
) -> Result<(), ApiError> {
    let started = Instant::now();
    loop {
        let body = client
            .get_json(kind.service(), &kind.item_path(id), &[])
            .await?;
        let resource = Resource::decode(body, &kind.item_path(id))?;
        if targets.contains(&resource.state()) {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(ApiError::PollTimeout {
                resource_id: id.to_string(),
                target: targets.join("|"),
                waited_secs: started.elapsed().as_secs(),
            });
        }
        debug!(
            kind = kind.label(),
            id,
            state = resource.state(),
            ?targets,
            "waiting for lifecycle state"
        );
        sleep(interval).await;
    }
}
