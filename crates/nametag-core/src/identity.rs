// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Scope resolution: compartment subtree, subscribed regions, and
//! availability domains.

use crate::error::{ApiError, FatalError};
use crate::http::{ApiClient, ApiService};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, info};

const IDENTITY_PREFIX: &str = "/20160918";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compartment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

impl Compartment {
    fn is_active(&self) -> bool {
        // The tenancy root carries no lifecycle state.
        self.lifecycle_state
            .as_deref()
            .map_or(true, |state| state == "ACTIVE")
    }
}

/// Fetches a single compartment; an invalid starting OCID is fatal.
pub async fn get_compartment(
    client: &ApiClient,
    compartment_id: &str,
) -> Result<Compartment, FatalError> {
    let body = client
        .get_json(
            ApiService::Identity,
            &format!("{IDENTITY_PREFIX}/compartments/{compartment_id}"),
            &[],
        )
        .await
        .map_err(|source| FatalError::InvalidCompartment {
            compartment_id: compartment_id.to_string(),
            source,
        })?;
    decode(body)
}

/// Breadth-first walk of the compartment subtree rooted at
/// `root_compartment_id`, keeping only ACTIVE compartments (the root
/// included).
pub async fn compartment_tree(
    client: &ApiClient,
    root_compartment_id: &str,
) -> Result<Vec<Compartment>, FatalError> {
    let root = get_compartment(client, root_compartment_id).await?;

    let mut all = vec![root];
    let mut frontier = VecDeque::from([all[0].id.clone()]);

    while let Some(parent_id) = frontier.pop_front() {
        let children = client
            .list_all(
                ApiService::Identity,
                &format!("{IDENTITY_PREFIX}/compartments"),
                &[("compartmentId", parent_id.as_str())],
            )
            .await
            .map_err(FatalError::Scope)?;
        for child in children {
            let compartment: Compartment = decode(child)?;
            frontier.push_back(compartment.id.clone());
            all.push(compartment);
        }
    }

    let active: Vec<Compartment> = all.into_iter().filter(Compartment::is_active).collect();
    info!(compartments = active.len(), "compartment tree resolved");
    Ok(active)
}

/// Subscribed region names, or the single filtered one.
///
/// A filter naming a region the tenancy is not subscribed to aborts the run
/// before any listing or tagging occurs.
pub async fn subscribed_regions(
    client: &ApiClient,
    tenancy_id: &str,
    filter: Option<&str>,
) -> Result<Vec<String>, FatalError> {
    let items = client
        .list_all(
            ApiService::Identity,
            &format!("{IDENTITY_PREFIX}/tenancies/{tenancy_id}/regionSubscriptions"),
            &[],
        )
        .await
        .map_err(FatalError::Scope)?;

    let subscribed: Vec<String> = items
        .iter()
        .filter_map(|item| item.get("regionName").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    debug!(regions = subscribed.len(), "region subscriptions listed");

    match filter {
        Some(wanted) => {
            if subscribed.iter().any(|name| name == wanted) {
                Ok(vec![wanted.to_string()])
            } else {
                Err(FatalError::UnsubscribedRegion(wanted.to_string()))
            }
        }
        None => Ok(subscribed),
    }
}

/// Availability domain names for the client's region.
pub async fn availability_domains(
    client: &ApiClient,
    tenancy_id: &str,
) -> Result<Vec<String>, ApiError> {
    let items = client
        .list_all(
            ApiService::Identity,
            &format!("{IDENTITY_PREFIX}/availabilityDomains"),
            &[("compartmentId", tenancy_id)],
        )
        .await?;
    Ok(items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// Tenancy display name, for the startup banner.
pub async fn tenancy_name(client: &ApiClient, tenancy_id: &str) -> Result<String, ApiError> {
    let body = client
        .get_json(
            ApiService::Identity,
            &format!("{IDENTITY_PREFIX}/tenancies/{tenancy_id}"),
            &[],
        )
        .await?;
    Ok(body
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

fn decode(value: Value) -> Result<Compartment, FatalError> {
    serde_json::from_value(value).map_err(|source| {
        FatalError::Scope(ApiError::Decode {
            path: format!("{IDENTITY_PREFIX}/compartments"),
            source,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_without_lifecycle_state_is_active() {
        let root: Compartment = serde_json::from_value(json!({
            "id": "ocid1.tenancy.oc1..root",
            "name": "acme",
        }))
        .expect("decode");
        assert!(root.is_active());
    }

    #[test]
    fn deleted_compartment_is_filtered() {
        let gone: Compartment = serde_json::from_value(json!({
            "id": "ocid1.compartment.oc1..gone",
            "name": "old",
            "lifecycleState": "DELETED",
        }))
        .expect("decode");
        assert!(!gone.is_active());
    }
}
