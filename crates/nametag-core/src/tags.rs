// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Defined-tag map operations and the startup tag schema check.

use crate::error::FatalError;
use crate::http::{ApiClient, ApiService};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

/// Nested defined-tags map: namespace → key → value.
pub type DefinedTags = BTreeMap<String, BTreeMap<String, Value>>;

/// Returns a copy of `current` with `namespace.key` set to `value`,
/// creating the namespace sub-map when absent. Every other entry is
/// preserved untouched.
pub fn with_entry(current: &DefinedTags, namespace: &str, key: &str, value: &str) -> DefinedTags {
    let mut next = current.clone();
    next.entry(namespace.to_string())
        .or_default()
        .insert(key.to_string(), Value::String(value.to_string()));
    next
}

/// The tag this run writes, validated once against tenancy metadata.
#[derive(Debug, Clone)]
pub struct TagSelector {
    pub namespace: String,
    pub key: String,
}

impl TagSelector {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }

    /// Desired tag map for one resource.
    pub fn apply(&self, current: &DefinedTags, value: &str) -> DefinedTags {
        with_entry(current, &self.namespace, &self.key, value)
    }

    /// Validates the namespace and key against tenancy-level tag metadata.
    ///
    /// The namespace is located through a tenancy-wide structured search,
    /// then both the namespace and the key must be ACTIVE and non-retired,
    /// and the key must carry no value-list validator (free-form only). Any
    /// miss aborts the run; this is a precondition check, not a retryable
    /// operation.
    pub async fn validate(&self, client: &ApiClient) -> Result<(), FatalError> {
        let search = json!({
            "type": "Structured",
            "query": "query tagnamespace resources",
            "matchingContextType": "NONE",
        });
        let found = client
            .post_json(ApiService::Search, "/20180409/resources", &search)
            .await?;
        let namespace_id = crate::http::collection_items(found)
            .into_iter()
            .find(|item| {
                item.get("displayName").and_then(Value::as_str) == Some(self.namespace.as_str())
            })
            .and_then(|item| {
                item.get("identifier")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .ok_or_else(|| FatalError::TagNamespaceNotFound(self.namespace.clone()))?;

        let namespace = client
            .get_json(
                ApiService::Identity,
                &format!("/20160918/tagNamespaces/{namespace_id}"),
                &[],
            )
            .await?;
        ensure_active(&namespace, &self.namespace, true)?;
        info!(namespace = %self.namespace, "tag namespace found");

        let keys = client
            .list_all(
                ApiService::Identity,
                &format!("/20160918/tagNamespaces/{namespace_id}/tags"),
                &[],
            )
            .await?;
        let summary = keys
            .into_iter()
            .find(|item| item.get("name").and_then(Value::as_str) == Some(self.key.as_str()))
            .ok_or_else(|| FatalError::TagKeyNotFound {
                namespace: self.namespace.clone(),
                key: self.key.clone(),
            })?;
        ensure_active(&summary, &self.key, false)?;

        let tag = client
            .get_json(
                ApiService::Identity,
                &format!("/20160918/tagNamespaces/{namespace_id}/tags/{}", self.key),
                &[],
            )
            .await?;
        match tag.get("validator") {
            None | Some(Value::Null) => {
                info!(key = %self.key, "tag key found");
                Ok(())
            }
            Some(validator) => Err(FatalError::TagKeyNotFreeForm {
                name: self.key.clone(),
                validator: validator
                    .get("validatorType")
                    .and_then(Value::as_str)
                    .unwrap_or("ENUM")
                    .to_string(),
            }),
        }
    }
}

fn ensure_active(record: &Value, name: &str, is_namespace: bool) -> Result<(), FatalError> {
    let retired = record
        .get("isRetired")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let state = record
        .get("lifecycleState")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();
    if retired || state != "ACTIVE" {
        if is_namespace {
            return Err(FatalError::TagNamespaceInactive {
                name: name.to_string(),
                retired,
                state,
            });
        }
        return Err(FatalError::TagKeyInactive {
            name: name.to_string(),
            retired,
            state,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(pairs: &[(&str, &str, &str)]) -> DefinedTags {
        let mut out = DefinedTags::new();
        for (ns, key, value) in pairs {
            out.entry(ns.to_string())
                .or_default()
                .insert(key.to_string(), Value::String(value.to_string()));
        }
        out
    }

    #[test]
    fn with_entry_adds_to_empty_map() {
        let current = DefinedTags::new();
        let next = with_entry(&current, "CostCenter", "display_name", "web-01");
        assert_eq!(next, tags(&[("CostCenter", "display_name", "web-01")]));
    }

    #[test]
    fn with_entry_preserves_existing_entries() {
        let current = tags(&[
            ("Operations", "owner", "team-a"),
            ("CostCenter", "project", "atlas"),
        ]);
        let next = with_entry(&current, "CostCenter", "display_name", "web-01");

        assert_eq!(
            next["Operations"]["owner"],
            Value::String("team-a".to_string())
        );
        assert_eq!(
            next["CostCenter"]["project"],
            Value::String("atlas".to_string())
        );
        assert_eq!(
            next["CostCenter"]["display_name"],
            Value::String("web-01".to_string())
        );
        // source map untouched
        assert!(!current.contains_key("CostCenter") || !current["CostCenter"].contains_key("display_name"));
    }

    #[test]
    fn with_entry_overwrites_stale_value() {
        let current = tags(&[("CostCenter", "display_name", "old-name")]);
        let next = with_entry(&current, "CostCenter", "display_name", "new-name");
        assert_eq!(
            next["CostCenter"]["display_name"],
            Value::String("new-name".to_string())
        );
    }

    #[test]
    fn correct_entry_is_a_no_op() {
        let current = tags(&[("CostCenter", "display_name", "web-01")]);
        let next = with_entry(&current, "CostCenter", "display_name", "web-01");
        assert_eq!(next, current);
    }

    #[test]
    fn ensure_active_accepts_live_namespace() {
        let record = json!({"isRetired": false, "lifecycleState": "ACTIVE"});
        assert!(ensure_active(&record, "CostCenter", true).is_ok());
    }

    #[test]
    fn ensure_active_rejects_retired_namespace() {
        let record = json!({"isRetired": true, "lifecycleState": "ACTIVE"});
        let err = ensure_active(&record, "CostCenter", true).expect_err("retired");
        assert!(matches!(err, FatalError::TagNamespaceInactive { .. }));
    }

    #[test]
    fn ensure_active_rejects_inactive_key() {
        let record = json!({"isRetired": false, "lifecycleState": "INACTIVE"});
        let err = ensure_active(&record, "display_name", false).expect_err("inactive");
        assert!(matches!(err, FatalError::TagKeyInactive { .. }));
    }
}
