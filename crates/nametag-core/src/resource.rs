// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Wire shapes shared across resource kinds.

use crate::error::ApiError;
use crate::tags::DefinedTags;
use serde::Deserialize;
use serde_json::Value;

/// One resource as returned by a list or get call.
///
/// Services disagree on the name field (`displayName`, `name`, `dbName`),
/// so all three are captured and [`Resource::label`] picks the first
/// present. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub defined_tags: DefinedTags,
    #[serde(default)]
    pub availability_domain: Option<String>,
    #[serde(default)]
    pub compartment_id: Option<String>,
}

impl Resource {
    /// Display name of the resource, whatever the service calls it.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.db_name.as_deref())
            .unwrap_or("")
    }

    pub fn state(&self) -> &str {
        self.lifecycle_state.as_deref().unwrap_or("")
    }

    pub fn decode(value: Value, path: &str) -> Result<Self, ApiError> {
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// Boot-volume or block-volume attachment record on an instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAttachment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub boot_volume_id: Option<String>,
    #[serde(default)]
    pub volume_id: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

impl VolumeAttachment {
    pub fn is_attached(&self) -> bool {
        self.lifecycle_state.as_deref().map_or(true, |s| s == "ATTACHED")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_prefers_display_name() {
        let res: Resource = serde_json::from_value(json!({
            "id": "ocid1.autonomousdatabase.oc1..x",
            "displayName": "orders-adb",
            "dbName": "ORDERSDB",
        }))
        .expect("decode");
        assert_eq!(res.label(), "orders-adb");
    }

    #[test]
    fn label_falls_back_to_name_then_db_name() {
        let bucket: Resource = serde_json::from_value(json!({"name": "logs-bucket"})).expect("decode");
        assert_eq!(bucket.label(), "logs-bucket");

        let db: Resource = serde_json::from_value(json!({"dbName": "CDB01"})).expect("decode");
        assert_eq!(db.label(), "CDB01");
    }

    #[test]
    fn defined_tags_decode_nested() {
        let res: Resource = serde_json::from_value(json!({
            "id": "ocid1.instance.oc1..x",
            "displayName": "web-01",
            "lifecycleState": "RUNNING",
            "definedTags": {"Operations": {"owner": "team-a"}},
        }))
        .expect("decode");
        assert_eq!(
            res.defined_tags["Operations"]["owner"],
            Value::String("team-a".to_string())
        );
        assert_eq!(res.state(), "RUNNING");
    }

    #[test]
    fn attachment_detached_is_excluded() {
        let att: VolumeAttachment = serde_json::from_value(json!({
            "id": "ocid1.volumeattachment.oc1..x",
            "volumeId": "ocid1.volume.oc1..y",
            "lifecycleState": "DETACHED",
        }))
        .expect("decode");
        assert!(!att.is_attached());
    }
}
