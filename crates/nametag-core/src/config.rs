// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Run configuration.

use crate::auth::AuthMode;
use crate::error::FatalError;
use crate::kinds::Group;
use crate::retry::RetryPolicy;
use std::time::Duration;

/// Everything one run needs, resolved before any API call is made.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub auth: AuthMode,
    /// Root of the compartment subtree to walk; the tenancy root when None.
    pub compartment_id: Option<String>,
    /// Restrict the run to one subscribed region.
    pub region: Option<String>,
    /// Tag namespace to write into.
    pub namespace: String,
    /// Tag key whose value mirrors each resource's display name.
    pub key: String,
    /// Resource groups to process, in a fixed order.
    pub groups: Vec<Group>,
    pub retry: RetryPolicy,
    /// How often lifecycle polling re-reads a resource.
    pub poll_interval: Duration,
    /// How long lifecycle polling waits before giving up on a resource.
    pub poll_timeout: Duration,
    /// Routes every service call to one base URL; test use only.
    pub endpoint_override: Option<String>,
}

impl RunConfig {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            auth: AuthMode::default(),
            compartment_id: None,
            region: None,
            namespace: namespace.into(),
            key: key.into(),
            groups: Group::ALL.to_vec(),
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(600),
            endpoint_override: None,
        }
    }

    pub fn validate(&self) -> Result<(), FatalError> {
        if self.namespace.trim().is_empty() {
            return Err(FatalError::Config("tag namespace must not be empty".into()));
        }
        if self.key.trim().is_empty() {
            return Err(FatalError::Config("tag key must not be empty".into()));
        }
        if self.groups.is_empty() {
            return Err(FatalError::Config(
                "at least one resource group must be selected".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_groups() {
        let config = RunConfig::new("CostCenter", "display_name");
        assert_eq!(config.groups.len(), Group::ALL.len());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut config = RunConfig::new("CostCenter", " ");
        assert!(config.validate().is_err());
        config.key = "display_name".to_string();
        config.groups.clear();
        assert!(config.validate().is_err());
    }
}
