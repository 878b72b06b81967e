// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use anyhow::Context;
use clap::Parser;
use nametag_core::{AuthMode, Group, RunConfig, Tagger};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Tags every supported resource in a tenancy with its own display name,
/// so cost and usage reports can be grouped by resource name.
#[derive(Debug, Parser)]
#[command(name = "oci-nametag", version)]
struct Args {
    /// Authenticate with an OCI config file instead of instance
    /// principals; `--config-file` alone uses ~/.oci/config
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "~/.oci/config")]
    config_file: Option<String>,

    /// Profile inside the config file
    #[arg(long, value_name = "NAME", default_value = "DEFAULT")]
    profile: String,

    /// Authenticate with instance principals
    #[arg(long, conflicts_with_all = ["config_file", "delegation_token"])]
    instance_principal: bool,

    /// Authenticate with a Cloud Shell delegation token
    #[arg(long, conflicts_with = "config_file")]
    delegation_token: bool,

    /// Compartment OCID to start from; the whole tenancy when omitted
    #[arg(long, value_name = "OCID")]
    compartment: Option<String>,

    /// Restrict the run to one subscribed region
    #[arg(long, value_name = "REGION")]
    region: Option<String>,

    /// Tag namespace holding the name tag
    #[arg(long, value_name = "NAMESPACE")]
    namespace: String,

    /// Tag key whose value mirrors the display name
    #[arg(long, value_name = "KEY")]
    key: String,

    /// Process compute resources (instances and their volumes)
    #[arg(long)]
    compute: bool,

    /// Process storage resources (backups, buckets, file systems)
    #[arg(long)]
    storage: bool,

    /// Process load balancers and network firewalls
    #[arg(long)]
    network: bool,

    /// Process database resources
    #[arg(long)]
    database: bool,

    /// Process analytics and data platform resources
    #[arg(long)]
    analytics: bool,

    /// Process developer services
    #[arg(long)]
    development: bool,

    /// Process every resource group (the default when no group is named)
    #[arg(long)]
    all: bool,

    /// Log level
    #[arg(long, env = "NAMETAG_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn auth_mode(&self) -> AuthMode {
        if self.delegation_token {
            AuthMode::DelegationToken
        } else if self.instance_principal {
            AuthMode::InstancePrincipal
        } else if let Some(path) = &self.config_file {
            AuthMode::ConfigFile {
                path: path.clone(),
                profile: self.profile.clone(),
            }
        } else {
            AuthMode::InstancePrincipal
        }
    }

    fn groups(&self) -> Vec<Group> {
        let selected: Vec<Group> = [
            (self.compute, Group::Compute),
            (self.storage, Group::Storage),
            (self.network, Group::Network),
            (self.database, Group::Database),
            (self.analytics, Group::Analytics),
            (self.development, Group::Development),
        ]
        .into_iter()
        .filter_map(|(flag, group)| flag.then_some(group))
        .collect();

        if self.all || selected.is_empty() {
            Group::ALL.to_vec()
        } else {
            selected
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", args.log_level);
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_new(env_filter).context("could not parse log level")?)
        .with_level(true)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut config = RunConfig::new(args.namespace.clone(), args.key.clone());
    config.auth = args.auth_mode();
    config.compartment_id = args.compartment.clone();
    config.region = args.region.clone();
    config.groups = args.groups();

    let report = Tagger::new(config)
        .run()
        .await
        .context("run aborted before tagging")?;

    if report.failed() > 0 {
        info!(failed = report.failed(), "run finished with failures");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_flags_narrow_the_selection() {
        let args = Args::parse_from([
            "oci-nametag",
            "--namespace",
            "CostCenter",
            "--key",
            "display_name",
            "--compute",
            "--database",
        ]);
        assert_eq!(args.groups(), vec![Group::Compute, Group::Database]);
    }

    #[test]
    fn no_group_flag_selects_everything() {
        let args = Args::parse_from([
            "oci-nametag",
            "--namespace",
            "CostCenter",
            "--key",
            "display_name",
        ]);
        assert_eq!(args.groups().len(), Group::ALL.len());
    }

    #[test]
    fn instance_principal_is_the_default_auth_mode() {
        let args = Args::parse_from([
            "oci-nametag",
            "--namespace",
            "CostCenter",
            "--key",
            "display_name",
        ]);
        assert!(matches!(args.auth_mode(), AuthMode::InstancePrincipal));
    }

    #[test]
    fn bare_config_file_flag_uses_the_default_path() {
        let args = Args::parse_from([
            "oci-nametag",
            "--namespace",
            "CostCenter",
            "--key",
            "display_name",
            "--config-file",
        ]);
        assert!(matches!(
            args.auth_mode(),
            AuthMode::ConfigFile { path, profile } if path == "~/.oci/config" && profile == "DEFAULT"
        ));
    }

    #[test]
    fn delegation_token_flag_selects_token_auth() {
        let args = Args::parse_from([
            "oci-nametag",
            "--namespace",
            "CostCenter",
            "--key",
            "display_name",
            "--delegation-token",
        ]);
        assert!(matches!(args.auth_mode(), AuthMode::DelegationToken));
    }

    #[test]
    fn config_file_and_instance_principal_conflict() {
        let result = Args::try_parse_from([
            "oci-nametag",
            "--namespace",
            "CostCenter",
            "--key",
            "display_name",
            "--config-file",
            "/tmp/config",
            "--instance-principal",
        ]);
        assert!(result.is_err());
    }
}
