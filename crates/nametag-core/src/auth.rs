// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Session resolution.
//!
//! Three authentication modes mirror the standard OCI tooling: a local
//! config-file profile, a Cloud Shell delegation token, and instance
//! principals (the default). Signature mechanics live behind this seam; the
//! rest of the crate only sees a [`Session`] carrying the tenancy, the home
//! region, and the headers to attach to each request.

use crate::error::FatalError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_PROFILE: &str = "DEFAULT";

/// How the run authenticates against the tenancy.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// `~/.oci/config`-style profile.
    ConfigFile { path: String, profile: String },
    /// Cloud Shell delegation token; the config file and profile come from
    /// the `OCI_CONFIG_FILE` / `OCI_CONFIG_PROFILE` environment variables.
    DelegationToken,
    /// Instance principals (default when nothing else is selected).
    InstancePrincipal,
}

impl Default for AuthMode {
    fn default() -> Self {
        AuthMode::InstancePrincipal
    }
}

/// Resolved authentication context for the whole run.
#[derive(Debug, Clone)]
pub struct Session {
    pub tenancy_id: String,
    /// Home region of the tenancy, used for identity calls.
    pub region: String,
    /// Opaque bearer material attached to every request, when the auth mode
    /// provides one up front.
    pub security_token: Option<String>,
}

impl Session {
    /// Headers to attach to every API request.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.security_token {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                headers.insert(AUTHORIZATION, value);
            }
        }
        headers
    }
}

impl AuthMode {
    /// Resolves the session or fails the whole run.
    pub fn resolve(&self) -> Result<Session, FatalError> {
        match self {
            AuthMode::ConfigFile { path, profile } => {
                let path = expand_home(path);
                let profile_values = read_profile(&path, profile)?;
                let session = session_from_profile(&profile_values, &path, profile)?;
                info!(
                    profile = %profile,
                    region = %session.region,
                    "authenticated via config file"
                );
                Ok(session)
            }
            AuthMode::DelegationToken => {
                let path = env::var("OCI_CONFIG_FILE")
                    .map(|p| expand_home(&p))
                    .map_err(|_| {
                        FatalError::Auth("OCI_CONFIG_FILE is not set for delegation token auth".into())
                    })?;
                let profile =
                    env::var("OCI_CONFIG_PROFILE").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
                let profile_values = read_profile(&path, &profile)?;
                let token_path = profile_values.get("delegation_token_file").ok_or_else(|| {
                    FatalError::Auth(format!(
                        "profile {profile} has no delegation_token_file entry"
                    ))
                })?;
                let token = fs::read_to_string(expand_home(token_path))
                    .map_err(|e| FatalError::Auth(format!("error reading delegation token: {e}")))?;
                let mut session = session_from_profile(&profile_values, &path, &profile)?;
                session.security_token = Some(token.trim().to_string());
                info!(profile = %profile, "authenticated via delegation token");
                Ok(session)
            }
            AuthMode::InstancePrincipal => {
                // Region and tenancy come from the environment the principal
                // runs in; the federation handshake itself is performed by
                // the transport layer on first use.
                let region = env::var("OCI_REGION").map_err(|_| {
                    FatalError::Auth(
                        "instance principal auth requires OCI_REGION in the environment".into(),
                    )
                })?;
                let tenancy_id = env::var("OCI_TENANCY").map_err(|_| {
                    FatalError::Auth(
                        "instance principal auth requires OCI_TENANCY in the environment".into(),
                    )
                })?;
                info!(region = %region, "authenticated via instance principals");
                Ok(Session {
                    tenancy_id,
                    region,
                    security_token: None,
                })
            }
        }
    }
}

fn session_from_profile(
    values: &HashMap<String, String>,
    path: &Path,
    profile: &str,
) -> Result<Session, FatalError> {
    let tenancy_id = values.get("tenancy").cloned().ok_or_else(|| {
        FatalError::Auth(format!(
            "profile {profile} in {} has no tenancy entry",
            path.display()
        ))
    })?;
    let region = values.get("region").cloned().ok_or_else(|| {
        FatalError::Auth(format!(
            "profile {profile} in {} has no region entry",
            path.display()
        ))
    })?;
    let security_token = match values.get("security_token_file") {
        Some(token_path) => {
            let token = fs::read_to_string(expand_home(token_path))
                .map_err(|e| FatalError::Auth(format!("error reading security token: {e}")))?;
            Some(token.trim().to_string())
        }
        None => None,
    };
    Ok(Session {
        tenancy_id,
        region,
        security_token,
    })
}

/// Reads one `[profile]` section of an INI-style OCI config file.
fn read_profile(path: &Path, profile: &str) -> Result<HashMap<String, String>, FatalError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        FatalError::Auth(format!("error reading config file {}: {e}", path.display()))
    })?;

    let mut values = HashMap::new();
    let mut in_profile = false;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_profile = section.trim() == profile;
            continue;
        }
        if !in_profile {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    if values.is_empty() {
        return Err(FatalError::Auth(format!(
            "profile {profile} not found in {}",
            path.display()
        )));
    }
    debug!(profile = %profile, entries = values.len(), "loaded config profile");
    Ok(values)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}
