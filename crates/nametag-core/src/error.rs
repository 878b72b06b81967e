// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

/// Errors that abort the whole run before any tag is written.
///
/// Everything here is a precondition failure: authentication, scope
/// resolution, or tag schema validation. Per-resource failures never use
/// this type; they are contained by the driver and recorded in the run
/// report instead.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("invalid starting compartment {compartment_id}: {source}")]
    InvalidCompartment {
        compartment_id: String,
        source: ApiError,
    },

    #[error("region {0} is not subscribed in this tenancy")]
    UnsubscribedRegion(String),

    #[error("tag namespace not found: {0}")]
    TagNamespaceNotFound(String),

    #[error("invalid tag namespace state for {name}: retired={retired}, state={state}")]
    TagNamespaceInactive {
        name: String,
        retired: bool,
        state: String,
    },

    #[error("tag key not found: {key} in namespace {namespace}")]
    TagKeyNotFound { namespace: String, key: String },

    #[error("invalid tag key state for {name}: retired={retired}, state={state}")]
    TagKeyInactive {
        name: String,
        retired: bool,
        state: String,
    },

    #[error("invalid tag value type for {name}: {validator}, must be a free-form value")]
    TagKeyNotFreeForm { name: String, validator: String },

    #[error("scope resolution failed: {0}")]
    Scope(#[from] ApiError),
}

/// Errors raised by individual API calls.
///
/// The driver treats these as local to one resource: logged, recorded as a
/// failed outcome, and the batch continues. Only the precondition phase
/// promotes them to [`FatalError`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service error {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("timed out after {waited_secs}s waiting for {resource_id} to reach {target}")]
    PollTimeout {
        resource_id: String,
        target: String,
        waited_secs: u64,
    },
}

impl ApiError {
    /// Status code of the underlying service error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}
