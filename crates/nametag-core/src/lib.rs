// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Core library for the display-name tagger.
//!
//! Walks every compartment of a tenancy across its subscribed regions and
//! keeps one defined tag on each supported resource in sync with the
//! resource's display name, so cost and usage reports can be grouped by
//! resource name.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod kinds;
pub mod report;
pub mod resource;
pub mod retry;
pub mod tagger;
pub mod tags;

pub use auth::{AuthMode, Session};
pub use config::RunConfig;
pub use error::{ApiError, FatalError};
pub use kinds::{Group, ResourceKind};
pub use report::{Outcome, OutcomeKind, RunReport};
pub use retry::RetryPolicy;
pub use tagger::Tagger;
pub use tags::{DefinedTags, TagSelector};
