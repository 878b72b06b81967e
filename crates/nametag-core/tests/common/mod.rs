// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Shared scaffolding for driver tests: a mock tenancy served by one
//! httptest server that every regional endpoint is routed to.

use httptest::matchers::request;
use httptest::responders::json_encoded;
use httptest::{Expectation, Server};
use nametag_core::{AuthMode, RunConfig};
use serde_json::json;
use std::io::Write;
use std::time::Duration;

pub const TENANCY: &str = "ocid1.tenancy.oc1..testtenancy";
pub const REGION: &str = "eu-paris-1";
pub const AD: &str = "pQGP:EU-PARIS-1-AD-1";

pub struct TestTenancy {
    pub server: Server,
    pub config: RunConfig,
    _auth_file: tempfile::NamedTempFile,
}

/// Builds a run configuration pointed at a fresh mock server, with the
/// compartment tree, region subscription, and tag schema endpoints already
/// mounted.
pub fn test_tenancy() -> TestTenancy {
    let server = Server::run();

    let mut auth_file = tempfile::NamedTempFile::new().expect("auth config file");
    write!(
        auth_file,
        "[DEFAULT]\ntenancy = {TENANCY}\nregion = {REGION}\n"
    )
    .expect("write auth config");

    let mut config = RunConfig::new("CostCenter", "display_name");
    config.auth = AuthMode::ConfigFile {
        path: auth_file.path().to_string_lossy().into_owned(),
        profile: "DEFAULT".to_string(),
    };
    config.endpoint_override = Some(server.url_str("/"));
    config.poll_interval = Duration::from_millis(10);
    config.poll_timeout = Duration::from_secs(2);

    mount_scope(&server);
    TestTenancy {
        server,
        config,
        _auth_file: auth_file,
    }
}

/// Tenancy metadata, a single-compartment tree, one subscribed region, one
/// availability domain, and an ACTIVE free-form tag schema.
fn mount_scope(server: &Server) {
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            "/20160918/tenancies/ocid1.tenancy.oc1..testtenancy",
        ))
        .times(0..)
        .respond_with(json_encoded(json!({"id": TENANCY, "name": "acme"}))),
    );
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            "/20160918/compartments/ocid1.tenancy.oc1..testtenancy",
        ))
        .times(0..)
        .respond_with(json_encoded(json!({"id": TENANCY, "name": "acme"}))),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/20160918/compartments"))
            .times(0..)
            .respond_with(json_encoded(json!([]))),
    );
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            "/20160918/tenancies/ocid1.tenancy.oc1..testtenancy/regionSubscriptions",
        ))
        .times(0..)
        .respond_with(json_encoded(json!([{"regionName": REGION, "status": "READY"}]))),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/20180409/resources"))
            .times(0..)
            .respond_with(json_encoded(json!({
                "items": [{
                    "displayName": "CostCenter",
                    "identifier": "ocid1.tagnamespace.oc1..ns",
                }]
            }))),
    );
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            "/20160918/tagNamespaces/ocid1.tagnamespace.oc1..ns",
        ))
        .times(0..)
        .respond_with(json_encoded(json!({
            "id": "ocid1.tagnamespace.oc1..ns",
            "name": "CostCenter",
            "isRetired": false,
            "lifecycleState": "ACTIVE",
        }))),
    );
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            "/20160918/tagNamespaces/ocid1.tagnamespace.oc1..ns/tags",
        ))
        .times(0..)
        .respond_with(json_encoded(json!([{
            "name": "display_name",
            "isRetired": false,
            "lifecycleState": "ACTIVE",
        }]))),
    );
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            "/20160918/tagNamespaces/ocid1.tagnamespace.oc1..ns/tags/display_name",
        ))
        .times(0..)
        .respond_with(json_encoded(json!({
            "name": "display_name",
            "isRetired": false,
            "lifecycleState": "ACTIVE",
            "validator": null,
        }))),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/20160918/availabilityDomains"))
            .times(0..)
            .respond_with(json_encoded(json!([{"name": AD}]))),
    );
}

/// Mounts an endpoint returning an empty collection, for the kinds a test
/// does not exercise.
pub fn empty_list(server: &Server, path: &'static str) {
    server.expect(
        Expectation::matching(request::method_path("GET", path))
            .times(0..)
            .respond_with(json_encoded(json!([]))),
    );
}
