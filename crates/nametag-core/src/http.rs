// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Regional API client.
//!
//! One `reqwest::Client` serves every OCI service in a region; each call
//! names the [`ApiService`] it targets and the client routes to the right
//! regional host. Every send goes through the shared [`RetryPolicy`], and
//! list calls follow `opc-next-page` pagination until exhausted.

use crate::auth::Session;
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// The OCI services this tool talks to, one variant per regional endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiService {
    Identity,
    Search,
    Core,
    ObjectStorage,
    FileStorage,
    LoadBalancer,
    NetworkLoadBalancer,
    NetworkFirewall,
    Database,
    Mysql,
    Nosql,
    Opensearch,
    Analytics,
    BigData,
    DataCatalog,
    DataIntegration,
    Functions,
    ContainerInstances,
    Artifacts,
    ServiceMesh,
    VisualBuilder,
}

impl ApiService {
    /// Regional hostname for the service.
    pub fn host(&self, region: &str) -> String {
        match self {
            ApiService::Identity => format!("identity.{region}.oraclecloud.com"),
            ApiService::Search => format!("query.{region}.oraclecloud.com"),
            ApiService::Core | ApiService::LoadBalancer => {
                format!("iaas.{region}.oraclecloud.com")
            }
            ApiService::ObjectStorage => format!("objectstorage.{region}.oraclecloud.com"),
            ApiService::FileStorage => format!("filestorage.{region}.oraclecloud.com"),
            ApiService::NetworkLoadBalancer => {
                format!("network-load-balancer.{region}.oci.oraclecloud.com")
            }
            ApiService::NetworkFirewall => {
                format!("network-firewall.{region}.oci.oraclecloud.com")
            }
            ApiService::Database => format!("database.{region}.oraclecloud.com"),
            ApiService::Mysql => format!("mysql.{region}.ocp.oraclecloud.com"),
            ApiService::Nosql => format!("nosql.{region}.oci.oraclecloud.com"),
            ApiService::Opensearch => format!("opensearch.{region}.oci.oraclecloud.com"),
            ApiService::Analytics => format!("analytics.{region}.ocp.oraclecloud.com"),
            ApiService::BigData => format!("bigdataservice.{region}.oci.oraclecloud.com"),
            ApiService::DataCatalog => format!("datacatalog.{region}.oci.oraclecloud.com"),
            ApiService::DataIntegration => {
                format!("dataintegration.{region}.oci.oraclecloud.com")
            }
            ApiService::Functions => format!("functions.{region}.oci.oraclecloud.com"),
            ApiService::ContainerInstances => {
                format!("compute-containers.{region}.oci.oraclecloud.com")
            }
            ApiService::Artifacts => format!("artifacts.{region}.oci.oraclecloud.com"),
            ApiService::ServiceMesh => format!("servicemesh.{region}.oci.oraclecloud.com"),
            ApiService::VisualBuilder => format!("visualbuilder.{region}.oci.oraclecloud.com"),
        }
    }
}

/// HTTP client bound to one region.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    region: String,
    auth_headers: HeaderMap,
    policy: RetryPolicy,
    /// Routes every service to a fixed base URL instead of the regional
    /// hosts. Used by integration tests against a mock server.
    endpoint_override: Option<String>,
}

impl ApiClient {
    pub fn new(
        session: &Session,
        region: &str,
        policy: RetryPolicy,
        endpoint_override: Option<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            client,
            region: region.to_string(),
            auth_headers: session.auth_headers(),
            policy,
            endpoint_override,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn url(&self, service: ApiService, path: &str) -> String {
        match &self.endpoint_override {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => format!("https://{}{}", service.host(&self.region), path),
        }
    }

    /// GET returning the decoded JSON body.
    pub async fn get_json(
        &self,
        service: ApiService,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let response = self.send(Method::GET, service, path, query, None).await?;
        decode_json(path, response).await
    }

    /// POST with a JSON body, returning the decoded response body.
    pub async fn post_json(
        &self,
        service: ApiService,
        path: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let response = self
            .send(Method::POST, service, path, &[], Some(body))
            .await?;
        decode_json(path, response).await
    }

    /// POST where the response body is irrelevant (lifecycle actions).
    pub async fn post(&self, service: ApiService, path: &str, body: &Value) -> Result<(), ApiError> {
        self.send(Method::POST, service, path, &[], Some(body))
            .await?;
        Ok(())
    }

    /// PUT with a JSON body, discarding the response body.
    pub async fn put(&self, service: ApiService, path: &str, body: &Value) -> Result<(), ApiError> {
        self.send(Method::PUT, service, path, &[], Some(body))
            .await?;
        Ok(())
    }

    /// Lists every page of a collection, following `opc-next-page`.
    pub async fn list_all(
        &self,
        service: ApiService,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::new();
        let mut page: Option<String> = None;

        loop {
            let mut q: Vec<(&str, &str)> = query.to_vec();
            if let Some(token) = page.as_deref() {
                q.push(("page", token));
            }
            let response = self.send(Method::GET, service, path, &q, None).await?;
            let next = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string());
            let body = decode_json(path, response).await?;
            items.extend(collection_items(body));

            match next {
                Some(token) => page = Some(token),
                None => return Ok(items),
            }
        }
    }

    /// Sends one request through the retry policy.
    async fn send(
        &self,
        method: Method,
        service: ApiService,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = self.url(service, path);
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers.clone());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            debug!(method = %method, url = %url, attempt = attempts, "api request");

            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let (code, message) = service_error_parts(response).await;
                    if self.policy.should_retry(status, &code)
                        && self.policy.has_budget(attempts, started)
                    {
                        let wait = self.policy.backoff(attempts);
                        warn!(
                            status,
                            code = %code,
                            wait_ms = wait.as_millis() as u64,
                            "retrying after service error"
                        );
                        sleep(wait).await;
                        continue;
                    }
                    return Err(ApiError::Service {
                        status,
                        code,
                        message,
                    });
                }
                Err(err) => {
                    if (err.is_connect() || err.is_timeout())
                        && self.policy.has_budget(attempts, started)
                    {
                        let wait = self.policy.backoff(attempts);
                        warn!(
                            error = %err,
                            wait_ms = wait.as_millis() as u64,
                            "retrying after transport error"
                        );
                        sleep(wait).await;
                        continue;
                    }
                    return Err(ApiError::Transport(err));
                }
            }
        }
    }
}

async fn decode_json(path: &str, response: Response) -> Result<Value, ApiError> {
    let bytes = response.bytes().await.map_err(ApiError::Transport)?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

/// Extracts `code` and `message` from an OCI error body, tolerating bodies
/// that are not JSON at all.
async fn service_error_parts(response: Response) -> (String, String) {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&text) {
        Ok(body) => {
            let code = body
                .get("code")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let message = body
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or(&text)
                .to_string();
            (code, message)
        }
        Err(_) => (String::new(), text),
    }
}

/// Unwraps the two collection envelopes OCI list APIs use: a bare array
/// (core/identity style) or an `items` wrapper (newer services).
pub fn collection_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hosts_are_regional() {
        assert_eq!(
            ApiService::Core.host("eu-paris-1"),
            "iaas.eu-paris-1.oraclecloud.com"
        );
        assert_eq!(
            ApiService::LoadBalancer.host("eu-paris-1"),
            "iaas.eu-paris-1.oraclecloud.com"
        );
        assert_eq!(
            ApiService::Mysql.host("us-ashburn-1"),
            "mysql.us-ashburn-1.ocp.oraclecloud.com"
        );
        assert_eq!(
            ApiService::Identity.host("eu-frankfurt-1"),
            "identity.eu-frankfurt-1.oraclecloud.com"
        );
    }

    #[test]
    fn collection_items_handles_bare_arrays() {
        let items = collection_items(json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn collection_items_handles_items_envelope() {
        let items = collection_items(json!({"items": [{"id": "a"}]}));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn collection_items_tolerates_other_shapes() {
        assert!(collection_items(json!({"data": 3})).is_empty());
        assert!(collection_items(Value::Null).is_empty());
    }
}
