// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! The run driver.
//!
//! Resolves the session, the compartment subtree, the region list, and the
//! tag schema once, then walks region x compartment x group and brings the
//! name tag of every eligible resource in line with its display name. A
//! failure on one resource is recorded and the walk continues; only the
//! precondition phase can abort the run.

mod lifecycle;

use crate::config::RunConfig;
use crate::error::{ApiError, FatalError};
use crate::http::{ApiClient, ApiService};
use crate::identity::{self, Compartment};
use crate::kinds::{Group, ResourceKind};
use crate::report::{Outcome, OutcomeKind, RunReport};
use crate::resource::{Resource, VolumeAttachment};
use crate::tags::{DefinedTags, TagSelector};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const DB_HOMES_PATH: &str = "/20160918/dbHomes";
const BOOT_ATTACHMENTS_PATH: &str = "/20160918/bootVolumeAttachments";
const VOLUME_ATTACHMENTS_PATH: &str = "/20160918/volumeAttachments";

pub struct Tagger {
    config: RunConfig,
    selector: TagSelector,
}

/// Everything fixed for one compartment visit.
struct Scope<'a> {
    client: &'a ApiClient,
    region: &'a str,
    ads: &'a [String],
    compartment: &'a Compartment,
    /// Object Storage namespace, fetched once per region when the storage
    /// group is selected.
    os_namespace: Option<&'a str>,
}

impl Tagger {
    pub fn new(config: RunConfig) -> Self {
        let selector = TagSelector::new(config.namespace.clone(), config.key.clone());
        Self { config, selector }
    }

    pub async fn run(&self) -> Result<RunReport, FatalError> {
        self.config.validate()?;
        let session = self.config.auth.resolve()?;
        let home = ApiClient::new(
            &session,
            &session.region,
            self.config.retry.clone(),
            self.config.endpoint_override.clone(),
        )
        .map_err(FatalError::Scope)?;

        let tenancy = identity::tenancy_name(&home, &session.tenancy_id)
            .await
            .map_err(FatalError::Scope)?;
        info!(
            tenancy = %tenancy,
            namespace = %self.config.namespace,
            key = %self.config.key,
            "starting tag run"
        );

        let root = self
            .config
            .compartment_id
            .clone()
            .unwrap_or_else(|| session.tenancy_id.clone());
        let compartments = identity::compartment_tree(&home, &root).await?;
        let regions =
            identity::subscribed_regions(&home, &session.tenancy_id, self.config.region.as_deref())
                .await?;
        self.selector.validate(&home).await?;

        let mut report = RunReport::new();
        for region in &regions {
            let client = ApiClient::new(
                &session,
                region,
                self.config.retry.clone(),
                self.config.endpoint_override.clone(),
            )
            .map_err(FatalError::Scope)?;
            let ads = identity::availability_domains(&client, &session.tenancy_id)
                .await
                .map_err(FatalError::Scope)?;
            let os_namespace = if self.config.groups.contains(&Group::Storage) {
                Some(self.object_storage_namespace(&client).await?)
            } else {
                None
            };
            info!(region = %region, ads = ads.len(), "processing region");

            for compartment in &compartments {
                let scope = Scope {
                    client: &client,
                    region,
                    ads: &ads,
                    compartment,
                    os_namespace: os_namespace.as_deref(),
                };
                for group in &self.config.groups {
                    match group {
                        Group::Compute => self.compute(&scope, &mut report).await,
                        Group::Storage => self.storage(&scope, &mut report).await,
                        Group::Network => self.network(&scope, &mut report).await,
                        Group::Database => self.database(&scope, &mut report).await,
                        Group::Analytics => self.analytics(&scope, &mut report).await,
                        Group::Development => self.development(&scope, &mut report).await,
                    }
                }
            }
        }

        info!("{}", report.render());
        Ok(report)
    }

    /// Instances, then their boot volumes, block volumes, and the backups
    /// of both. Everything under an instance is tagged with the instance's
    /// display name so storage costs roll up to the server.
    async fn compute(&self, scope: &Scope<'_>, report: &mut RunReport) {
        let instances = self.list(scope, ResourceKind::Instance, &[]).await;
        for instance in &instances {
            let name = instance.label().to_string();
            self.apply(scope, ResourceKind::Instance, instance, &name, report)
                .await;

            if let Some(ad) = instance.availability_domain.as_deref() {
                let attachments = self
                    .attachments(
                        scope,
                        BOOT_ATTACHMENTS_PATH,
                        &[
                            ("availabilityDomain", ad),
                            ("compartmentId", &scope.compartment.id),
                            ("instanceId", &instance.id),
                        ],
                    )
                    .await;
                for attachment in attachments {
                    let Some(volume_id) = attachment.boot_volume_id else {
                        continue;
                    };
                    self.tag_fetched(scope, ResourceKind::BootVolume, &volume_id, &name, report)
                        .await;
                    self.tag_listed_as(
                        scope,
                        ResourceKind::BootVolumeBackup,
                        &[("bootVolumeId", &volume_id)],
                        &name,
                        report,
                    )
                    .await;
                }
            }

            let attachments = self
                .attachments(
                    scope,
                    VOLUME_ATTACHMENTS_PATH,
                    &[
                        ("compartmentId", &scope.compartment.id),
                        ("instanceId", &instance.id),
                    ],
                )
                .await;
            for attachment in attachments {
                let Some(volume_id) = attachment.volume_id else {
                    continue;
                };
                self.tag_fetched(scope, ResourceKind::BlockVolume, &volume_id, &name, report)
                    .await;
                self.tag_listed_as(
                    scope,
                    ResourceKind::VolumeBackup,
                    &[("volumeId", &volume_id)],
                    &name,
                    report,
                )
                .await;
            }
        }
    }

    async fn storage(&self, scope: &Scope<'_>, report: &mut RunReport) {
        if let Some(namespace) = scope.os_namespace {
            self.buckets(scope, namespace, report).await;
        }

        for ad in scope.ads {
            for fs in self
                .list(
                    scope,
                    ResourceKind::FileSystem,
                    &[("availabilityDomain", ad)],
                )
                .await
            {
                let name = fs.label().to_string();
                self.apply(scope, ResourceKind::FileSystem, &fs, &name, report)
                    .await;
            }
        }
    }

    async fn network(&self, scope: &Scope<'_>, report: &mut RunReport) {
        for kind in [
            ResourceKind::LoadBalancer,
            ResourceKind::NetworkLoadBalancer,
            ResourceKind::NetworkFirewall,
        ] {
            self.tag_listed(scope, kind, &[], report).await;
        }
    }

    async fn database(&self, scope: &Scope<'_>, report: &mut RunReport) {
        // Databases inside a DB system take the system's name; DB homes
        // themselves are traversal only and never tagged.
        for system in self.list(scope, ResourceKind::DbSystem, &[]).await {
            let system_name = system.label().to_string();
            self.apply(scope, ResourceKind::DbSystem, &system, &system_name, report)
                .await;
            for home in self.db_homes(scope, &system.id).await {
                self.tag_listed_as(
                    scope,
                    ResourceKind::Database,
                    &[("dbHomeId", &home.id)],
                    &system_name,
                    report,
                )
                .await;
            }
        }

        self.tag_listed(scope, ResourceKind::AutonomousDatabase, &[], report)
            .await;

        // VM clusters take the name of their Exadata infrastructure.
        for infra in self.list(scope, ResourceKind::ExadataInfrastructure, &[]).await {
            let infra_name = infra.label().to_string();
            self.apply(
                scope,
                ResourceKind::ExadataInfrastructure,
                &infra,
                &infra_name,
                report,
            )
            .await;
            for kind in [
                ResourceKind::AutonomousVmCluster,
                ResourceKind::CloudVmCluster,
            ] {
                for cluster in self
                    .list(scope, kind, &[("cloudExadataInfrastructureId", &infra.id)])
                    .await
                {
                    self.apply(scope, kind, &cluster, &infra_name, report).await;
                }
            }
        }

        for kind in [
            ResourceKind::MysqlDbSystem,
            ResourceKind::NosqlTable,
            ResourceKind::OpensearchCluster,
        ] {
            self.tag_listed(scope, kind, &[], report).await;
        }
    }

    async fn analytics(&self, scope: &Scope<'_>, report: &mut RunReport) {
        for kind in [
            ResourceKind::AnalyticsInstance,
            ResourceKind::BigDataInstance,
            ResourceKind::DataCatalog,
            ResourceKind::DataIntegrationWorkspace,
        ] {
            self.tag_listed(scope, kind, &[], report).await;
        }
    }

    async fn development(&self, scope: &Scope<'_>, report: &mut RunReport) {
        // Functions take the name of their application.
        for app in self.list(scope, ResourceKind::FunctionApp, &[]).await {
            let app_name = app.label().to_string();
            self.apply(scope, ResourceKind::FunctionApp, &app, &app_name, report)
                .await;
            for function in self
                .list(scope, ResourceKind::Function, &[("applicationId", &app.id)])
                .await
            {
                self.apply(scope, ResourceKind::Function, &function, &app_name, report)
                    .await;
            }
        }

        for kind in [
            ResourceKind::ContainerInstance,
            ResourceKind::ArtifactRepository,
            ResourceKind::ServiceMesh,
            ResourceKind::VisualBuilderInstance,
        ] {
            self.tag_listed(scope, kind, &[], report).await;
        }
    }

    /// Lists a kind in the compartment and tags each resource with its own
    /// display name. Kinds whose list summaries omit `definedTags` are
    /// re-fetched in full first, so the merge never starts from an
    /// assumed-empty tag map.
    async fn tag_listed(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        extra: &[(&str, &str)],
        report: &mut RunReport,
    ) {
        for listed in self.list(scope, kind, extra).await {
            let resource = if kind.summary_omits_tags() {
                match self.fetch(scope, kind, &listed.id).await {
                    Some(full) => full,
                    None => continue,
                }
            } else {
                listed
            };
            let name = resource.label().to_string();
            self.apply(scope, kind, &resource, &name, report).await;
        }
    }

    /// Lists a kind and tags every resource with a fixed value taken from
    /// its parent.
    async fn tag_listed_as(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        extra: &[(&str, &str)],
        value: &str,
        report: &mut RunReport,
    ) {
        for resource in self.list(scope, kind, extra).await {
            self.apply(scope, kind, &resource, value, report).await;
        }
    }

    /// Fetches one resource by id and tags it with its parent's name.
    async fn tag_fetched(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        id: &str,
        value: &str,
        report: &mut RunReport,
    ) {
        if let Some(resource) = self.fetch(scope, kind, id).await {
            self.apply(scope, kind, &resource, value, report).await;
        }
    }

    /// Fetches one resource in full, dropping it when its state disallows
    /// tagging. Fetch and decode failures are logged and yield nothing.
    async fn fetch(&self, scope: &Scope<'_>, kind: ResourceKind, id: &str) -> Option<Resource> {
        let path = kind.item_path(id);
        let resource = match scope.client.get_json(kind.service(), &path, &[]).await {
            Ok(body) => match Resource::decode(body, &path) {
                Ok(resource) => resource,
                Err(err) => {
                    warn!(kind = kind.label(), id, error = %err, "skipping undecodable resource");
                    return None;
                }
            },
            Err(err) => {
                warn!(kind = kind.label(), id, error = %err, "fetch failed; skipping");
                return None;
            }
        };
        kind.state_allows(resource.state()).then_some(resource)
    }

    /// Lists every resource of a kind in the compartment, dropping entries
    /// outside the kind's taggable lifecycle states. A listing failure is
    /// logged and yields nothing; the rest of the run continues.
    async fn list(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        extra: &[(&str, &str)],
    ) -> Vec<Resource> {
        let mut query: Vec<(&str, &str)> = vec![("compartmentId", &scope.compartment.id)];
        query.extend_from_slice(extra);
        let items = match scope
            .client
            .list_all(kind.service(), kind.list_path(), &query)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    kind = kind.label(),
                    compartment = %scope.compartment.name,
                    error = %err,
                    "listing failed; skipping kind in this compartment"
                );
                return Vec::new();
            }
        };
        items
            .into_iter()
            .filter_map(|item| match Resource::decode(item, kind.list_path()) {
                Ok(resource) => Some(resource),
                Err(err) => {
                    warn!(kind = kind.label(), error = %err, "skipping undecodable list entry");
                    None
                }
            })
            .filter(|resource| kind.state_allows(resource.state()))
            .collect()
    }

    async fn attachments(
        &self,
        scope: &Scope<'_>,
        path: &str,
        query: &[(&str, &str)],
    ) -> Vec<VolumeAttachment> {
        let items = match scope
            .client
            .list_all(ApiService::Core, path, query)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(path, error = %err, "attachment listing failed; skipping");
                return Vec::new();
            }
        };
        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<VolumeAttachment>(item).ok())
            .filter(VolumeAttachment::is_attached)
            .collect()
    }

    /// DB homes of one DB system; traversal only, never tagged.
    async fn db_homes(&self, scope: &Scope<'_>, system_id: &str) -> Vec<Resource> {
        let query = [
            ("compartmentId", scope.compartment.id.as_str()),
            ("dbSystemId", system_id),
        ];
        match scope
            .client
            .list_all(ApiService::Database, DB_HOMES_PATH, &query)
            .await
        {
            Ok(items) => items
                .into_iter()
                .filter_map(|item| Resource::decode(item, DB_HOMES_PATH).ok())
                .filter(|home| home.state() == "AVAILABLE")
                .collect(),
            Err(err) => {
                warn!(compartment = %scope.compartment.name, error = %err, "db home listing failed");
                Vec::new()
            }
        }
    }

    async fn buckets(&self, scope: &Scope<'_>, namespace: &str, report: &mut RunReport) {
        let list_path = format!("/n/{namespace}/b");
        let query = [("compartmentId", scope.compartment.id.as_str())];
        let summaries = match scope
            .client
            .list_all(ApiService::ObjectStorage, &list_path, &query)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                warn!(compartment = %scope.compartment.name, error = %err, "bucket listing failed");
                return;
            }
        };
        for summary in summaries {
            let Some(name) = summary.get("name").and_then(Value::as_str) else {
                continue;
            };
            // List summaries omit tags; the full bucket is fetched.
            let path = format!("/n/{namespace}/b/{name}");
            let bucket = match scope
                .client
                .get_json(ApiService::ObjectStorage, &path, &[])
                .await
                .and_then(|body| Resource::decode(body, &path))
            {
                Ok(bucket) => bucket,
                Err(err) => {
                    warn!(bucket = name, error = %err, "bucket fetch failed; skipping");
                    continue;
                }
            };
            let value = bucket.label().to_string();
            self.apply(scope, ResourceKind::Bucket, &bucket, &value, report)
                .await;
        }
    }

    /// Compares the resource's tags with the desired map and updates when
    /// they differ. Exactly one outcome is recorded either way.
    async fn apply(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        resource: &Resource,
        value: &str,
        report: &mut RunReport,
    ) {
        let desired = self.selector.apply(&resource.defined_tags, value);
        let result = if desired == resource.defined_tags {
            OutcomeKind::Skipped
        } else {
            match self.write_tags(scope, kind, resource, &desired).await {
                Ok(()) => OutcomeKind::Tagged,
                Err(err) => {
                    warn!(
                        kind = kind.label(),
                        id = %resource.id,
                        error = %err,
                        "tag update failed"
                    );
                    OutcomeKind::Failed(err.to_string())
                }
            }
        };
        let outcome = Outcome {
            region: scope.region.to_string(),
            availability_domain: resource.availability_domain.clone(),
            compartment: scope.compartment.name.clone(),
            kind,
            name: value.to_string(),
            resource_id: resource.id.clone(),
            result,
        };
        info!("{}", outcome.line());
        report.record(outcome);
    }

    async fn write_tags(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        resource: &Resource,
        desired: &DefinedTags,
    ) -> Result<(), ApiError> {
        if kind.needs_start_stop() && resource.state() != "ACTIVE" {
            return self.start_tag_stop(scope, kind, resource, desired).await;
        }
        if kind.clears_tags_first() {
            // The update endpoint needs a wipe before it accepts the real
            // map; a failed wipe is not worth failing the resource over.
            if let Err(err) = self
                .put_tags(scope, kind, resource, &DefinedTags::new())
                .await
            {
                debug!(kind = kind.label(), id = %resource.id, error = %err, "tag clear failed");
            }
        }
        self.put_tags(scope, kind, resource, desired).await
    }

    /// A stopped resource of a kind that rejects offline tag updates is
    /// started, tagged, and returned to its stopped state.
    async fn start_tag_stop(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        resource: &Resource,
        desired: &DefinedTags,
    ) -> Result<(), ApiError> {
        let interval = self.config.poll_interval;
        let timeout = self.config.poll_timeout;

        lifecycle::start(scope.client, kind, &resource.id).await?;
        lifecycle::wait_for_state(
            scope.client,
            kind,
            &resource.id,
            &["ACTIVE"],
            interval,
            timeout,
        )
        .await?;
        self.put_tags(scope, kind, resource, desired).await?;
        lifecycle::stop(scope.client, kind, &resource.id).await?;
        // Observing the shutdown begin is enough; it finishes on its own.
        lifecycle::wait_for_state(
            scope.client,
            kind,
            &resource.id,
            &["UPDATING", "INACTIVE"],
            interval,
            timeout,
        )
        .await
    }

    async fn put_tags(
        &self,
        scope: &Scope<'_>,
        kind: ResourceKind,
        resource: &Resource,
        tags: &DefinedTags,
    ) -> Result<(), ApiError> {
        // Bucket updates are POSTs addressed by namespace and name.
        if kind == ResourceKind::Bucket {
            let namespace = scope.os_namespace.unwrap_or_default();
            let path = format!("/n/{namespace}/b/{}", resource.label());
            return scope
                .client
                .post(ApiService::ObjectStorage, &path, &json!({"definedTags": tags}))
                .await;
        }

        let mut body = json!({ "definedTags": tags });
        // The workspace update call requires the display name as well.
        if kind == ResourceKind::DataIntegrationWorkspace {
            body["displayName"] = json!(resource.label());
        }
        scope
            .client
            .put(kind.service(), &kind.item_path(&resource.id), &body)
            .await
    }

    /// The tenancy's Object Storage namespace, a bare JSON string.
    async fn object_storage_namespace(&self, client: &ApiClient) -> Result<String, FatalError> {
        let body = client
            .get_json(ApiService::ObjectStorage, "/n/", &[])
            .await
            .map_err(FatalError::Scope)?;
        serde_json::from_value(body).map_err(|source| {
            FatalError::Scope(ApiError::Decode {
                path: "/n/".to_string(),
                source,
            })
        })
    }
}
