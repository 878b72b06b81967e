// Copyright (c) 2023, 2025 Oracle and/or its affiliates.
// SPDX-License-Identifier: UPL-1.0

//! Catalog of every resource kind the tool tags.
//!
//! Each kind knows its service, its REST paths, the lifecycle states in
//! which it may be tagged, and its update quirks. Adding support for a new
//! resource type means adding a variant here and wiring its listing into
//! the driver; nothing is dispatched on strings.

use crate::http::ApiService;

/// Selectable families of resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Compute,
    Storage,
    Network,
    Database,
    Analytics,
    Development,
}

impl Group {
    pub const ALL: [Group; 6] = [
        Group::Compute,
        Group::Storage,
        Group::Network,
        Group::Database,
        Group::Analytics,
        Group::Development,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Group::Compute => "compute",
            Group::Storage => "storage",
            Group::Network => "network",
            Group::Database => "database",
            Group::Analytics => "analytics",
            Group::Development => "development",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Instance,
    BootVolume,
    BootVolumeBackup,
    BlockVolume,
    VolumeBackup,
    Bucket,
    FileSystem,
    LoadBalancer,
    NetworkLoadBalancer,
    NetworkFirewall,
    DbSystem,
    Database,
    AutonomousDatabase,
    ExadataInfrastructure,
    AutonomousVmCluster,
    CloudVmCluster,
    MysqlDbSystem,
    NosqlTable,
    OpensearchCluster,
    AnalyticsInstance,
    BigDataInstance,
    DataCatalog,
    DataIntegrationWorkspace,
    FunctionApp,
    Function,
    ContainerInstance,
    ArtifactRepository,
    ServiceMesh,
    VisualBuilderInstance,
}

impl ResourceKind {
    pub fn group(&self) -> Group {
        use ResourceKind::*;
        match self {
            Instance | BootVolume | BootVolumeBackup | BlockVolume | VolumeBackup => {
                Group::Compute
            }
            Bucket | FileSystem => Group::Storage,
            LoadBalancer | NetworkLoadBalancer | NetworkFirewall => Group::Network,
            DbSystem | Database | AutonomousDatabase | ExadataInfrastructure
            | AutonomousVmCluster | CloudVmCluster | MysqlDbSystem | NosqlTable
            | OpensearchCluster => Group::Database,
            AnalyticsInstance | BigDataInstance | DataCatalog | DataIntegrationWorkspace => {
                Group::Analytics
            }
            FunctionApp | Function | ContainerInstance | ArtifactRepository | ServiceMesh
            | VisualBuilderInstance => Group::Development,
        }
    }

    /// Short label used in progress lines and the run report.
    pub fn label(&self) -> &'static str {
        use ResourceKind::*;
        match self {
            Instance => "instance",
            BootVolume => "bootvolume",
            BootVolumeBackup => "boot_backup",
            BlockVolume => "volume",
            VolumeBackup => "volume_backup",
            Bucket => "bucket",
            FileSystem => "fss",
            LoadBalancer => "loadbalancer",
            NetworkLoadBalancer => "ntwloadbalancer",
            NetworkFirewall => "networkfw",
            DbSystem => "dbsystem",
            Database => "dbsys_db",
            AutonomousDatabase => "autonomous",
            ExadataInfrastructure => "exa_infra",
            AutonomousVmCluster => "auto_vm_cluster",
            CloudVmCluster => "cloud_vm_cluster",
            MysqlDbSystem => "mysql",
            NosqlTable => "nosql",
            OpensearchCluster => "opensearch",
            AnalyticsInstance => "analytics",
            BigDataInstance => "bigdata",
            DataCatalog => "datacatalog",
            DataIntegrationWorkspace => "dataintegration",
            FunctionApp => "function_app",
            Function => "function",
            ContainerInstance => "container",
            ArtifactRepository => "artifact",
            ServiceMesh => "mesh",
            VisualBuilderInstance => "visual_builder",
        }
    }

    pub fn service(&self) -> ApiService {
        use ResourceKind::*;
        match self {
            Instance | BootVolume | BootVolumeBackup | BlockVolume | VolumeBackup => {
                ApiService::Core
            }
            Bucket => ApiService::ObjectStorage,
            FileSystem => ApiService::FileStorage,
            LoadBalancer => ApiService::LoadBalancer,
            NetworkLoadBalancer => ApiService::NetworkLoadBalancer,
            NetworkFirewall => ApiService::NetworkFirewall,
            DbSystem | Database | AutonomousDatabase | ExadataInfrastructure
            | AutonomousVmCluster | CloudVmCluster => ApiService::Database,
            MysqlDbSystem => ApiService::Mysql,
            NosqlTable => ApiService::Nosql,
            OpensearchCluster => ApiService::Opensearch,
            AnalyticsInstance => ApiService::Analytics,
            BigDataInstance => ApiService::BigData,
            DataCatalog => ApiService::DataCatalog,
            DataIntegrationWorkspace => ApiService::DataIntegration,
            FunctionApp | Function => ApiService::Functions,
            ContainerInstance => ApiService::ContainerInstances,
            ArtifactRepository => ApiService::Artifacts,
            ServiceMesh => ApiService::ServiceMesh,
            VisualBuilderInstance => ApiService::VisualBuilder,
        }
    }

    /// Lifecycle states in which the resource is tagged at all. Anything
    /// else (terminating, creating, failed) is skipped for the run.
    pub fn good_states(&self) -> &'static [&'static str] {
        use ResourceKind::*;
        match self {
            Instance => &["RUNNING", "STOPPED"],
            // Volumes are tagged through their attachments, which carry no
            // lifecycle state worth filtering on beyond ATTACHED.
            BootVolume | BlockVolume => &["AVAILABLE"],
            BootVolumeBackup | VolumeBackup => &["AVAILABLE"],
            Bucket => &[],
            FileSystem | LoadBalancer | NetworkLoadBalancer | NetworkFirewall | NosqlTable
            | OpensearchCluster | BigDataInstance | DataCatalog | FunctionApp | Function
            | ServiceMesh => &["ACTIVE"],
            DbSystem | Database | ExadataInfrastructure | AutonomousVmCluster | CloudVmCluster
            | ArtifactRepository => &["AVAILABLE"],
            AutonomousDatabase => &["AVAILABLE", "STOPPED"],
            MysqlDbSystem | AnalyticsInstance | ContainerInstance | VisualBuilderInstance => {
                &["ACTIVE", "INACTIVE"]
            }
            DataIntegrationWorkspace => &["ACTIVE", "STOPPED"],
        }
    }

    /// True when the state allows tagging; an empty allow-list (buckets)
    /// accepts everything.
    pub fn state_allows(&self, state: &str) -> bool {
        let allowed = self.good_states();
        allowed.is_empty() || allowed.contains(&state)
    }

    /// Kinds whose update call rejects a payload that still carries the
    /// old tag value: the tag is cleared with one update and set with a
    /// second one.
    pub fn clears_tags_first(&self) -> bool {
        matches!(
            self,
            ResourceKind::BootVolume | ResourceKind::BlockVolume | ResourceKind::NosqlTable
        )
    }

    /// Kinds that only accept tag updates while running, so a stopped one
    /// is started, tagged, and stopped again.
    pub fn needs_start_stop(&self) -> bool {
        matches!(
            self,
            ResourceKind::MysqlDbSystem | ResourceKind::VisualBuilderInstance
        )
    }

    /// Kinds whose list summaries omit `definedTags`. The full resource is
    /// fetched before the merge is computed, otherwise the full-replace
    /// update would wipe every tag the resource already carries.
    pub fn summary_omits_tags(&self) -> bool {
        matches!(
            self,
            ResourceKind::AnalyticsInstance
                | ResourceKind::MysqlDbSystem
                | ResourceKind::VisualBuilderInstance
        )
    }

    /// List path for kinds listed straight out of a compartment.
    ///
    /// Child kinds (databases under a DB home, functions under an
    /// application, VM clusters under an Exadata infrastructure) and
    /// kinds reached through attachments or a namespace are listed by the
    /// driver with the parent in the query; their collection path still
    /// lives here.
    pub fn list_path(&self) -> &'static str {
        use ResourceKind::*;
        match self {
            Instance => "/20160918/instances",
            BootVolume => "/20160918/bootVolumes",
            BootVolumeBackup => "/20160918/bootVolumeBackups",
            BlockVolume => "/20160918/volumes",
            VolumeBackup => "/20160918/volumeBackups",
            Bucket => "/b",
            FileSystem => "/20171215/fileSystems",
            LoadBalancer => "/20170115/loadBalancers",
            NetworkLoadBalancer => "/20200501/networkLoadBalancers",
            NetworkFirewall => "/20230501/networkFirewalls",
            DbSystem => "/20160918/dbSystems",
            Database => "/20160918/databases",
            AutonomousDatabase => "/20160918/autonomousDatabases",
            ExadataInfrastructure => "/20160918/cloudExadataInfrastructures",
            AutonomousVmCluster => "/20160918/cloudAutonomousVmClusters",
            CloudVmCluster => "/20160918/cloudVmClusters",
            MysqlDbSystem => "/20190415/dbSystems",
            NosqlTable => "/20190828/tables",
            OpensearchCluster => "/20180828/opensearchClusters",
            AnalyticsInstance => "/20190331/analyticsInstances",
            BigDataInstance => "/20190531/bdsInstances",
            DataCatalog => "/20190325/catalogs",
            DataIntegrationWorkspace => "/20200430/workspaces",
            FunctionApp => "/20181201/applications",
            Function => "/20181201/functions",
            ContainerInstance => "/20210415/containerInstances",
            ArtifactRepository => "/20160918/repositories",
            ServiceMesh => "/20220615/meshes",
            VisualBuilderInstance => "/20210601/vbInstances",
        }
    }

    /// Path of a single resource, used for gets and tag updates. Buckets
    /// are addressed by namespace and name instead and never come here.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{id}", self.list_path())
    }

    /// Lifecycle action path for kinds that need the start/tag/stop dance.
    pub fn action_path(&self, id: &str, action: &str) -> String {
        format!("{}/{id}/actions/{action}", self.list_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ResourceKind; 29] = [
        ResourceKind::Instance,
        ResourceKind::BootVolume,
        ResourceKind::BootVolumeBackup,
        ResourceKind::BlockVolume,
        ResourceKind::VolumeBackup,
        ResourceKind::Bucket,
        ResourceKind::FileSystem,
        ResourceKind::LoadBalancer,
        ResourceKind::NetworkLoadBalancer,
        ResourceKind::NetworkFirewall,
        ResourceKind::DbSystem,
        ResourceKind::Database,
        ResourceKind::AutonomousDatabase,
        ResourceKind::ExadataInfrastructure,
        ResourceKind::AutonomousVmCluster,
        ResourceKind::CloudVmCluster,
        ResourceKind::MysqlDbSystem,
        ResourceKind::NosqlTable,
        ResourceKind::OpensearchCluster,
        ResourceKind::AnalyticsInstance,
        ResourceKind::BigDataInstance,
        ResourceKind::DataCatalog,
        ResourceKind::DataIntegrationWorkspace,
        ResourceKind::FunctionApp,
        ResourceKind::Function,
        ResourceKind::ContainerInstance,
        ResourceKind::ArtifactRepository,
        ResourceKind::ServiceMesh,
        ResourceKind::VisualBuilderInstance,
    ];

    #[test]
    fn every_kind_belongs_to_a_group() {
        for kind in ALL {
            assert!(Group::ALL.contains(&kind.group()), "{:?}", kind);
        }
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<&str> = ALL.iter().map(|k| k.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), ALL.len());
    }

    #[test]
    fn state_filters() {
        assert!(ResourceKind::Instance.state_allows("RUNNING"));
        assert!(ResourceKind::Instance.state_allows("STOPPED"));
        assert!(!ResourceKind::Instance.state_allows("TERMINATED"));
        assert!(!ResourceKind::LoadBalancer.state_allows("FAILED"));
        assert!(ResourceKind::MysqlDbSystem.state_allows("INACTIVE"));
        // buckets carry no lifecycle state
        assert!(ResourceKind::Bucket.state_allows(""));
    }

    #[test]
    fn update_quirks() {
        assert!(ResourceKind::BootVolume.clears_tags_first());
        assert!(ResourceKind::BlockVolume.clears_tags_first());
        assert!(ResourceKind::NosqlTable.clears_tags_first());
        assert!(!ResourceKind::Instance.clears_tags_first());

        assert!(ResourceKind::MysqlDbSystem.needs_start_stop());
        assert!(ResourceKind::VisualBuilderInstance.needs_start_stop());
        assert!(!ResourceKind::AnalyticsInstance.needs_start_stop());

        assert!(ResourceKind::AnalyticsInstance.summary_omits_tags());
        assert!(ResourceKind::MysqlDbSystem.summary_omits_tags());
        assert!(ResourceKind::VisualBuilderInstance.summary_omits_tags());
        assert!(!ResourceKind::LoadBalancer.summary_omits_tags());
    }

    #[test]
    fn item_and_action_paths() {
        assert_eq!(
            ResourceKind::Instance.item_path("ocid1.instance.oc1..x"),
            "/20160918/instances/ocid1.instance.oc1..x"
        );
        assert_eq!(
            ResourceKind::MysqlDbSystem.action_path("ocid1.mysqldbsystem.oc1..y", "start"),
            "/20190415/dbSystems/ocid1.mysqldbsystem.oc1..y/actions/start"
        );
    }
}
