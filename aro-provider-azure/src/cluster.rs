//! Typed cluster settings
//!
//! A [`ClusterSpec`] is built from a user document after the document has
//! passed the OpenShift cluster schema and had its defaults filled in.

use std::collections::BTreeMap;

use aro_core::resource::{Ensure, Resource, ResourceId};
use aro_core::schema::TypeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RpMode;
use crate::schemas::openshift_cluster_schema;
use crate::translate::translate;

/// ARM resource type of an OpenShift cluster
pub const RESOURCE_TYPE: &str = "Microsoft.RedHatOpenShift/openShiftClusters";

/// API version used when the document does not name one
pub const DEFAULT_API_VERSION: &str = "2023-11-22";

/// Errors raised while turning a document into a [`ClusterSpec`]
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("invalid cluster document:\n{}", format_type_errors(.0))]
    Invalid(Vec<TypeError>),

    #[error("cannot read cluster document: {0}")]
    Deserialize(#[from] serde_json::Error),
}

fn format_type_errors(errors: &[TypeError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Disabled/Enabled switch used by several profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Toggle {
    Disabled,
    Enabled,
}

impl Toggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::Disabled => "Disabled",
            Toggle::Enabled => "Enabled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "Public",
            Visibility::Private => "Private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundType {
    Loadbalancer,
    UserDefinedRouting,
}

impl OutboundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundType::Loadbalancer => "Loadbalancer",
            OutboundType::UserDefinedRouting => "UserDefinedRouting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityType {
    None,
    SystemAssigned,
    UserAssigned,
    #[serde(rename = "SystemAssigned,UserAssigned")]
    SystemAndUserAssigned,
}

impl IdentityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityType::None => "None",
            IdentityType::SystemAssigned => "SystemAssigned",
            IdentityType::UserAssigned => "UserAssigned",
            IdentityType::SystemAndUserAssigned => "SystemAssigned,UserAssigned",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClusterProfile {
    pub pull_secret: Option<String>,
    pub domain: Option<String>,
    pub cluster_resource_group_id: Option<String>,
    pub version: Option<String>,
    pub fips_validated_modules: Option<Toggle>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServicePrincipalProfile {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ManagedOutboundIps {
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoadBalancerProfile {
    pub managed_outbound_ips: Option<ManagedOutboundIps>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NetworkProfile {
    pub pod_cidr: Option<String>,
    pub service_cidr: Option<String>,
    pub outbound_type: Option<OutboundType>,
    pub preconfigured_nsg: Option<Toggle>,
    pub load_balancer_profile: Option<LoadBalancerProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Identity {
    #[serde(rename = "type")]
    pub identity_type: Option<IdentityType>,
    /// Passed through untouched; keys are identity resource IDs
    pub user_assigned_identities: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlatformWorkloadIdentity {
    pub resource_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlatformWorkloadIdentityProfile {
    pub upgradeable_to: Option<String>,
    #[serde(default)]
    pub platform_workload_identities: BTreeMap<String, PlatformWorkloadIdentity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MasterProfile {
    pub subnet_id: Option<String>,
    pub vm_size: Option<String>,
    pub encryption_at_host: Option<Toggle>,
    pub disk_encryption_set_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkerProfile {
    pub name: Option<String>,
    pub subnet_id: Option<String>,
    pub count: Option<u32>,
    pub vm_size: Option<String>,
    /// Disk size in GB
    pub disk_size: Option<u32>,
    pub encryption_at_host: Option<Toggle>,
    pub disk_encryption_set_id: Option<String>,
}

/// `ip` and `url` only ever appear in responses and are not sent
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiServerProfile {
    pub visibility: Option<Visibility>,
    pub ip: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngressProfile {
    pub name: Option<String>,
    pub visibility: Option<Visibility>,
    pub ip: Option<String>,
}

/// Desired state of one OpenShift cluster
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClusterSpec {
    pub resource_group: String,
    pub name: String,
    pub location: String,
    pub subscription_id: Option<String>,
    pub cluster_profile: Option<ClusterProfile>,
    pub service_principal_profile: Option<ServicePrincipalProfile>,
    pub network_profile: Option<NetworkProfile>,
    pub identity: Option<Identity>,
    pub platform_workload_identity_profile: Option<PlatformWorkloadIdentityProfile>,
    pub master_profile: Option<MasterProfile>,
    #[serde(default)]
    pub worker_profiles: Vec<WorkerProfile>,
    pub api_server_profile: Option<ApiServerProfile>,
    #[serde(default)]
    pub ingress_profiles: Vec<IngressProfile>,
    /// Output only, accepted for symmetry with the result document
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub state: Ensure,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub rp_mode: RpMode,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl ClusterSpec {
    /// Validate a raw document, fill schema defaults and deserialize it
    pub fn from_document(mut document: Value) -> Result<Self, SpecError> {
        let schema = openshift_cluster_schema();
        schema.validate(&document).map_err(SpecError::Invalid)?;
        schema.apply_defaults(&mut document);
        Ok(serde_json::from_value(document)?)
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(RESOURCE_TYPE, &self.resource_group, &self.name)
    }

    /// Desired resource with the translated request body
    pub fn to_resource(&self) -> Resource {
        Resource::new(self.resource_id(), self.state).with_body(translate(self))
    }
}
