//! Field translation from cluster settings to the ARM request body
//!
//! Settings use snake_case (e.g., `cluster_resource_group_id`), the wire API
//! uses camelCase (e.g., `resourceGroupId`) and renames a few fields outright.
//! Absent, empty and zero values are omitted rather than sent as null: the
//! control plane treats an explicit null differently from a missing key.

use serde_json::{Map, Value, json};

use crate::cluster::{
    ApiServerProfile, ClusterProfile, ClusterSpec, Identity, IngressProfile, MasterProfile,
    NetworkProfile, PlatformWorkloadIdentityProfile, ServicePrincipalProfile, WorkerProfile,
};

/// Builder for one JSON object that drops empty values
#[derive(Debug, Default)]
struct Fields(Map<String, Value>);

impl Fields {
    fn text(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.0.insert(key.to_string(), json!(v));
        }
        self
    }

    fn number(mut self, key: &str, value: Option<u32>) -> Self {
        if let Some(n) = value.filter(|n| *n > 0) {
            self.0.insert(key.to_string(), json!(n));
        }
        self
    }

    fn nested(mut self, key: &str, value: Option<Value>) -> Self {
        if let Some(v) = value {
            self.0.insert(key.to_string(), v);
        }
        self
    }

    fn finish(self) -> Option<Value> {
        if self.0.is_empty() {
            None
        } else {
            Some(Value::Object(self.0))
        }
    }
}

/// Translate cluster settings into the request body for a PUT
pub fn translate(spec: &ClusterSpec) -> Value {
    let properties = Fields::default()
        .nested(
            "clusterProfile",
            spec.cluster_profile.as_ref().and_then(cluster_profile),
        )
        .nested(
            "servicePrincipalProfile",
            spec.service_principal_profile
                .as_ref()
                .and_then(service_principal_profile),
        )
        .nested(
            "platformWorkloadIdentityProfile",
            spec.platform_workload_identity_profile
                .as_ref()
                .and_then(platform_workload_identity_profile),
        )
        .nested(
            "networkProfile",
            spec.network_profile.as_ref().and_then(network_profile),
        )
        .nested(
            "masterProfile",
            spec.master_profile.as_ref().and_then(master_profile),
        )
        .nested("workerProfiles", worker_profiles(&spec.worker_profiles))
        .nested(
            "apiserverProfile",
            spec.api_server_profile.as_ref().and_then(api_server_profile),
        )
        .nested("ingressProfiles", ingress_profiles(&spec.ingress_profiles));

    let tags = (!spec.tags.is_empty()).then(|| json!(spec.tags));

    let mut body = Fields::default()
        .text("location", Some(spec.location.as_str()))
        .nested("tags", tags)
        .nested("identity", spec.identity.as_ref().and_then(identity));
    body.0.insert(
        "properties".to_string(),
        properties.finish().unwrap_or_else(|| json!({})),
    );
    Value::Object(body.0)
}

fn cluster_profile(profile: &ClusterProfile) -> Option<Value> {
    Fields::default()
        .text("pullSecret", profile.pull_secret.as_deref())
        .text(
            "resourceGroupId",
            profile.cluster_resource_group_id.as_deref(),
        )
        .text("domain", profile.domain.as_deref())
        .text("version", profile.version.as_deref())
        .text(
            "fipsValidatedModules",
            profile.fips_validated_modules.map(|t| t.as_str()),
        )
        .finish()
}

fn service_principal_profile(profile: &ServicePrincipalProfile) -> Option<Value> {
    Fields::default()
        .text("clientId", profile.client_id.as_deref())
        .text("clientSecret", profile.client_secret.as_deref())
        .finish()
}

fn identity(identity: &Identity) -> Option<Value> {
    let user_assigned = identity
        .user_assigned_identities
        .as_ref()
        .filter(|m| !m.is_empty())
        .map(|m| Value::Object(m.clone()));

    Fields::default()
        .text("type", identity.identity_type.map(|t| t.as_str()))
        .nested("userAssignedIdentities", user_assigned)
        .finish()
}

fn platform_workload_identity_profile(profile: &PlatformWorkloadIdentityProfile) -> Option<Value> {
    let identities: Map<String, Value> = profile
        .platform_workload_identities
        .iter()
        .map(|(operator, identity)| {
            let entry = Fields::default()
                .text("resourceId", identity.resource_id.as_deref())
                .finish()
                .unwrap_or_else(|| json!({}));
            (operator.clone(), entry)
        })
        .collect();

    Fields::default()
        .text("upgradeableTo", profile.upgradeable_to.as_deref())
        .nested(
            "platformWorkloadIdentities",
            (!identities.is_empty()).then_some(Value::Object(identities)),
        )
        .finish()
}

fn network_profile(profile: &NetworkProfile) -> Option<Value> {
    let managed_outbound_ips = profile
        .load_balancer_profile
        .as_ref()
        .and_then(|lb| lb.managed_outbound_ips.as_ref())
        .and_then(|ips| Fields::default().number("count", ips.count).finish());
    let load_balancer = Fields::default()
        .nested("managedOutboundIps", managed_outbound_ips)
        .finish();

    Fields::default()
        .text("podCidr", profile.pod_cidr.as_deref())
        .text("serviceCidr", profile.service_cidr.as_deref())
        .text("outboundType", profile.outbound_type.map(|t| t.as_str()))
        .text(
            "preconfiguredNSG",
            profile.preconfigured_nsg.map(|t| t.as_str()),
        )
        .nested("loadBalancerProfile", load_balancer)
        .finish()
}

fn master_profile(profile: &MasterProfile) -> Option<Value> {
    Fields::default()
        .text("subnetId", profile.subnet_id.as_deref())
        .text("vmSize", profile.vm_size.as_deref())
        .text(
            "encryptionAtHost",
            profile.encryption_at_host.map(|t| t.as_str()),
        )
        .text(
            "diskEncryptionSetId",
            profile.disk_encryption_set_id.as_deref(),
        )
        .finish()
}

fn worker_profile(profile: &WorkerProfile) -> Option<Value> {
    Fields::default()
        .text("name", profile.name.as_deref())
        .text("subnetId", profile.subnet_id.as_deref())
        .number("count", profile.count)
        .text("vmSize", profile.vm_size.as_deref())
        .number("diskSizeGB", profile.disk_size)
        .text(
            "encryptionAtHost",
            profile.encryption_at_host.map(|t| t.as_str()),
        )
        .text(
            "diskEncryptionSetId",
            profile.disk_encryption_set_id.as_deref(),
        )
        .finish()
}

fn worker_profiles(profiles: &[WorkerProfile]) -> Option<Value> {
    let items: Vec<Value> = profiles.iter().filter_map(worker_profile).collect();
    (!items.is_empty()).then_some(Value::Array(items))
}

fn api_server_profile(profile: &ApiServerProfile) -> Option<Value> {
    Fields::default()
        .text("visibility", profile.visibility.map(|v| v.as_str()))
        .finish()
}

fn ingress_profile(profile: &IngressProfile) -> Option<Value> {
    Fields::default()
        .text("name", profile.name.as_deref())
        .text("visibility", profile.visibility.map(|v| v.as_str()))
        .finish()
}

fn ingress_profiles(profiles: &[IngressProfile]) -> Option<Value> {
    let items: Vec<Value> = profiles.iter().filter_map(ingress_profile).collect();
    (!items.is_empty()).then_some(Value::Array(items))
}
