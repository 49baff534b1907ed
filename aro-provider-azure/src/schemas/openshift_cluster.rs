//! OpenShift cluster input schema
//!
//! Attribute names follow the user-facing snake_case document. Translation
//! to the camelCase wire body happens in [`crate::translate`].

use std::sync::LazyLock;

use aro_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use regex::Regex;
use serde_json::{Value, json};

use crate::cluster::{DEFAULT_API_VERSION, RESOURCE_TYPE};

const TOGGLE: &[&str] = &["Disabled", "Enabled"];
const VISIBILITY: &[&str] = &["Public", "Private"];
const OUTBOUND_TYPE: &[&str] = &["Loadbalancer", "UserDefinedRouting"];
const IDENTITY_TYPE: &[&str] = &[
    "None",
    "SystemAssigned",
    "UserAssigned",
    "SystemAssigned,UserAssigned",
];

static API_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(-preview)?$").expect("api version pattern is valid")
});

/// API version string (e.g., "2023-11-22" or "2024-08-12-preview")
pub fn api_version() -> AttributeType {
    AttributeType::Custom {
        name: "ApiVersion".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value.as_str() {
            Some(s) if API_VERSION_PATTERN.is_match(s) => Ok(()),
            Some(s) => Err(format!(
                "Invalid api version '{}', expected YYYY-MM-DD with optional -preview",
                s
            )),
            None => Err("Expected string".to_string()),
        },
    }
}

fn toggle(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::choices(TOGGLE))
}

fn visibility() -> AttributeSchema {
    AttributeSchema::new("visibility", AttributeType::choices(VISIBILITY))
        .with_default(json!("Public"))
}

fn cluster_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("pull_secret", AttributeType::String)
            .with_description("Pull secret for the cluster"),
        AttributeSchema::new("domain", AttributeType::String)
            .with_description("Domain for the cluster, random when unset"),
        AttributeSchema::new("cluster_resource_group_id", AttributeType::String)
            .with_description("Resource group holding the cluster's own resources"),
        AttributeSchema::new("version", AttributeType::String),
        toggle("fips_validated_modules").with_default(json!("Disabled")),
    ])
}

fn service_principal_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("client_id", AttributeType::String),
        AttributeSchema::new("client_secret", AttributeType::String),
    ])
}

fn network_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("pod_cidr", types::cidr()).with_default(json!("10.128.0.0/14")),
        AttributeSchema::new("service_cidr", types::cidr()).with_default(json!("172.30.0.0/16")),
        AttributeSchema::new("outbound_type", AttributeType::choices(OUTBOUND_TYPE)),
        toggle("preconfigured_nsg").with_default(json!("Disabled")),
        AttributeSchema::new(
            "load_balancer_profile",
            AttributeType::Object(vec![AttributeSchema::new(
                "managed_outbound_ips",
                AttributeType::Object(vec![AttributeSchema::new(
                    "count",
                    types::positive_int(),
                )]),
            )]),
        ),
    ])
}

fn identity() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("type", AttributeType::choices(IDENTITY_TYPE)),
        AttributeSchema::new(
            "user_assigned_identities",
            AttributeType::map(AttributeType::Any),
        )
        .with_description("Identity resource IDs, passed through as given"),
    ])
}

fn platform_workload_identity_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("upgradeable_to", AttributeType::String),
        AttributeSchema::new(
            "platform_workload_identities",
            AttributeType::map(AttributeType::Object(vec![AttributeSchema::new(
                "resource_id",
                AttributeType::String,
            )])),
        )
        .with_description("Operator name to user-assigned identity"),
    ])
}

fn master_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("subnet_id", AttributeType::String).required(),
        AttributeSchema::new("vm_size", AttributeType::String),
        toggle("encryption_at_host").with_default(json!("Disabled")),
        AttributeSchema::new("disk_encryption_set_id", AttributeType::String),
    ])
}

fn worker_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("name", AttributeType::choices(&["worker"])).required(),
        AttributeSchema::new("subnet_id", AttributeType::String).required(),
        AttributeSchema::new("count", types::positive_int()).with_default(json!(3)),
        AttributeSchema::new("vm_size", AttributeType::String),
        AttributeSchema::new("disk_size", types::positive_int())
            .with_description("Disk size in GB"),
        toggle("encryption_at_host").with_default(json!("Disabled")),
        AttributeSchema::new("disk_encryption_set_id", AttributeType::String),
    ])
}

fn api_server_profile() -> AttributeType {
    AttributeType::Object(vec![
        visibility(),
        AttributeSchema::new("ip", AttributeType::String),
        AttributeSchema::new("url", AttributeType::String),
    ])
}

fn ingress_profile() -> AttributeType {
    AttributeType::Object(vec![
        AttributeSchema::new("name", AttributeType::choices(&["default"]))
            .with_default(json!("default")),
        visibility(),
        AttributeSchema::new("ip", AttributeType::String),
    ])
}

/// Returns the schema for an OpenShift cluster document
pub fn openshift_cluster_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Azure Red Hat OpenShift managed cluster")
        .attribute(AttributeSchema::new("resource_group", AttributeType::String).required())
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("location", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("subscription_id", AttributeType::String)
                .with_description("Used when no subscription is given on the command line"),
        )
        .attribute(AttributeSchema::new("cluster_profile", cluster_profile()).with_default(json!({})))
        .attribute(AttributeSchema::new(
            "service_principal_profile",
            service_principal_profile(),
        ))
        .attribute(AttributeSchema::new("network_profile", network_profile()).with_default(json!({})))
        .attribute(AttributeSchema::new("identity", identity()))
        .attribute(AttributeSchema::new(
            "platform_workload_identity_profile",
            platform_workload_identity_profile(),
        ))
        .attribute(AttributeSchema::new("master_profile", master_profile()))
        .attribute(AttributeSchema::new(
            "worker_profiles",
            AttributeType::list(worker_profile()),
        ))
        .attribute(AttributeSchema::new("api_server_profile", api_server_profile()))
        .attribute(AttributeSchema::new(
            "ingress_profiles",
            AttributeType::list(ingress_profile()),
        ))
        .attribute(
            AttributeSchema::new("provisioning_state", AttributeType::String)
                .with_description("Reported by the service, ignored on input"),
        )
        .attribute(AttributeSchema::new(
            "tags",
            AttributeType::map(AttributeType::String),
        ))
        .attribute(
            AttributeSchema::new("state", AttributeType::choices(&["present", "absent"]))
                .with_default(json!("present")),
        )
        .attribute(
            AttributeSchema::new("api_version", api_version())
                .with_default(Value::String(DEFAULT_API_VERSION.to_string())),
        )
        .attribute(
            AttributeSchema::new("rp_mode", AttributeType::choices(&["production", "development"]))
                .with_default(json!("production")),
        )
}
