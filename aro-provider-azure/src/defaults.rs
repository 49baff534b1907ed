//! Create-time precondition and default values
//!
//! Both operate on the translated request body, so they see exactly what
//! would be sent.

use rand::Rng;
use serde_json::{Map, Value, json};

pub const DEFAULT_WORKER_NAME: &str = "worker";
pub const DEFAULT_WORKER_VM_SIZE: &str = "Standard_D4s_v3";
pub const DEFAULT_WORKER_DISK_SIZE_GB: u32 = 128;
pub const DEFAULT_MASTER_VM_SIZE: &str = "Standard_D8s_v3";
pub const DEFAULT_INGRESS_NAME: &str = "default";

const TOKEN_LEN: usize = 8;
const TOKEN_HEAD: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const TOKEN_TAIL: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Reasons a body cannot be used to create a cluster
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateCheckError {
    #[error("{0} is required for creating a openshift cluster")]
    MissingProfile(&'static str),

    #[error(
        "Either service_principal_profile or platform_workload_identity_profile is required for creating a openshift cluster"
    )]
    NoAuthProfile,

    #[error(
        "Only one of service_principal_profile or platform_workload_identity_profile may be given"
    )]
    ConflictingAuthProfiles,

    #[error("service_principal_profile requires both client_id and client_secret")]
    IncompleteServicePrincipal,
}

/// Values the default filler needs besides the body itself
#[derive(Debug, Clone)]
pub struct DefaultContext<'a> {
    pub subscription_id: &'a str,
    pub cluster_name: &'a str,
    /// Random token shared by the default domain and cluster resource group
    pub token: String,
}

/// Verify the body carries every profile a create needs
pub fn check_create(body: &Value) -> Result<(), CreateCheckError> {
    let properties = &body["properties"];

    for (key, name) in [
        ("workerProfiles", "worker_profiles"),
        ("clusterProfile", "cluster_profile"),
        ("masterProfile", "master_profile"),
    ] {
        if properties.get(key).is_none_or(Value::is_null) {
            return Err(CreateCheckError::MissingProfile(name));
        }
    }

    let service_principal = properties.get("servicePrincipalProfile").is_some();
    let workload_identity = properties.get("platformWorkloadIdentityProfile").is_some();
    match (service_principal, workload_identity) {
        (false, false) => Err(CreateCheckError::NoAuthProfile),
        (true, true) => Err(CreateCheckError::ConflictingAuthProfiles),
        (true, false) => {
            let profile = &properties["servicePrincipalProfile"];
            if is_blank(profile.get("clientId")) || is_blank(profile.get("clientSecret")) {
                Err(CreateCheckError::IncompleteServicePrincipal)
            } else {
                Ok(())
            }
        }
        (false, true) => Ok(()),
    }
}

/// Generate the token used for default names
///
/// Eight lowercase alphanumerics, starting with a letter because the
/// cluster domain may not begin with a digit.
pub fn random_token(rng: &mut impl Rng) -> String {
    let mut token = String::with_capacity(TOKEN_LEN);
    token.push(TOKEN_HEAD[rng.gen_range(0..TOKEN_HEAD.len())] as char);
    for _ in 1..TOKEN_LEN {
        token.push(TOKEN_TAIL[rng.gen_range(0..TOKEN_TAIL.len())] as char);
    }
    token
}

/// Fill the values the service requires but the user may leave out
pub fn fill_defaults(body: &mut Value, ctx: &DefaultContext<'_>) {
    let Some(properties) = body
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    properties
        .entry("apiserverProfile")
        .or_insert_with(|| json!({"visibility": "Public"}));

    match properties.get_mut("ingressProfiles").and_then(Value::as_array_mut) {
        Some(profiles) => {
            for profile in profiles.iter_mut().filter_map(Value::as_object_mut) {
                profile.insert("name".to_string(), json!(DEFAULT_INGRESS_NAME));
            }
        }
        None => {
            properties.insert(
                "ingressProfiles".to_string(),
                json!([{"visibility": "Public", "name": DEFAULT_INGRESS_NAME}]),
            );
        }
    }

    if let Some(worker) = properties
        .get_mut("workerProfiles")
        .and_then(Value::as_array_mut)
        .and_then(|profiles| profiles.first_mut())
        .and_then(Value::as_object_mut)
    {
        set_if_absent(worker, "name", json!(DEFAULT_WORKER_NAME));
        set_if_absent(worker, "vmSize", json!(DEFAULT_WORKER_VM_SIZE));
        set_if_absent(worker, "diskSizeGB", json!(DEFAULT_WORKER_DISK_SIZE_GB));
    }

    if let Some(master) = properties
        .get_mut("masterProfile")
        .and_then(Value::as_object_mut)
    {
        set_if_absent(master, "vmSize", json!(DEFAULT_MASTER_VM_SIZE));
    }

    if let Some(cluster) = properties
        .get_mut("clusterProfile")
        .and_then(Value::as_object_mut)
    {
        set_if_absent(cluster, "pullSecret", json!(""));
        if is_blank(cluster.get("domain")) {
            cluster.insert("domain".to_string(), json!(ctx.token));
        }
        if is_blank(cluster.get("resourceGroupId")) {
            cluster.insert(
                "resourceGroupId".to_string(),
                json!(format!(
                    "/subscriptions/{}/resourceGroups/{}-{}",
                    ctx.subscription_id, ctx.cluster_name, ctx.token
                )),
            );
        }
    }
}

/// Draw a fresh token and fill defaults
///
/// A retried create draws a new token, so the defaulted domain and resource
/// group differ from one attempt to the next.
pub fn prepare_create(body: &mut Value, subscription_id: &str, cluster_name: &str) {
    let ctx = DefaultContext {
        subscription_id,
        cluster_name,
        token: random_token(&mut rand::thread_rng()),
    };
    fill_defaults(body, &ctx);
}

fn set_if_absent(map: &mut Map<String, Value>, key: &str, value: Value) {
    if !map.contains_key(key) {
        map.insert(key.to_string(), value);
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn create_body() -> Value {
        json!({
            "location": "eastus",
            "properties": {
                "clusterProfile": {"fipsValidatedModules": "Disabled"},
                "servicePrincipalProfile": {"clientId": "x", "clientSecret": "y"},
                "masterProfile": {"subnetId": "/s/master"},
                "workerProfiles": [{"subnetId": "/s/worker", "count": 3}],
            }
        })
    }

    fn ctx(token: &str) -> DefaultContext<'static> {
        DefaultContext {
            subscription_id: "sub",
            cluster_name: "c1",
            token: token.to_string(),
        }
    }

    #[test]
    fn check_create_accepts_complete_body() {
        assert_eq!(check_create(&create_body()), Ok(()));
    }

    #[test]
    fn check_create_names_missing_profile() {
        let mut body = create_body();
        body["properties"]
            .as_object_mut()
            .unwrap()
            .remove("masterProfile");

        let err = check_create(&body).unwrap_err();
        assert_eq!(err, CreateCheckError::MissingProfile("master_profile"));
        assert_eq!(
            err.to_string(),
            "master_profile is required for creating a openshift cluster"
        );
    }

    #[test]
    fn check_create_requires_one_auth_profile() {
        let mut body = create_body();
        body["properties"]
            .as_object_mut()
            .unwrap()
            .remove("servicePrincipalProfile");
        assert_eq!(check_create(&body), Err(CreateCheckError::NoAuthProfile));

        let mut body = create_body();
        body["properties"]["platformWorkloadIdentityProfile"] =
            json!({"upgradeableTo": "4.15.40"});
        assert_eq!(
            check_create(&body),
            Err(CreateCheckError::ConflictingAuthProfiles)
        );
    }

    #[test]
    fn check_create_requires_complete_service_principal() {
        let mut body = create_body();
        body["properties"]["servicePrincipalProfile"] = json!({"clientId": "x"});
        assert_eq!(
            check_create(&body),
            Err(CreateCheckError::IncompleteServicePrincipal)
        );

        body["properties"]["servicePrincipalProfile"] = json!({"clientId": "", "clientSecret": "y"});
        assert_eq!(
            check_create(&body),
            Err(CreateCheckError::IncompleteServicePrincipal)
        );
    }

    #[test]
    fn client_id_alone_fails_from_document() {
        let spec = crate::cluster::ClusterSpec::from_document(json!({
            "resource_group": "rg1",
            "name": "c1",
            "location": "eastus",
            "service_principal_profile": {"client_id": "x"},
            "master_profile": {"subnet_id": "/s/master"},
            "worker_profiles": [{"name": "worker", "subnet_id": "/s/worker"}],
        }))
        .unwrap();

        let body = spec.to_resource().body;
        assert_eq!(
            body["properties"]["servicePrincipalProfile"],
            json!({"clientId": "x"})
        );
        assert_eq!(
            check_create(&body),
            Err(CreateCheckError::IncompleteServicePrincipal)
        );
    }

    #[test]
    fn random_token_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let token = random_token(&mut rng);
            assert_eq!(token.len(), 8);
            assert!(token.chars().next().unwrap().is_ascii_lowercase());
            assert!(
                token
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn fill_defaults_completes_first_worker_and_master() {
        let mut body = create_body();
        fill_defaults(&mut body, &ctx("abc12345"));

        let properties = &body["properties"];
        assert_eq!(
            properties["workerProfiles"][0],
            json!({
                "name": "worker",
                "subnetId": "/s/worker",
                "count": 3,
                "vmSize": "Standard_D4s_v3",
                "diskSizeGB": 128,
            })
        );
        assert_eq!(properties["masterProfile"]["vmSize"], "Standard_D8s_v3");
        assert_eq!(properties["apiserverProfile"], json!({"visibility": "Public"}));
        assert_eq!(
            properties["ingressProfiles"],
            json!([{"visibility": "Public", "name": "default"}])
        );
        assert_eq!(properties["clusterProfile"]["pullSecret"], "");
    }

    #[test]
    fn fill_defaults_keeps_user_values() {
        let mut body = create_body();
        body["properties"]["workerProfiles"][0]["vmSize"] = json!("Standard_D8s_v3");
        body["properties"]["workerProfiles"][0]["diskSizeGB"] = json!(256);
        body["properties"]["masterProfile"]["vmSize"] = json!("Standard_D16s_v3");
        body["properties"]["apiserverProfile"] = json!({"visibility": "Private"});

        fill_defaults(&mut body, &ctx("abc12345"));

        let properties = &body["properties"];
        assert_eq!(properties["workerProfiles"][0]["vmSize"], "Standard_D8s_v3");
        assert_eq!(properties["workerProfiles"][0]["diskSizeGB"], 256);
        assert_eq!(properties["masterProfile"]["vmSize"], "Standard_D16s_v3");
        assert_eq!(properties["apiserverProfile"]["visibility"], "Private");
    }

    #[test]
    fn fill_defaults_only_touches_first_worker() {
        let mut body = create_body();
        body["properties"]["workerProfiles"] =
            json!([{"subnetId": "/s/a"}, {"subnetId": "/s/b"}]);

        fill_defaults(&mut body, &ctx("abc12345"));

        assert_eq!(
            body["properties"]["workerProfiles"][1],
            json!({"subnetId": "/s/b"})
        );
    }

    #[test]
    fn fill_defaults_forces_ingress_names() {
        let mut body = create_body();
        body["properties"]["ingressProfiles"] =
            json!([{"visibility": "Private"}, {"name": "apps", "visibility": "Public"}]);

        fill_defaults(&mut body, &ctx("abc12345"));

        assert_eq!(
            body["properties"]["ingressProfiles"],
            json!([
                {"visibility": "Private", "name": "default"},
                {"name": "default", "visibility": "Public"},
            ])
        );
    }

    #[test]
    fn fill_defaults_derives_domain_and_resource_group_from_token() {
        let mut body = create_body();
        body["properties"]["clusterProfile"]["domain"] = json!("");

        fill_defaults(&mut body, &ctx("k3x9q2ab"));

        let cluster = &body["properties"]["clusterProfile"];
        assert_eq!(cluster["domain"], "k3x9q2ab");
        assert_eq!(
            cluster["resourceGroupId"],
            "/subscriptions/sub/resourceGroups/c1-k3x9q2ab"
        );
    }

    #[test]
    fn fill_defaults_keeps_explicit_domain_and_resource_group() {
        let mut body = create_body();
        body["properties"]["clusterProfile"]["domain"] = json!("mydomain");
        body["properties"]["clusterProfile"]["resourceGroupId"] =
            json!("/subscriptions/sub/resourceGroups/crg");

        let mut first = body.clone();
        let mut second = body.clone();
        fill_defaults(&mut first, &ctx("aaaaaaaa"));
        fill_defaults(&mut second, &ctx("bbbbbbbb"));

        assert_eq!(first, second);
        assert_eq!(first["properties"]["clusterProfile"]["domain"], "mydomain");
    }

    #[test]
    fn separate_creates_draw_separate_defaults() {
        let mut first = create_body();
        let mut second = create_body();
        prepare_create(&mut first, "sub", "c1");
        prepare_create(&mut second, "sub", "c1");

        let domain = |body: &Value| {
            body["properties"]["clusterProfile"]["domain"]
                .as_str()
                .unwrap()
                .to_string()
        };
        assert_ne!(domain(&first), domain(&second));

        for body in [&first, &second] {
            let token = domain(body);
            assert_eq!(token.len(), 8);
            assert_eq!(
                body["properties"]["clusterProfile"]["resourceGroupId"],
                format!("/subscriptions/sub/resourceGroups/c1-{}", token)
            );
        }
    }
}
