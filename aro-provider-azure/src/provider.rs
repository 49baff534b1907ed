//! Azure Red Hat OpenShift Provider implementation
//!
//! This module contains the provider that reads, creates and deletes
//! OpenShift clusters through the Azure Resource Manager REST API.

use aro_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ReadOutcome};
use aro_core::resource::{Resource, ResourceId, State};
use log::{debug, info};

use crate::client::{HttpRestClient, RestClient, RestRequest};
use crate::config::ProviderConfig;
use crate::defaults::{check_create, prepare_create};
use crate::utils::redact_secrets;

/// Status codes accepted for reads and writes
const ACCEPTED_STATUS: &[u16] = &[200, 201, 202];

/// Delete may also answer 204 when there was nothing to remove
const DELETE_ACCEPTED_STATUS: &[u16] = &[200, 201, 202, 204];

/// OpenShift cluster Provider
pub struct AroProvider {
    client: Box<dyn RestClient>,
    config: ProviderConfig,
}

impl AroProvider {
    /// Create a provider talking HTTP to the endpoint chosen by `config`
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = HttpRestClient::new(
            config.base_url(),
            config.access_token.clone(),
            config.verify_tls(),
        )
        .map_err(|e| ProviderError::new("Failed to create HTTP client").with_cause(e))?;
        info!("Using resource provider endpoint {}", config.base_url());

        Ok(Self::with_client(config, client))
    }

    /// Create a provider over any [`RestClient`]
    pub fn with_client(config: ProviderConfig, client: impl RestClient + 'static) -> Self {
        Self {
            client: Box::new(client),
            config,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Path of a cluster relative to the endpoint
    pub fn resource_path(&self, id: &ResourceId) -> String {
        format!(
            "subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.config.subscription_id, id.resource_group, id.resource_type, id.name
        )
    }

    fn request(&self, request: RestRequest) -> RestRequest {
        request.with_query("api-version", self.config.api_version.clone())
    }

    async fn read_cluster(&self, id: &ResourceId) -> ReadOutcome {
        let request = self
            .request(RestRequest::get(self.resource_path(id)))
            .with_expected_status(ACCEPTED_STATUS);

        match self.client.send(request).await {
            Ok(response) => match response.json() {
                Ok(attributes) => ReadOutcome::Found(State::existing(id.clone(), attributes)),
                Err(e) => ReadOutcome::TransportError(
                    ProviderError::new("Failed to parse cluster")
                        .for_resource(id.clone())
                        .with_cause(e),
                ),
            },
            Err(e) if e.status() == Some(404) => {
                debug!("{} not found", id);
                ReadOutcome::NotFound
            }
            Err(e) => ReadOutcome::TransportError(
                ProviderError::new("Failed to read cluster")
                    .for_resource(id.clone())
                    .with_cause(e),
            ),
        }
    }

    async fn create_cluster(&self, resource: &Resource) -> ProviderResult<State> {
        let mut body = resource.body.clone();
        prepare_create(&mut body, &self.config.subscription_id, &resource.id.name);
        debug!("PUT body: {}", redact_secrets(&body));

        let request = self
            .request(RestRequest::put(self.resource_path(&resource.id), body.clone()))
            .with_expected_status(ACCEPTED_STATUS)
            .with_long_running(self.config.request_timeout, self.config.lro_poll_interval);

        let response = self.client.send(request).await.map_err(|e| {
            ProviderError::new(format!(
                "Failed to create cluster with body {}",
                redact_secrets(&body)
            ))
            .for_resource(resource.id.clone())
            .with_cause(e)
        })?;

        let attributes = response.json().map_err(|e| {
            ProviderError::new("Failed to parse created cluster")
                .for_resource(resource.id.clone())
                .with_cause(e)
        })?;
        Ok(State::existing(resource.id.clone(), attributes))
    }

    async fn delete_cluster(&self, id: &ResourceId) -> ProviderResult<()> {
        let request = self
            .request(RestRequest::delete(self.resource_path(id)))
            .with_expected_status(DELETE_ACCEPTED_STATUS)
            .with_long_running(self.config.request_timeout, self.config.lro_poll_interval);

        self.client.send(request).await.map_err(|e| {
            ProviderError::new("Failed to delete cluster")
                .for_resource(id.clone())
                .with_cause(e)
        })?;
        Ok(())
    }
}

impl Provider for AroProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn check_create(&self, resource: &Resource) -> ProviderResult<()> {
        check_create(&resource.body).map_err(|e| {
            ProviderError::new(e.to_string()).for_resource(resource.id.clone())
        })
    }

    fn read(&self, id: &ResourceId) -> BoxFuture<'_, ReadOutcome> {
        let id = id.clone();
        Box::pin(async move { self.read_cluster(&id).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_cluster(&resource).await })
    }

    fn delete(&self, id: &ResourceId) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        Box::pin(async move { self.delete_cluster(&id).await })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::{ClientError, Method, RestResponse};
    use aro_core::resource::Ensure;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Answers requests from a script and records them
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedClient {
        responses: Arc<Mutex<VecDeque<Result<RestResponse, ClientError>>>>,
        pub(crate) requests: Arc<Mutex<Vec<RestRequest>>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(
            responses: impl IntoIterator<Item = Result<RestResponse, ClientError>>,
        ) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into_iter().collect())),
                requests: Arc::default(),
            }
        }

        pub(crate) fn recorded(&self) -> Vec<RestRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl RestClient for ScriptedClient {
        fn send(&self, request: RestRequest) -> BoxFuture<'_, Result<RestResponse, ClientError>> {
            self.requests.lock().unwrap().push(request);
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Build("script exhausted".to_string())));
            Box::pin(async move { next })
        }
    }

    pub(crate) fn not_found() -> Result<RestResponse, ClientError> {
        Err(ClientError::UnexpectedStatus {
            status: 404,
            body: r#"{"error": {"code": "ResourceNotFound"}}"#.to_string(),
        })
    }

    fn provider(client: &ScriptedClient) -> AroProvider {
        AroProvider::with_client(ProviderConfig::new("sub", "token"), client.clone())
    }

    fn cluster_id() -> ResourceId {
        ResourceId::new(crate::cluster::RESOURCE_TYPE, "rg1", "c1")
    }

    fn create_resource() -> Resource {
        Resource::new(cluster_id(), Ensure::Present).with_body(json!({
            "location": "eastus",
            "properties": {
                "clusterProfile": {"pullSecret": "top-secret", "domain": "mydomain"},
                "servicePrincipalProfile": {"clientId": "x", "clientSecret": "y"},
                "masterProfile": {"subnetId": "/s/master"},
                "workerProfiles": [{"subnetId": "/s/worker", "count": 3}],
            }
        }))
    }

    #[test]
    fn resource_path_follows_arm_layout() {
        let client = ScriptedClient::default();
        assert_eq!(
            provider(&client).resource_path(&cluster_id()),
            "subscriptions/sub/resourceGroups/rg1/providers/Microsoft.RedHatOpenShift/openShiftClusters/c1"
        );
    }

    #[tokio::test]
    async fn read_found_parses_body() {
        let client = ScriptedClient::new([Ok(RestResponse::new(
            200,
            r#"{"id": "/x", "name": "c1", "properties": {"provisioningState": "Succeeded"}}"#,
        ))]);

        let outcome = provider(&client).read(&cluster_id()).await;

        let ReadOutcome::Found(state) = outcome else {
            panic!("expected Found, got {:?}", outcome);
        };
        assert_eq!(state.attributes["name"], "c1");
        let requests = client.recorded();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(
            requests[0].query,
            vec![("api-version".to_string(), "2023-11-22".to_string())]
        );
        assert_eq!(requests[0].expected_status, vec![200, 201, 202]);
    }

    #[tokio::test]
    async fn read_404_is_not_found() {
        let client = ScriptedClient::new([not_found()]);
        let outcome = provider(&client).read(&cluster_id()).await;
        assert!(matches!(outcome, ReadOutcome::NotFound));
    }

    #[tokio::test]
    async fn read_other_failures_are_transport_errors() {
        let client = ScriptedClient::new([
            Err(ClientError::UnexpectedStatus {
                status: 500,
                body: "boom".to_string(),
            }),
            Ok(RestResponse::new(200, "<html>")),
        ]);
        let provider = provider(&client);

        assert!(matches!(
            provider.read(&cluster_id()).await,
            ReadOutcome::TransportError(_)
        ));
        assert!(matches!(
            provider.read(&cluster_id()).await,
            ReadOutcome::TransportError(_)
        ));
    }

    #[tokio::test]
    async fn create_fills_defaults_and_puts_once() {
        let client = ScriptedClient::new([Ok(RestResponse::new(
            201,
            r#"{"id": "/x", "name": "c1"}"#,
        ))]);

        let state = provider(&client).create(&create_resource()).await.unwrap();

        assert!(state.exists);
        let requests = client.recorded();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert!(requests[0].poll_interval.is_some());
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["properties"]["clusterProfile"]["domain"], "mydomain");
        assert_eq!(
            body["properties"]["workerProfiles"][0]["vmSize"],
            "Standard_D4s_v3"
        );
        assert_eq!(body["properties"]["masterProfile"]["vmSize"], "Standard_D8s_v3");
    }

    #[tokio::test]
    async fn create_failure_reports_redacted_body_and_cause() {
        let client = ScriptedClient::new([Err(ClientError::UnexpectedStatus {
            status: 400,
            body: "InvalidParameter".to_string(),
        })]);

        let err = provider(&client)
            .create(&create_resource())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Failed to create cluster with body"));
        assert!(message.contains("InvalidParameter"));
        assert!(message.contains("mydomain"));
        assert!(!message.contains("top-secret"));
        assert!(!message.contains("\"y\""));
    }

    #[tokio::test]
    async fn delete_accepts_no_content() {
        let client = ScriptedClient::new([Ok(RestResponse::new(204, ""))]);

        provider(&client).delete(&cluster_id()).await.unwrap();

        let requests = client.recorded();
        assert_eq!(requests[0].method, Method::Delete);
        assert!(requests[0].expected_status.contains(&204));
    }

    #[test]
    fn check_create_maps_to_provider_error() {
        let client = ScriptedClient::default();
        let mut resource = create_resource();
        resource.body["properties"]
            .as_object_mut()
            .unwrap()
            .remove("workerProfiles");

        let err = provider(&client).check_create(&resource).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "[{}] worker_profiles is required for creating a openshift cluster",
                cluster_id()
            )
        );
    }
}
