//! ARO Azure Provider
//!
//! Azure Red Hat OpenShift cluster provider built on the Azure Resource
//! Manager REST API.
//!
//! ## Module Structure
//!
//! - `cluster` - Typed cluster settings read from an input document
//! - `schemas` - Input schema with validation rules and defaults
//! - `translate` - Settings to wire body translation
//! - `defaults` - Create-time precondition and default values
//! - `client` - REST client with long-running operation support
//! - `provider` - AroProvider implementation
//! - `config` - Provider configuration and endpoint selection
//! - `utils` - Secret redaction

pub mod client;
pub mod cluster;
pub mod config;
pub mod defaults;
pub mod provider;
pub mod schemas;
pub mod translate;
pub mod utils;

// Re-export main types
pub use client::{HttpRestClient, RestClient, RestRequest, RestResponse};
pub use cluster::{ClusterSpec, SpecError};
pub use config::{ProviderConfig, RpMode};
pub use provider::AroProvider;

use aro_core::provider::{Provider, ProviderResult};
use aro_core::reconcile::{Outcome, ReconcileOptions, reconcile};
use serde_json::json;

/// Reconcile one cluster and attach the invocation settings to the result
pub async fn reconcile_cluster<P>(
    spec: &ClusterSpec,
    provider: &P,
    options: &ReconcileOptions,
) -> ProviderResult<Outcome>
where
    P: Provider + ?Sized,
{
    let mut outcome = reconcile(provider, &spec.to_resource(), options).await?;

    outcome.result = outcome
        .result
        .with_extra("api_version", json!(spec.api_version));
    if spec.rp_mode != RpMode::Production {
        outcome.result = outcome
            .result
            .with_extra("rp_mode", json!(spec.rp_mode.as_str()));
    }
    Ok(outcome)
}
