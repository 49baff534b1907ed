//! Reconcile - Drive one resource from its current state to the desired one
//!
//! One invocation reads the resource once, resolves a single [`Action`] and
//! performs at most one write. Deletes are followed by reads until the
//! resource is gone or the [`PollPolicy`] runs out.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::differ::{Action, resolve};
use crate::poll::{PollPolicy, ReadErrorPolicy};
use crate::provider::{Provider, ProviderError, ProviderResult, ReadOutcome};
use crate::resource::{Ensure, Resource, ResourceId, State};

/// Warning attached to the result when an existing resource is left untouched
pub const UPDATE_UNSUPPORTED: &str =
    "update of an existing cluster is not supported; no changes were applied";

/// Options for a single reconcile run
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Resolve and report the action without writing
    pub check_mode: bool,
    pub read_errors: ReadErrorPolicy,
    pub delete_poll: PollPolicy,
}

/// Normalized result of a reconcile run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultDocument {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(rename = "systemData", skip_serializing_if = "Option::is_none")]
    pub system_data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Provider-specific fields echoed back to the caller
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ResultDocument {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Default::default()
        }
    }

    /// Copy the caller-facing fields out of a control plane resource document
    pub fn from_resource(changed: bool, resource: &Value) -> Self {
        let field = |key: &str| resource.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            changed,
            id: field("id"),
            name: field("name"),
            resource_type: field("type"),
            location: field("location"),
            properties: field("properties"),
            identity: field("identity"),
            tags: field("tags"),
            system_data: field("systemData"),
            warnings: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// What a reconcile run decided and produced
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub action: Action,
    pub result: ResultDocument,
}

/// Reconcile one resource against its provider
pub async fn reconcile<P>(
    provider: &P,
    desired: &Resource,
    options: &ReconcileOptions,
) -> ProviderResult<Outcome>
where
    P: Provider + ?Sized,
{
    if desired.ensure == Ensure::Present {
        provider.check_create(desired)?;
    }

    let current = read_state(provider, &desired.id, options.read_errors).await?;
    let action = resolve(current.exists, desired.ensure);
    info!(
        "{}: exists={}, desired={}, action={}",
        desired.id, current.exists, desired.ensure, action
    );

    if options.check_mode && action.is_mutating() {
        return Ok(Outcome {
            action,
            result: ResultDocument::changed(),
        });
    }

    let result = match action {
        Action::NoAction => ResultDocument::unchanged(),
        Action::Update => {
            warn!("{}: {}", desired.id, UPDATE_UNSUPPORTED);
            ResultDocument::from_resource(false, &current.attributes)
                .with_warning(UPDATE_UNSUPPORTED)
        }
        Action::Create => {
            let created = provider.create(desired).await?;
            info!("{}: created", desired.id);
            ResultDocument::from_resource(true, &created.attributes)
        }
        Action::Delete => {
            provider.delete(&desired.id).await?;
            wait_until_absent(provider, &desired.id, options).await?;
            info!("{}: deleted", desired.id);
            ResultDocument::changed()
        }
    };

    Ok(Outcome { action, result })
}

/// Read a resource, applying the read-error policy
pub async fn read_state<P>(
    provider: &P,
    id: &ResourceId,
    policy: ReadErrorPolicy,
) -> ProviderResult<State>
where
    P: Provider + ?Sized,
{
    match provider.read(id).await {
        ReadOutcome::Found(state) => Ok(state),
        ReadOutcome::NotFound => Ok(State::not_found(id.clone())),
        ReadOutcome::TransportError(e) => match policy {
            ReadErrorPolicy::Propagate => Err(e),
            ReadErrorPolicy::TreatAsAbsent => {
                warn!("{}: read failed, treating as absent: {}", id, e);
                Ok(State::not_found(id.clone()))
            }
        },
    }
}

async fn wait_until_absent<P>(
    provider: &P,
    id: &ResourceId,
    options: &ReconcileOptions,
) -> ProviderResult<()>
where
    P: Provider + ?Sized,
{
    let policy = &options.delete_poll;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let state = read_state(provider, id, options.read_errors).await?;
        if !state.exists {
            return Ok(());
        }
        if policy.exhausted(attempt) {
            return Err(ProviderError::new(format!(
                "resource still present after {} polls",
                attempt
            ))
            .for_resource(id.clone()));
        }
        debug!("{}: still present after poll {}", id, attempt);
        tokio::time::sleep(policy.interval).await;
    }
}
