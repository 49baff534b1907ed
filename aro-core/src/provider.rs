//! Provider - Trait abstracting resource operations
//!
//! A Provider talks to one control plane. It is responsible for turning a
//! desired [`Resource`] into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of reading a resource
///
/// Transport failures are kept apart from absence so the caller decides
/// whether an unreadable resource counts as missing.
#[derive(Debug)]
pub enum ReadOutcome {
    Found(State),
    NotFound,
    TransportError(ProviderError),
}

/// Main Provider trait
///
/// Updating an existing resource is not part of the contract; see
/// [`crate::differ::Action::Update`].
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "azure")
    fn name(&self) -> &'static str;

    /// Check that the desired resource carries everything a create needs
    ///
    /// Runs before any network call. The default accepts everything.
    fn check_create(&self, resource: &Resource) -> ProviderResult<()> {
        let _ = resource;
        Ok(())
    }

    /// Get the current state of a resource
    fn read(&self, id: &ResourceId) -> BoxFuture<'_, ReadOutcome>;

    /// Create a resource, returning the state reported by the control plane
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Issue the delete call for a resource
    ///
    /// Completion is observed by the caller through [`Provider::read`].
    fn delete(&self, id: &ResourceId) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn check_create(&self, resource: &Resource) -> ProviderResult<()> {
        (**self).check_create(resource)
    }

    fn read(&self, id: &ResourceId) -> BoxFuture<'_, ReadOutcome> {
        (**self).read(id)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn delete(&self, id: &ResourceId) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id)
    }
}
