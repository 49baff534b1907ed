//! Resource - Representing resources and their state

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "Microsoft.RedHatOpenShift/openShiftClusters")
    pub resource_type: String,
    /// Resource group the resource lives in
    pub resource_group: String,
    /// Resource name
    pub name: String,
}

impl ResourceId {
    pub fn new(
        resource_type: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.resource_type, self.resource_group, self.name
        )
    }
}

/// Whether the resource should exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    Absent,
}

impl fmt::Display for Ensure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ensure::Present => write!(f, "present"),
            Ensure::Absent => write!(f, "absent"),
        }
    }
}

/// Desired state, already translated into the provider's wire representation
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub ensure: Ensure,
    /// Request body sent to the control plane on create
    pub body: Value,
}

impl Resource {
    pub fn new(id: ResourceId, ensure: Ensure) -> Self {
        Self {
            id,
            ensure,
            body: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Look up a top-level `properties` entry of the request body
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.body.get("properties").and_then(|p| p.get(key))
    }
}

/// Current state fetched from the control plane
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Resource document as returned by the control plane
    pub attributes: Value,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            attributes: Value::Null,
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: Value) -> Self {
        Self {
            id,
            attributes,
            exists: true,
        }
    }
}
