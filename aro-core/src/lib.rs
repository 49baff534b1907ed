//! ARO Core
//!
//! Provider-agnostic pieces of the cluster reconciler: input schemas,
//! resource and state types, action resolution and the reconcile driver.

pub mod differ;
pub mod poll;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod schema;
