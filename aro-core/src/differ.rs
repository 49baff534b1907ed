//! Differ - Decide what to do with a resource
//!
//! Compares whether the resource currently exists with the desired `state`
//! and picks exactly one action. Attribute-level drift is not inspected:
//! an existing resource that should be present resolves to `Update`, which
//! the reconciler refuses to perform.

use std::fmt;

use crate::resource::Ensure;

/// Action chosen for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do
    NoAction,
    /// Resource does not exist -> needs creation
    Create,
    /// Resource exists and should stay -> update (not supported)
    Update,
    /// Resource exists but should be absent -> needs deletion
    Delete,
}

impl Action {
    /// Returns whether this action writes to the control plane
    pub fn is_mutating(&self) -> bool {
        matches!(self, Action::Create | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::NoAction => "no action",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// Resolve the action from resource presence and desired state
pub fn resolve(exists: bool, desired: Ensure) -> Action {
    match (exists, desired) {
        (false, Ensure::Absent) => Action::NoAction,
        (false, Ensure::Present) => Action::Create,
        (true, Ensure::Absent) => Action::Delete,
        (true, Ensure::Present) => Action::Update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_unwanted_is_no_action() {
        assert_eq!(resolve(false, Ensure::Absent), Action::NoAction);
    }

    #[test]
    fn absent_and_wanted_is_create() {
        assert_eq!(resolve(false, Ensure::Present), Action::Create);
    }

    #[test]
    fn present_and_unwanted_is_delete() {
        assert_eq!(resolve(true, Ensure::Absent), Action::Delete);
    }

    #[test]
    fn present_and_wanted_is_update() {
        let action = resolve(true, Ensure::Present);
        assert_eq!(action, Action::Update);
        assert!(!action.is_mutating());
    }
}
