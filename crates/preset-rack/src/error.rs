//! Error types for the panel core.

use crate::host::HostError;

/// Result type alias for panel core operations.
pub type Result<T> = std::result::Result<T, RackError>;

/// Errors that can occur in the panel core.
///
/// None of these are fatal to the host application: the worst case is a
/// stale thumbnail or a rejected reorder, both recoverable by retrying the
/// gesture. Operations referencing ids that have merely gone stale degrade
/// silently instead of producing one of these.
#[derive(Debug, thiserror::Error)]
pub enum RackError {
    /// A move destination does not exist or its index is out of range.
    /// The operation was aborted with no partial mutation.
    #[error("invalid move target: {reason}")]
    InvalidTarget { reason: String },

    /// An operation referenced a group or preset missing from the model.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A host collaborator call failed. The model is left in its
    /// last-known-good state.
    #[error("host collection unavailable")]
    HostUnavailable(#[from] HostError),
}

impl RackError {
    /// Create an invalid-target error.
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for a group id.
    pub fn group_not_found(id: impl std::fmt::Debug) -> Self {
        Self::NotFound {
            kind: "group",
            id: format!("{id:?}"),
        }
    }

    /// Create a not-found error for a preset id.
    pub fn preset_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind: "preset",
            id: id.to_string(),
        }
    }
}
