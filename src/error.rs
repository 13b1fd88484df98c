//! Error types.
//!
//! Three layers of failure exist:
//! - [`AttributeError`]: a declared value fails a group's precondition.
//!   Raised by appliers before any native call is made.
//! - [`NativeError`]: the engine rejected a call. Propagated unchanged.
//! - [`ReconcileError`]: everything the host boundary can return.
//!
//! Listener bookkeeping mismatches are invariant violations and panic
//! instead of producing an error value.

use thiserror::Error;

use crate::engine::LiveObjectHandle;
use crate::types::{Flavor, ObjectId};

/// Result alias for host-boundary operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Result alias for engine calls.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

// =============================================================================
// Attribute Errors
// =============================================================================

/// A field value failed its group's precondition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    /// Wrong value type for the field.
    #[error("field `{field}`: expected {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Bundle carries a key the group does not know.
    #[error("field `{field}`: unknown bundle key `{key}`")]
    UnknownKey { field: String, key: String },

    /// Value has the right type but is outside the accepted range.
    #[error("field `{field}`: {reason}")]
    OutOfRange { field: String, reason: String },

    /// A required field is absent.
    #[error("field `{field}` is required")]
    Missing { field: String },
}

impl AttributeError {
    /// Top-level attribute name the error refers to (`debug` for
    /// `debug.body_color`).
    pub fn field(&self) -> &str {
        let path = match self {
            AttributeError::WrongType { field, .. }
            | AttributeError::UnknownKey { field, .. }
            | AttributeError::OutOfRange { field, .. }
            | AttributeError::Missing { field } => field.as_str(),
        };
        path.split('.').next().unwrap_or(path)
    }

    pub(crate) fn wrong_type(field: &str, expected: &'static str, found: &'static str) -> Self {
        AttributeError::WrongType {
            field: field.to_string(),
            expected,
            found,
        }
    }

    pub(crate) fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        AttributeError::OutOfRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Native Errors
// =============================================================================

/// The presentation engine rejected a call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    /// Target object does not exist (never created or already destroyed).
    #[error("native object {0} does not exist")]
    MissingObject(ObjectId),

    /// Scene key unknown to the game's scene registry.
    #[error("scene `{0}` is not registered")]
    MissingScene(String),

    /// Scene key already taken.
    #[error("scene `{0}` is already registered")]
    DuplicateScene(String),

    /// Object does not support the requested call.
    #[error("native object {target} does not support `{call}`")]
    Unsupported { target: ObjectId, call: &'static str },

    /// Any other engine failure.
    #[error("engine error: {0}")]
    Other(String),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// A capability table is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two groups of the same flavor claim one field.
    #[error("flavor `{flavor}`: field `{field}` claimed by both `{first}` and `{second}`")]
    OverlappingField {
        flavor: Flavor,
        field: &'static str,
        first: &'static str,
        second: &'static str,
    },

    /// Two groups of the same flavor share a name.
    #[error("flavor `{flavor}`: duplicate group `{group}`")]
    DuplicateGroup { flavor: Flavor, group: &'static str },

    /// Flavor registered more than once.
    #[error("flavor `{0}` is already registered")]
    DuplicateFlavor(Flavor),
}

// =============================================================================
// Reconcile Errors
// =============================================================================

/// Errors surfaced through the host boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// Flavor has no registry entry.
    #[error("unknown flavor `{0}`")]
    UnknownFlavor(Flavor),

    /// A group rejected its fields; nothing was applied.
    #[error("invalid attribute for {flavor} group `{group}`: {source}")]
    InvalidAttribute {
        flavor: Flavor,
        group: &'static str,
        #[source]
        source: AttributeError,
    },

    /// Parent cannot host a child of this flavor.
    #[error("{child} cannot be attached to {parent}")]
    InvalidParent { child: Flavor, parent: String },

    /// Handle was destroyed or never issued.
    #[error("stale live object handle {0:?}")]
    StaleHandle(LiveObjectHandle),

    /// A construction-time field changed after creation.
    #[error("{flavor} field `{field}` can only be set at construction")]
    ConstructOnly { flavor: Flavor, field: &'static str },

    /// Engine call failed.
    #[error(transparent)]
    Native(#[from] NativeError),
}
