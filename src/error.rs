//! Error types for the authorization core

use thiserror::Error;

/// Authorization core errors
///
/// Three families propagate to callers unmodified: authentication failures
/// (no usable identity), authorization denials (identity resolved but the
/// operation is refused), and subject/policy resolution failures (underlying
/// data could not be loaded). A denial is a policy decision, never a
/// transient fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No usable identity was presented
    #[error("no principal in security context")]
    NotAuthenticated,

    /// Admin-only operation attempted by a non-administrator
    #[error("principal '{user}' is not an administrator")]
    NotAdmin { user: String },

    /// The requested operation is denied for the resource
    #[error("principal '{user}' does not have '{operation}' permission on '{resource}'")]
    PermissionDenied {
        user: String,
        operation: String,
        resource: String,
    },

    /// Identity unknown to the subject source
    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    /// A subject holds a role absent from the policy snapshot
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A role references a policy absent from the policy snapshot
    #[error("role '{role}' references unknown policy '{policy}'")]
    MissingPolicy { role: String, policy: String },

    /// Resource type not present in the registry
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),
}

impl AuthError {
    /// The caller must re-authenticate
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    /// Identity resolved but the operation was refused
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotAdmin { .. } | Self::PermissionDenied { .. })
    }

    /// Subject or policy data could not be loaded
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::UnknownSubject(_)
                | Self::UnknownRole(_)
                | Self::MissingPolicy { .. }
                | Self::UnknownResourceType(_)
        )
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthError>;
