//! # Errors
//!
//! Two layers:
//! - [`ScopeError`]: what the isolation layer returns. Tenant faults
//!   (`InvalidTenant`, `TenantMismatch`) are distinct variants so callers can
//!   tell them apart from ordinary backend faults, which pass through
//!   unchanged inside `Store`.
//! - [`ErrorKind`] / [`ClientError`]: Feathers-style status classes for the
//!   transport layer. [`ScopeError::sanitize_for_client`] never reveals whether
//!   a record exists under another tenant.

use thiserror::Error;

use crate::filter::FilterError;
use crate::store::StoreError;
use crate::tenant::OrganizationId;

/// Result alias for the isolation layer.
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;

/// Status classes with HTTP codes and class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
    Unavailable,      // 503
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::Unavailable => 503,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    /// Fixed message used when rendering to clients.
    fn generic_message(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::NotAuthenticated => "authentication required",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "internal error",
            ErrorKind::Unavailable => "service unavailable",
        }
    }
}

#[derive(Debug, Error)]
pub enum ScopeError {
    /// The raw organization id was empty, blank or not a string.
    #[error("invalid organization id: {reason}")]
    InvalidTenant { reason: String },

    /// A write payload named a different organization than the accessor.
    #[error(
        "cross-tenant write attempt on `{model}`: payload names organization `{supplied}`, accessor is bound to `{bound}`"
    )]
    TenantMismatch {
        model: &'static str,
        bound: OrganizationId,
        supplied: String,
    },

    /// The backend has no binding for a tenant-scoped model.
    #[error("model `{0}` has no binding in the backend store")]
    UnboundModel(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `data` payload that is not a JSON object.
    #[error("write payload must be an object, got {0}")]
    InvalidPayload(&'static str),

    #[error(transparent)]
    InvalidFilter(#[from] FilterError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScopeError {
    pub fn invalid_tenant(reason: impl Into<String>) -> Self {
        Self::InvalidTenant {
            reason: reason.into(),
        }
    }

    /// True for faults raised by the isolation layer itself.
    pub fn is_tenant_fault(&self) -> bool {
        matches!(
            self,
            ScopeError::InvalidTenant { .. } | ScopeError::TenantMismatch { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ScopeError::Store(StoreError::NotFound { .. }))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScopeError::InvalidTenant { .. } | ScopeError::TenantMismatch { .. } => {
                ErrorKind::Forbidden
            }
            ScopeError::UnboundModel(_) | ScopeError::InvalidConfig(_) => ErrorKind::GeneralError,
            ScopeError::InvalidFilter(_) | ScopeError::InvalidPayload(_) => ErrorKind::BadRequest,
            ScopeError::Store(store) => store.kind(),
        }
    }

    /// Client-safe view: status class plus a fixed message. Ids and
    /// the underlying cause stay server-side.
    pub fn sanitize_for_client(&self) -> ClientError {
        ClientError::from_kind(self.kind())
    }
}

/// What a transport may show an end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: &'static str,
}

impl ClientError {
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.generic_message(),
        }
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.kind.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.kind.class_name(),
        })
    }
}
