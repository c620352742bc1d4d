use orgscope_core::{ClientError, ErrorKind, OrganizationId, ScopeError};
use thiserror::Error;

pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    NotAuthenticated,

    #[error("forbidden: not a member of organization {organization_id}")]
    NotAMember { organization_id: OrganizationId },

    #[error("forbidden: admin or owner only (role is {role})")]
    ForbiddenRole { role: String },

    #[error("membership record is malformed: {0}")]
    MalformedMembership(#[source] serde_json::Error),

    #[error("principal resolver failed: {0}")]
    Resolver(#[source] anyhow::Error),

    #[error(transparent)]
    Scope(#[from] ScopeError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::NotAuthenticated => ErrorKind::NotAuthenticated,
            AuthError::NotAMember { .. } | AuthError::ForbiddenRole { .. } => ErrorKind::Forbidden,
            AuthError::MalformedMembership(_) | AuthError::Resolver(_) => ErrorKind::GeneralError,
            AuthError::Scope(e) => e.kind(),
        }
    }

    /// Machine-readable code for the guard's own rejections.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AuthError::NotAuthenticated => Some("UNAUTHORIZED"),
            AuthError::NotAMember { .. } => Some("FORBIDDEN_ORG"),
            AuthError::ForbiddenRole { .. } => Some("FORBIDDEN_ROLE"),
            AuthError::Scope(e) if e.is_tenant_fault() => Some("FORBIDDEN_ORG"),
            _ => None,
        }
    }

    pub fn sanitize_for_client(&self) -> ClientError {
        ClientError::from_kind(self.kind())
    }
}
