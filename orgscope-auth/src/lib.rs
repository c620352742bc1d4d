//! orgscope-auth: who may get a scoped accessor for which organization.

pub mod error;
pub mod gate;
pub mod membership;
pub mod principal;

pub use error::{AuthError, AuthResult};
pub use gate::{AuthorizedOrg, OrgGate};
pub use membership::{ensure_admin_or_owner, require_membership, MemberRole, Membership, UnknownRole};
pub use principal::{Principal, PrincipalResolver};
