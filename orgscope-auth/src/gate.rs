use std::fmt;
use std::sync::Arc;

use orgscope_core::{AccessorFactory, ScopedDb};
use tracing::{debug, instrument};

use crate::error::{AuthError, AuthResult};
use crate::membership::{ensure_admin_or_owner, require_membership, Membership};
use crate::principal::{Principal, PrincipalResolver};

/// Everything a handler needs after the guard has passed.
#[derive(Debug, Clone)]
pub struct AuthorizedOrg {
    pub principal: Principal,
    pub membership: Membership,
    pub db: ScopedDb,
}

/// Request guard: session, then organization id, then membership. Only on
/// success is a [`ScopedDb`] handed out, so handlers never bind one to an
/// organization the caller does not belong to.
#[derive(Clone)]
pub struct OrgGate {
    resolver: Arc<dyn PrincipalResolver>,
    factory: AccessorFactory,
}

impl OrgGate {
    pub fn new(resolver: Arc<dyn PrincipalResolver>, factory: AccessorFactory) -> Self {
        Self { resolver, factory }
    }

    pub fn factory(&self) -> &AccessorFactory {
        &self.factory
    }

    pub async fn require_auth(&self) -> AuthResult<Principal> {
        self.resolver
            .current()
            .await
            .map_err(AuthError::Resolver)?
            .ok_or(AuthError::NotAuthenticated)
    }

    #[instrument(skip(self))]
    pub async fn authorize(&self, organization_id: &str) -> AuthResult<AuthorizedOrg> {
        let principal = self.require_auth().await?;
        let db = self.factory.for_raw(organization_id)?;
        let membership = require_membership(&db, &principal.user_id).await?;

        debug!(user_id = %principal.user_id, role = %membership.role, "organization access granted");
        Ok(AuthorizedOrg {
            principal,
            membership,
            db,
        })
    }

    /// [`authorize`](Self::authorize), restricted to owners and admins.
    pub async fn authorize_admin(&self, organization_id: &str) -> AuthResult<AuthorizedOrg> {
        let authorized = self.authorize(organization_id).await?;
        ensure_admin_or_owner(authorized.membership.role)?;
        Ok(authorized)
    }
}

impl fmt::Debug for OrgGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrgGate")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}
