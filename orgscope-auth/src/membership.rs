use std::fmt;
use std::str::FromStr;

use orgscope_core::{Filter, FindArgs, Record, ScopedDb, SECURITY_TARGET};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
            MemberRole::Viewer => "viewer",
        }
    }

    pub fn is_admin_or_owner(&self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Admin)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown member role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for MemberRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(MemberRole::Owner),
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            "viewer" => Ok(MemberRole::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// An `organizationMember` row.
///
/// The tenant column name is configurable, so `organization_id` is not read
/// from the row; [`require_membership`] fills it from the bound accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    #[serde(skip_deserializing)]
    pub organization_id: String,
    pub user_id: String,
    pub role: MemberRole,
}

impl TryFrom<Record> for Membership {
    type Error = AuthError;

    fn try_from(record: Record) -> AuthResult<Self> {
        serde_json::from_value(Value::Object(record)).map_err(AuthError::MalformedMembership)
    }
}

/// Look up `user_id`'s membership in the organization `db` is bound to.
#[instrument(skip(db), fields(organization_id = %db.organization_id()))]
pub async fn require_membership(db: &ScopedDb, user_id: &str) -> AuthResult<Membership> {
    let row = db
        .organization_member()
        .find_first(FindArgs::new().filter(Filter::eq("userId", user_id)))
        .await?;

    match row {
        Some(row) => {
            let mut membership = Membership::try_from(row)?;
            membership.organization_id = db.organization_id().to_string();
            Ok(membership)
        }
        None => {
            warn!(target: SECURITY_TARGET, user_id, "organization access denied: not a member");
            Err(AuthError::NotAMember {
                organization_id: db.organization_id().clone(),
            })
        }
    }
}

pub fn ensure_admin_or_owner(role: MemberRole) -> AuthResult<()> {
    if role.is_admin_or_owner() {
        Ok(())
    } else {
        Err(AuthError::ForbiddenRole {
            role: role.to_string(),
        })
    }
}
