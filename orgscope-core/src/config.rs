//! # Configuration
//!
//! A small string key/value store, layered however the application likes
//! (defaults, files, environment), then frozen into a [`ConfigSnapshot`]
//! and parsed into typed [`ScopeSettings`].
//!
//! ```rust
//! use orgscope_core::{ScopeConfig, ScopeSettings, UpdateTenantPolicy};
//!
//! let mut config = ScopeConfig::new();
//! config.set("update.tenant_field_policy", "strip");
//! config.set("query.max_take", "100");
//!
//! let settings = ScopeSettings::from_snapshot(&config.snapshot()).unwrap();
//! assert_eq!(settings.update_policy, UpdateTenantPolicy::Strip);
//! assert_eq!(settings.max_take, Some(100));
//! assert_eq!(settings.tenant_field, "organizationId");
//! ```
//!
//! ## Environment overrides
//! [`ScopeConfig::load_env`] maps `PREFIX__TENANT__FIELD=orgId` to
//! `tenant.field = orgId`.
//!
//! Keys:
//! - `tenant.field`: record attribute holding the owning organization
//! - `update.tenant_field_policy`: `reject` (default) or `strip`
//! - `query.max_take`: upper bound applied to every `take`

use std::collections::HashMap;
use std::str::FromStr;

use crate::errors::{ScopeError, ScopeResult};

pub const DEFAULT_TENANT_FIELD: &str = "organizationId";

#[derive(Debug, Default, Clone)]
pub struct ScopeConfig {
    values: HashMap<String, String>,
}

impl ScopeConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overlay variables named `{prefix}SECTION__KEY` from the process
    /// environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Same as [`ScopeConfig::load_env`] over an explicit variable list.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }
}

/// What `update` does when `data` carries the tenant field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateTenantPolicy {
    /// Drop a value equal to the bound id; fail with `TenantMismatch` otherwise.
    #[default]
    Reject,
    /// Always drop the field.
    Strip,
}

impl FromStr for UpdateTenantPolicy {
    type Err = ScopeError;

    fn from_str(s: &str) -> ScopeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "strip" => Ok(Self::Strip),
            other => Err(ScopeError::InvalidConfig(format!(
                "update.tenant_field_policy must be `reject` or `strip`, got `{other}`"
            ))),
        }
    }
}

/// Typed settings shared by every accessor built from one factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSettings {
    pub tenant_field: String,
    pub update_policy: UpdateTenantPolicy,
    pub max_take: Option<usize>,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            tenant_field: DEFAULT_TENANT_FIELD.to_string(),
            update_policy: UpdateTenantPolicy::default(),
            max_take: None,
        }
    }
}

impl ScopeSettings {
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> ScopeResult<Self> {
        let mut settings = Self::default();

        if let Some(field) = snapshot.get("tenant.field") {
            let field = field.trim();
            if field.is_empty() {
                return Err(ScopeError::InvalidConfig(
                    "tenant.field must not be empty".into(),
                ));
            }
            settings.tenant_field = field.to_string();
        }

        if let Some(policy) = snapshot.get("update.tenant_field_policy") {
            settings.update_policy = policy.parse()?;
        }

        if let Some(raw) = snapshot.get("query.max_take") {
            let max = snapshot.get_usize("query.max_take").ok_or_else(|| {
                ScopeError::InvalidConfig(format!("query.max_take must be a number, got `{raw}`"))
            })?;
            settings.max_take = Some(max);
        }

        Ok(settings)
    }
}
