//! Effective role resolution

use super::session::SessionContext;
use crate::auth::roles::UserRole;
use crate::storage::local::KeyValueStore;
use crate::utils::error::Result;
use parking_lot::RwLock;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key used when none is configured
pub const DEFAULT_IMPERSONATION_KEY: &str = "impersonatedRole";

/// Resolves the effective role from the actual role and the stored override
pub struct ImpersonationResolver {
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    override_role: RwLock<Option<UserRole>>,
}

impl ImpersonationResolver {
    /// Create a resolver and load any persisted override
    ///
    /// A persisted value that is not a known role is ignored.
    pub fn new(store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Result<Self> {
        let storage_key = storage_key.into();

        let override_role = match store.get(&storage_key)? {
            Some(raw) => match UserRole::from_str(&raw) {
                Ok(role) => Some(role),
                Err(e) => {
                    warn!("Ignoring persisted impersonation under '{}': {}", storage_key, e);
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            store,
            storage_key,
            override_role: RwLock::new(override_role),
        })
    }

    /// Resolver using [`DEFAULT_IMPERSONATION_KEY`]
    pub fn with_default_key(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        Self::new(store, DEFAULT_IMPERSONATION_KEY)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Set and persist the override
    pub fn start_impersonation(&self, role: UserRole) -> Result<()> {
        let mut current = self.override_role.write();
        self.store.set(&self.storage_key, role.as_str())?;
        *current = Some(role);
        info!("Impersonating role {}", role);
        Ok(())
    }

    /// Clear the override and its persisted entry
    pub fn stop_impersonation(&self) -> Result<()> {
        let mut current = self.override_role.write();
        self.store.remove(&self.storage_key)?;
        if let Some(previous) = current.take() {
            info!("Stopped impersonating role {}", previous);
        }
        Ok(())
    }

    /// The stored override, whether or not it currently applies
    pub fn impersonated_role(&self) -> Option<UserRole> {
        *self.override_role.read()
    }

    /// Role used for permission checks
    ///
    /// The override wins only when `actual_role` is admin or owner.
    pub fn effective_role(&self, actual_role: Option<UserRole>) -> Option<UserRole> {
        let actual = actual_role?;
        if !actual.can_impersonate() {
            return Some(actual);
        }
        Some(self.impersonated_role().unwrap_or(actual))
    }

    /// Whether the override applies to `actual_role`
    pub fn is_impersonating(&self, actual_role: Option<UserRole>) -> bool {
        actual_role.is_some_and(|r| r.can_impersonate()) && self.impersonated_role().is_some()
    }

    /// Snapshot of the resolution for one request
    pub fn session(&self, actual_role: Option<UserRole>) -> SessionContext {
        SessionContext {
            actual_role,
            effective_role: self.effective_role(actual_role),
            impersonating: self.is_impersonating(actual_role),
        }
    }
}

impl std::fmt::Debug for ImpersonationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpersonationResolver")
            .field("storage_key", &self.storage_key)
            .field("override_role", &self.impersonated_role())
            .finish()
    }
}
