//! Impersonation integration tests
//!
//! Resolver state persisted through a file-backed store and resolved into
//! session contexts.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::session_for;
    use community_hub::storage::{FileStore, KeyValueStore, MemoryStore};
    use community_hub::{Capability, Config, Hub, ImpersonationResolver, UserRole};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn file_resolver(dir: &TempDir) -> ImpersonationResolver {
        let store = FileStore::open(dir.path().join("session.json")).unwrap();
        ImpersonationResolver::with_default_key(Arc::new(store)).unwrap()
    }

    /// Override survives a restart
    #[test]
    fn test_override_persists_across_restarts() {
        let dir = TempDir::new().unwrap();

        let resolver = file_resolver(&dir);
        resolver.start_impersonation(UserRole::Caregiver).unwrap();
        drop(resolver);

        let resolver = file_resolver(&dir);
        assert_eq!(resolver.impersonated_role(), Some(UserRole::Caregiver));
        assert_eq!(
            resolver.effective_role(Some(UserRole::Admin)),
            Some(UserRole::Caregiver)
        );

        resolver.stop_impersonation().unwrap();
        let resolver = file_resolver(&dir);
        assert_eq!(resolver.impersonated_role(), None);
        assert_eq!(
            resolver.effective_role(Some(UserRole::Admin)),
            Some(UserRole::Admin)
        );
    }

    /// Only admin and owner are affected by the override
    #[test]
    fn test_override_scope_for_every_role() {
        let resolver =
            ImpersonationResolver::with_default_key(Arc::new(MemoryStore::new())).unwrap();
        resolver.start_impersonation(UserRole::Bestie).unwrap();

        for actual in UserRole::ALL {
            let effective = resolver.effective_role(Some(actual));
            if actual.can_impersonate() {
                assert_eq!(effective, Some(UserRole::Bestie));
            } else {
                assert_eq!(effective, Some(actual));
            }
        }
        assert_eq!(resolver.effective_role(None), None);
    }

    /// Stored garbage is treated as no override
    #[test]
    fn test_unparseable_stored_role_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        store.set("impersonatedRole", "superuser").unwrap();

        let resolver = ImpersonationResolver::with_default_key(store).unwrap();
        assert_eq!(resolver.impersonated_role(), None);
        assert_eq!(
            resolver.effective_role(Some(UserRole::Owner)),
            Some(UserRole::Owner)
        );
    }

    /// Capabilities follow the effective role
    #[test]
    fn test_impersonated_session_loses_admin_capabilities() {
        let store = Arc::new(MemoryStore::new());
        let hub = Hub::with_session_store(Config::default(), store).unwrap();

        assert!(hub.session(Some(UserRole::Admin)).has(Capability::ManageVendors));

        hub.resolver().start_impersonation(UserRole::Supporter).unwrap();
        let session = hub.session(Some(UserRole::Admin));
        assert!(session.impersonating);
        assert!(!session.has(Capability::ManageVendors));
        assert!(session.has(Capability::Donate));
        assert!(session.can_impersonate());

        let plain = session_for(UserRole::Supporter);
        assert!(!plain.impersonating);
        assert!(!plain.can_impersonate());
    }

    /// A custom storage key keeps separate state
    #[test]
    fn test_injected_storage_key() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let first = ImpersonationResolver::new(store.clone(), "hub.first").unwrap();
        let second = ImpersonationResolver::new(store.clone(), "hub.second").unwrap();

        first.start_impersonation(UserRole::Caregiver).unwrap();
        assert_eq!(second.impersonated_role(), None);
        assert_eq!(store.get("hub.first").unwrap().as_deref(), Some("caregiver"));
    }
}
