//! Authentication service implementation
//!
//! Administrators are the telegram ids listed in `bot.admin_ids`. Everyone
//! else is a regular member who can browse and register for races.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::config::settings::Settings;
use crate::utils::errors::{RunRaceError, Result};

/// Permission levels for different operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Browse events and manage own registrations
    Member,
    /// Create, edit and delete events, view participants
    Admin,
}

/// Authentication context for a user
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub telegram_id: i64,
    pub permissions: HashSet<Permission>,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.permissions.contains(&Permission::Admin)
    }
}

/// Authentication service for managing permissions and access control
#[derive(Clone)]
pub struct AuthService {
    admin_ids: Arc<HashSet<i64>>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(settings: &Settings) -> Self {
        Self {
            admin_ids: Arc::new(settings.bot.admin_ids.iter().copied().collect()),
        }
    }

    /// Check if user is an administrator
    pub fn is_admin(&self, telegram_id: i64) -> bool {
        self.admin_ids.contains(&telegram_id)
    }

    /// Get authentication context for a user
    pub fn get_auth_context(&self, telegram_id: i64) -> AuthContext {
        let mut permissions = HashSet::from([Permission::Member]);
        if self.is_admin(telegram_id) {
            permissions.insert(Permission::Admin);
        }

        debug!(telegram_id = telegram_id, permissions = ?permissions, "Authentication context created");
        AuthContext { telegram_id, permissions }
    }

    /// Require administrator rights or return error
    pub fn require_admin(&self, telegram_id: i64) -> Result<AuthContext> {
        let context = self.get_auth_context(telegram_id);

        if !context.is_admin() {
            warn!(telegram_id = telegram_id, "Admin action denied");
            return Err(RunRaceError::PermissionDenied(
                format!("User {} is not an administrator", telegram_id)
            ));
        }

        Ok(context)
    }

    /// Get all admin user IDs
    pub fn admin_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.admin_ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn auth_service() -> AuthService {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![987654321, 123456789];
        AuthService::new(&settings)
    }

    #[test]
    fn test_admin_check() {
        let auth_service = auth_service();

        assert!(auth_service.is_admin(123456789));
        assert!(auth_service.is_admin(987654321));
        assert!(!auth_service.is_admin(111111111));
        assert_eq!(auth_service.admin_ids(), vec![123456789, 987654321]);
    }

    #[test]
    fn test_auth_context_creation() {
        let auth_service = auth_service();

        let context = auth_service.get_auth_context(123456789);
        assert!(context.is_admin());
        assert!(context.permissions.contains(&Permission::Member));

        let context = auth_service.get_auth_context(111111111);
        assert!(!context.is_admin());
        assert!(context.permissions.contains(&Permission::Member));
    }

    #[test]
    fn test_require_admin() {
        let auth_service = auth_service();

        assert!(auth_service.require_admin(123456789).is_ok());
        assert_matches!(
            auth_service.require_admin(111111111),
            Err(RunRaceError::PermissionDenied(_))
        );
    }
}
