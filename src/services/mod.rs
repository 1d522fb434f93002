//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod clock;
pub mod event;
pub mod news;
pub mod registration;
pub mod user;

// Re-export commonly used services
pub use auth::{AuthService, AuthContext, Permission};
pub use clock::{Clock, SystemClock, FixedClock};
pub use event::{EventService, EventCard, EventParticipants};
pub use news::NewsService;
pub use registration::{RegistrationService, MyRegistration};
pub use user::UserService;

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::{DatabaseService, SystemStats};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub user_service: UserService,
    pub auth_service: AuthService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub news_service: NewsService,
    database: DatabaseService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized.
    ///
    /// Display and enforcement share the same `clock`.
    pub fn new(settings: Settings, database: DatabaseService, clock: Arc<dyn Clock>) -> Self {
        let auth_service = AuthService::new(&settings);
        let user_service = UserService::new(database.users.clone(), settings);
        let event_service = EventService::new(
            database.events.clone(),
            database.registrations.clone(),
            auth_service.clone(),
            clock.clone(),
        );
        let news_service = NewsService::new(database.news.clone(), auth_service.clone());
        let registration_service = RegistrationService::new(
            database.users.clone(),
            database.events.clone(),
            database.registrations.clone(),
            clock,
        );

        Self {
            user_service,
            auth_service,
            event_service,
            registration_service,
            news_service,
            database,
        }
    }

    /// Row counts for the admin panel
    pub async fn stats(&self, actor: i64) -> Result<SystemStats> {
        self.auth_service.require_admin(actor)?;
        self.database.get_system_stats().await
    }
}
