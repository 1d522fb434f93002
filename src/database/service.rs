//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{DatabasePool, UserRepository, EventRepository, RegistrationRepository, NewsRepository};
use crate::utils::errors::RunRaceError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub news: NewsRepository,
}

/// Row counts shown on the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SystemStats {
    pub users: i64,
    pub events: i64,
    pub registrations: i64,
    pub news: i64,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            news: NewsRepository::new(pool),
        }
    }

    /// Get system statistics
    pub async fn get_system_stats(&self) -> Result<SystemStats, RunRaceError> {
        Ok(SystemStats {
            users: self.users.count().await?,
            events: self.events.count().await?,
            registrations: self.registrations.count().await?,
            news: self.news.count().await?,
        })
    }
}
