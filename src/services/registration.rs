//! Registration service implementation
//!
//! Enforces the registration policy against persisted state. The unique
//! `(user_id, event_id)` constraint settles concurrent attempts.

use std::sync::Arc;
use tracing::{info, debug, warn};
use crate::database::repositories::{UserRepository, EventRepository, RegistrationRepository};
use crate::models::registration::{Registration, RegisteredEvent};
use crate::models::user::User;
use crate::policy::{self, PolicyError, RegistrationDecision};
use crate::services::clock::Clock;
use crate::utils::errors::{RunRaceError, Result};
use crate::utils::logging::{log_registration_decision, log_user_action};

/// One of the user's registrations with its current decision
#[derive(Debug, Clone)]
pub struct MyRegistration {
    pub registration: RegisteredEvent,
    pub decision: RegistrationDecision,
}

#[derive(Clone)]
pub struct RegistrationService {
    users: UserRepository,
    events: EventRepository,
    registrations: RegistrationRepository,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    pub fn new(
        users: UserRepository,
        events: EventRepository,
        registrations: RegistrationRepository,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, events, registrations, clock }
    }

    async fn user(&self, telegram_id: i64) -> Result<User> {
        self.users
            .find_by_telegram_id(telegram_id)
            .await?
            .ok_or(RunRaceError::UserNotFound { user_id: telegram_id })
    }

    /// Register a user for an event if the policy allows it today
    pub async fn register(&self, telegram_id: i64, event_id: i64) -> Result<Registration> {
        let user = self.user(telegram_id).await?;
        if user.is_banned {
            warn!(user_id = user.id, event_id = event_id, "Banned user tried to register");
            return Err(RunRaceError::UserBanned { user_id: telegram_id });
        }

        let event = self.events.find_by_id(event_id).await?;
        let existing = self.registrations.find_for_pair(user.id, event_id).await?;
        let today = self.clock.today();

        if let Some(event) = &event {
            log_registration_decision(user.id, event_id, &event.decision(today));
        }

        let new_registration = policy::register_user(user.id, event.as_ref(), today, &existing)?;

        let registration = match self.registrations.insert(new_registration).await {
            Ok(registration) => registration,
            Err(RunRaceError::Database(sqlx::Error::Database(db_error))) if db_error.is_unique_violation() => {
                debug!(user_id = user.id, event_id = event_id, "Concurrent registration detected");
                return Err(PolicyError::AlreadyRegistered.into());
            }
            Err(e) => return Err(e),
        };

        info!(user_id = user.id, event_id = event_id, registration_id = registration.id, "User registered for event");
        log_user_action(telegram_id, "register", Some(&event_id.to_string()));

        Ok(registration)
    }

    /// Withdraw a user's registration; allowed on any date
    pub async fn unregister(&self, telegram_id: i64, event_id: i64) -> Result<()> {
        let user = self.user(telegram_id).await?;
        let existing = self.registrations.find_for_pair(user.id, event_id).await?;

        policy::unregister_user(user.id, event_id, &existing)?;

        if self.registrations.delete(user.id, event_id).await? == 0 {
            return Err(PolicyError::NotRegistered.into());
        }

        info!(user_id = user.id, event_id = event_id, "User unregistered from event");
        log_user_action(telegram_id, "unregister", Some(&event_id.to_string()));

        Ok(())
    }

    /// The user's registrations, soonest event first
    pub async fn my_registrations(&self, telegram_id: i64) -> Result<Vec<MyRegistration>> {
        let user = self.user(telegram_id).await?;
        let today = self.clock.today();

        let registrations = self.registrations.list_for_user(user.id).await?;
        Ok(registrations
            .into_iter()
            .map(|registration| MyRegistration {
                decision: registration.event.decision(today),
                registration,
            })
            .collect())
    }

    pub async fn is_registered(&self, telegram_id: i64, event_id: i64) -> Result<bool> {
        let Some(user) = self.users.find_by_telegram_id(telegram_id).await? else {
            return Ok(false);
        };
        let existing = self.registrations.find_for_pair(user.id, event_id).await?;
        Ok(!existing.is_empty())
    }
}
