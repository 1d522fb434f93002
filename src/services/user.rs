//! User service implementation
//!
//! This service handles user registration and language preferences.

use tracing::{info, warn, debug};
use crate::config::settings::Settings;
use crate::database::repositories::UserRepository;
use crate::models::user::{User, CreateUserRequest, UpdateUserRequest};
use crate::utils::errors::{RunRaceError, Result};

/// User service for managing user operations
#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
    settings: Settings,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(user_repository: UserRepository, settings: Settings) -> Self {
        Self {
            user_repository,
            settings,
        }
    }

    /// Register a new user or get existing user
    pub async fn register_or_get_user(&self, telegram_id: i64, username: Option<String>, first_name: Option<String>, last_name: Option<String>) -> Result<User> {
        debug!(telegram_id = telegram_id, "Attempting to register or get user");

        if let Some(existing_user) = self.user_repository.find_by_telegram_id(telegram_id).await? {
            debug!(user_id = existing_user.id, telegram_id = telegram_id, "User already exists");
            return Ok(existing_user);
        }

        let create_request = CreateUserRequest {
            telegram_id,
            username,
            first_name,
            last_name,
            language_code: Some(self.settings.i18n.default_language.clone()),
        };

        let user = self.user_repository.create(create_request).await?;
        info!(user_id = user.id, telegram_id = telegram_id, "New user registered successfully");

        Ok(user)
    }

    /// Get user by Telegram ID
    pub async fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        debug!(telegram_id = telegram_id, "Getting user by Telegram ID");
        self.user_repository.find_by_telegram_id(telegram_id).await
    }

    /// Get user by Telegram ID or fail
    pub async fn require_user(&self, telegram_id: i64) -> Result<User> {
        self.user_repository.find_by_telegram_id(telegram_id).await?
            .ok_or(RunRaceError::UserNotFound { user_id: telegram_id })
    }

    /// Set user language preference
    pub async fn set_language_preference(&self, telegram_id: i64, language_code: String) -> Result<User> {
        debug!(telegram_id = telegram_id, language_code = %language_code, "Setting user language preference");

        if !self.settings.i18n.supported_languages.contains(&language_code) {
            warn!(telegram_id = telegram_id, language_code = %language_code, "Unsupported language code");
            return Err(RunRaceError::InvalidInput(format!("Unsupported language: {}", language_code)));
        }

        let existing_user = self.require_user(telegram_id).await?;

        let update_request = UpdateUserRequest {
            language_code: Some(language_code.clone()),
            ..Default::default()
        };

        let user = self.user_repository.update(existing_user.id, update_request).await?;
        info!(telegram_id = telegram_id, user_id = existing_user.id, language_code = %language_code, "User language preference updated");

        Ok(user)
    }

    /// Language to address the user in, falling back to the configured default
    pub fn language_for(&self, user: Option<&User>) -> String {
        user.map(|u| u.language_code.clone())
            .filter(|code| self.settings.i18n.supported_languages.contains(code))
            .unwrap_or_else(|| self.settings.i18n.default_language.clone())
    }
}
