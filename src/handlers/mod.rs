//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for wizard text input
//!
//! Rendering of event cards and error replies lives in [`render`].

pub mod commands;
pub mod callbacks;
pub mod messages;
pub mod render;

use std::sync::Arc;
use teloxide::types::User;
use crate::i18n::I18n;
use crate::middleware::RateLimitMiddleware;
use crate::services::ServiceFactory;
use crate::state::{ScenarioManager, StateStorage};
use crate::utils::errors::{RunRaceError, Result};

pub use commands::{Command, handle_command};
pub use callbacks::{CallbackAction, handle_callback_query};
pub use messages::handle_message;

/// Everything a handler needs, injected once into the dispatcher
#[derive(Clone)]
pub struct AppContext {
    pub services: Arc<ServiceFactory>,
    pub scenario_manager: Arc<ScenarioManager>,
    pub state_storage: Arc<StateStorage>,
    pub i18n: Arc<I18n>,
    pub rate_limiter: Arc<RateLimitMiddleware>,
}

impl AppContext {
    /// Reply language for `user`
    pub async fn language(&self, user: &User) -> Result<String> {
        user_language(&self.services, &self.i18n, user).await
    }
}

/// Telegram id of the sender as stored in the database
pub(crate) fn telegram_id(user: &User) -> i64 {
    user.id.0 as i64
}

pub(crate) fn require_sender(user: Option<&User>) -> Result<&User> {
    user.ok_or_else(|| RunRaceError::InvalidInput("No user in update".to_string()))
}

/// Language to reply in: the stored preference, else the Telegram client
/// locale, else the configured default
pub(crate) async fn user_language(
    services: &ServiceFactory,
    i18n: &I18n,
    user: &User,
) -> Result<String> {
    let stored = services.user_service.get_user_by_telegram_id(telegram_id(user)).await?;
    Ok(match stored {
        Some(user) => services.user_service.language_for(Some(&user)),
        None => i18n.detect_user_language(user.language_code.as_deref()),
    })
}

/// Tell the user about an expected failure; pass unexpected ones up
pub(crate) async fn report_error(
    bot: &teloxide::Bot,
    chat_id: teloxide::types::ChatId,
    i18n: &I18n,
    lang: &str,
    error: RunRaceError,
) -> Result<()> {
    use teloxide::prelude::Requester;

    if error.status_code() >= 500 {
        return Err(error);
    }

    tracing::debug!(error = %error, severity = %error.severity(), recoverable = error.is_recoverable(), "Reporting error to user");
    bot.send_message(chat_id, render::error_text(&error, i18n, lang)).await?;
    Ok(())
}
