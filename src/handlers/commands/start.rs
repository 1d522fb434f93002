//! Start command handler
//!
//! Registers the Telegram user on first contact and lets them pick a language.

use std::collections::HashMap;
use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton, ChatId, User}, prelude::*};
use tracing::{info, debug};
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;
use crate::handlers::{AppContext, require_sender, telegram_id};

/// Handle /start command
pub async fn handle_start(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let user_id = telegram_id(user);
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, chat_id = ?chat_id, "Processing /start command");

    let is_new = ctx.services.user_service.get_user_by_telegram_id(user_id).await?.is_none();
    let mut stored = ctx.services.user_service.register_or_get_user(
        user_id,
        user.username.clone(),
        Some(user.first_name.clone()),
        user.last_name.clone(),
    ).await?;

    if is_new {
        let detected = ctx.i18n.detect_user_language(user.language_code.as_deref());
        if detected != stored.language_code {
            stored = ctx.services.user_service.set_language_preference(user_id, detected).await?;
        }
        info!(user_id = user_id, language = %stored.language_code, "New user started bot");
        log_user_action(user_id, "start", Some("new_user"));
    }

    let lang = ctx.services.user_service.language_for(Some(&stored));
    let mut params = HashMap::new();
    params.insert("name".to_string(), display_name(user));

    let key = if is_new { "commands.start.welcome" } else { "commands.start.returning_user" };
    let text = format!(
        "{}\n\n{}",
        ctx.i18n.t(key, &lang, Some(&params)),
        ctx.i18n.t("commands.start.choose_language", &lang, None)
    );

    bot.send_message(chat_id, text)
        .reply_markup(language_keyboard(&ctx, &lang))
        .await?;

    Ok(())
}

fn display_name(user: &User) -> String {
    if user.first_name.is_empty() {
        user.username.clone().unwrap_or_else(|| "runner".to_string())
    } else {
        user.first_name.clone()
    }
}

fn language_keyboard(ctx: &AppContext, lang: &str) -> InlineKeyboardMarkup {
    let buttons = ctx.i18n
        .supported_languages()
        .iter()
        .map(|code| {
            InlineKeyboardButton::callback(
                ctx.i18n.t(&format!("buttons.language.{}", code), lang, None),
                format!("lang:{}", code),
            )
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(vec![buttons])
}

/// Handle `lang:<code>`
pub async fn handle_language_callback(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    language_code: String,
    ctx: AppContext,
) -> Result<()> {
    let user_id = telegram_id(user);

    ctx.services.user_service.register_or_get_user(
        user_id,
        user.username.clone(),
        Some(user.first_name.clone()),
        user.last_name.clone(),
    ).await?;
    let updated = ctx.services.user_service.set_language_preference(user_id, language_code).await?;

    let text = ctx.i18n.t("commands.start.language_set", &updated.language_code, None);
    bot.send_message(chat_id, text).await?;

    log_user_action(user_id, "set_language", Some(&updated.language_code));
    Ok(())
}
