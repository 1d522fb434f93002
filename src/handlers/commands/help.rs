//! Help command handler

use teloxide::{Bot, types::Message, prelude::*};
use crate::utils::errors::Result;
use crate::handlers::{AppContext, require_sender, telegram_id};

/// Handle /help command
pub async fn handle_help(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let lang = ctx.language(user).await?;

    let mut text = ctx.i18n.t("commands.help.member", &lang, None);
    if ctx.services.auth_service.is_admin(telegram_id(user)) {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.t("commands.help.admin", &lang, None));
    }

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
