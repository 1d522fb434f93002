//! Admin command handlers
//!
//! Race calendar management: the admin panel, per-event actions and the
//! entry points of the creation, edit and reschedule wizards.

use std::collections::HashMap;
use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton, ChatId, ParseMode, User}, prelude::*};
use tracing::{info, debug};
use crate::utils::errors::Result;
use crate::utils::helpers::{format_event_date, format_timestamp};
use crate::handlers::{AppContext, render, report_error, require_sender, telegram_id};
use crate::handlers::commands::{events::push_more_note, news};
use crate::handlers::messages::send_step_prompt;
use crate::models::event::EventStatus;
use crate::state::{ConversationContext, scenarios::{self, steps}, context::keys};

/// Admin panel menu entries, `admin:<entry>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminMenu {
    Events,
    NewEvent,
    News,
    NewNews,
    Stats,
    Back,
}

impl std::str::FromStr for AdminMenu {
    type Err = crate::utils::errors::RunRaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "events" => Ok(AdminMenu::Events),
            "new_event" => Ok(AdminMenu::NewEvent),
            "news" => Ok(AdminMenu::News),
            "new_news" => Ok(AdminMenu::NewNews),
            "stats" => Ok(AdminMenu::Stats),
            "back" => Ok(AdminMenu::Back),
            other => Err(crate::utils::errors::RunRaceError::InvalidInput(
                format!("Unknown admin menu entry: {}", other)
            )),
        }
    }
}

/// Event fields an admin can edit in place, `admin_edit:<id>:<field>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Name,
    Location,
    Category,
    Banner,
}

impl EventField {
    pub const ALL: [EventField; 4] = [EventField::Name, EventField::Location, EventField::Category, EventField::Banner];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::Name => "name",
            EventField::Location => "location",
            EventField::Category => "category",
            EventField::Banner => "banner",
        }
    }

    /// Edit wizard step answering this field
    pub fn step(&self) -> &'static str {
        match self {
            EventField::Name => steps::NAME_INPUT,
            EventField::Location => steps::LOCATION_INPUT,
            EventField::Category => steps::CATEGORY_INPUT,
            EventField::Banner => steps::BANNER_INPUT,
        }
    }
}

impl std::str::FromStr for EventField {
    type Err = crate::utils::errors::RunRaceError;

    fn from_str(s: &str) -> Result<Self> {
        EventField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| crate::utils::errors::RunRaceError::InvalidInput(format!("Unknown event field: {}", s)))
    }
}

/// Resolve the reply language, or tell a non-admin they are not allowed
pub(crate) async fn authorize(bot: &Bot, chat_id: ChatId, user: &User, ctx: &AppContext) -> Result<Option<String>> {
    let lang = ctx.language(user).await?;
    match ctx.services.auth_service.require_admin(telegram_id(user)) {
        Ok(_) => Ok(Some(lang)),
        Err(e) => {
            report_error(bot, chat_id, &ctx.i18n, &lang, e).await?;
            Ok(None)
        }
    }
}

/// Handle /admin command
pub async fn handle_admin_panel(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let chat_id = msg.chat.id;

    debug!(user_id = telegram_id(user), chat_id = ?chat_id, "Processing /admin command");

    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    show_admin_menu(bot, chat_id, &ctx, &lang).await
}

async fn show_admin_menu(bot: Bot, chat_id: ChatId, ctx: &AppContext, lang: &str) -> Result<()> {
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.events", lang, None), "admin:events"),
            InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.new_event", lang, None), "admin:new_event"),
        ],
        vec![
            InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.news", lang, None), "admin:news"),
            InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.new_news", lang, None), "admin:new_news"),
        ],
        vec![
            InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.stats", lang, None), "admin:stats"),
        ],
    ]);

    bot.send_message(chat_id, ctx.i18n.t("admin.panel_title", lang, None))
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle `admin:<entry>`
pub async fn handle_admin_callback(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    entry: AdminMenu,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    match entry {
        AdminMenu::Events => show_admin_events(bot, chat_id, &ctx, &lang).await,
        AdminMenu::NewEvent => start_event_creation(bot, chat_id, user, &ctx, &lang).await,
        AdminMenu::News => news::show_admin_news_list(bot, chat_id, &ctx, &lang).await,
        AdminMenu::NewNews => news::start_news_creation(bot, chat_id, user, &ctx, &lang).await,
        AdminMenu::Stats => show_stats(bot, chat_id, user, &ctx, &lang).await,
        AdminMenu::Back => show_admin_menu(bot, chat_id, &ctx, &lang).await,
    }
}

async fn show_admin_events(bot: Bot, chat_id: ChatId, ctx: &AppContext, lang: &str) -> Result<()> {
    let events = ctx.services.event_service.list_events(None).await?;
    let today = ctx.services.event_service.today();

    let mut rows = Vec::new();
    for summary in &events {
        rows.push(vec![render::event_button(summary, &summary.event.decision(today), "admin_event")]);
    }
    rows.push(vec![
        InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.new_event", lang, None), "admin:new_event"),
        InlineKeyboardButton::callback(ctx.i18n.t("buttons.navigation.back", lang, None), "admin:back"),
    ]);

    let key = if events.is_empty() { "admin.events.empty" } else { "admin.events.title" };
    bot.send_message(chat_id, ctx.i18n.t(key, lang, None))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;

    Ok(())
}

/// Handle `admin_event:<id>`
pub async fn show_admin_event(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    send_admin_card(bot, chat_id, event_id, &ctx, &lang).await
}

pub(crate) async fn send_admin_card(bot: Bot, chat_id: ChatId, event_id: i64, ctx: &AppContext, lang: &str) -> Result<()> {
    let card = match ctx.services.event_service.event_card(event_id).await {
        Ok(card) => card,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, lang, e).await,
    };

    bot.send_message(chat_id, render::event_card_text(&card, &ctx.i18n, lang, true))
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(admin_event_keyboard(event_id, ctx, lang))
        .await?;

    Ok(())
}

fn admin_event_keyboard(event_id: i64, ctx: &AppContext, lang: &str) -> InlineKeyboardMarkup {
    let status_row = EventStatus::ALL
        .iter()
        .map(|status| {
            InlineKeyboardButton::callback(
                ctx.i18n.t(&format!("admin.status.{}", status), lang, None),
                format!("admin_status:{}:{}", event_id, status),
            )
        })
        .collect::<Vec<_>>();

    let fields = EventField::ALL;
    let edit_rows = fields
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|field| {
                    InlineKeyboardButton::callback(
                        ctx.i18n.t(&format!("buttons.admin.edit.{}", field.as_str()), lang, None),
                        format!("admin_edit:{}:{}", event_id, field.as_str()),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut rows = vec![status_row];
    rows.extend(edit_rows);
    rows.extend([
        vec![
            InlineKeyboardButton::callback(
                ctx.i18n.t("buttons.admin.reschedule", lang, None),
                format!("admin_reschedule:{}", event_id),
            ),
            InlineKeyboardButton::callback(
                ctx.i18n.t("buttons.admin.participants", lang, None),
                format!("admin_participants:{}", event_id),
            ),
        ],
        vec![
            InlineKeyboardButton::callback(
                ctx.i18n.t("buttons.admin.delete", lang, None),
                format!("admin_delete:{}", event_id),
            ),
            InlineKeyboardButton::callback(ctx.i18n.t("buttons.navigation.back", lang, None), "admin:events"),
        ],
    ]);

    InlineKeyboardMarkup::new(rows)
}

/// Handle `admin_status:<id>:<status>`
pub async fn handle_set_status(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    status: EventStatus,
    ctx: AppContext,
) -> Result<()> {
    let lang = ctx.language(user).await?;

    match ctx.services.event_service.set_status(telegram_id(user), event_id, status).await {
        Ok(_) => {
            let mut params = HashMap::new();
            params.insert("status".to_string(), ctx.i18n.t(&format!("admin.status.{}", status), &lang, None));
            bot.send_message(chat_id, ctx.i18n.t("admin.event.status_updated", &lang, Some(&params))).await?;
            send_admin_card(bot, chat_id, event_id, &ctx, &lang).await
        }
        Err(e) => report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    }
}

/// Handle `admin_reschedule:<id>`: ask for the new date
pub async fn start_reschedule(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    let event = match ctx.services.event_service.get_event(event_id).await {
        Ok(summary) => summary.event,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    let mut context = ConversationContext::new(telegram_id(user));
    ctx.scenario_manager.start_scenario(&mut context, scenarios::EVENT_RESCHEDULE, ctx.state_storage.default_ttl())?;
    context.set_data(keys::EVENT_ID, event_id)?;
    context.set_data(keys::NAME, &event.name)?;
    ctx.state_storage.save_context(&context).await?;

    let mut params = HashMap::new();
    params.insert("name".to_string(), event.name.clone());
    params.insert("date".to_string(), format_event_date(event.event_date));
    bot.send_message(chat_id, ctx.i18n.t("wizard.prompt.reschedule_date", &lang, Some(&params))).await?;

    info!(user_id = telegram_id(user), event_id = event_id, "Reschedule wizard started");
    Ok(())
}

/// Handle `admin_edit:<id>:<field>`: ask for the new value
pub async fn start_event_edit(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    field: EventField,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    let event = match ctx.services.event_service.get_event(event_id).await {
        Ok(summary) => summary.event,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    let mut context = ConversationContext::new(telegram_id(user));
    ctx.scenario_manager.start_scenario(&mut context, scenarios::EVENT_EDIT, ctx.state_storage.default_ttl())?;
    ctx.scenario_manager.next_step(&mut context, field.step())?;
    context.set_data(keys::EVENT_ID, event_id)?;
    context.set_data(keys::NAME, &event.name)?;
    ctx.state_storage.save_context(&context).await?;

    info!(user_id = telegram_id(user), event_id = event_id, field = field.as_str(), "Event edit wizard started");
    send_step_prompt(&bot, chat_id, &context, &ctx, &lang).await
}

/// Handle `admin_delete:<id>`: ask for confirmation
pub async fn confirm_delete(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    let summary = match ctx.services.event_service.get_event(event_id).await {
        Ok(summary) => summary,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    let mut params = HashMap::new();
    params.insert("name".to_string(), summary.event.name.clone());
    params.insert("count".to_string(), summary.registration_count.to_string());

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            ctx.i18n.t("buttons.admin.delete_confirm", &lang, None),
            format!("admin_delete_confirm:{}", event_id),
        ),
        InlineKeyboardButton::callback(
            ctx.i18n.t("buttons.navigation.back", &lang, None),
            format!("admin_event:{}", event_id),
        ),
    ]]);

    bot.send_message(chat_id, ctx.i18n.t("admin.event.delete_prompt", &lang, Some(&params)))
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle `admin_delete_confirm:<id>`
pub async fn handle_delete(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let lang = ctx.language(user).await?;

    match ctx.services.event_service.delete_event(telegram_id(user), event_id).await {
        Ok(()) => {
            bot.send_message(chat_id, ctx.i18n.t("admin.event.deleted", &lang, None)).await?;
            show_admin_events(bot, chat_id, &ctx, &lang).await
        }
        Err(e) => report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    }
}

/// Handle `admin_participants:<id>`
pub async fn show_participants(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let lang = ctx.language(user).await?;

    let roster = match ctx.services.event_service.participants(telegram_id(user), event_id).await {
        Ok(roster) => roster,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    let mut params = HashMap::new();
    params.insert("name".to_string(), roster.event.event.name.clone());
    let mut text = ctx.i18n.t("admin.participants.title", &lang, Some(&params));
    text.push('\n');
    text.push_str(&ctx.i18n.tp("events.registration_count", &lang, roster.participants.len() as i64, None));

    if roster.participants.is_empty() {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.t("admin.participants.empty", &lang, None));
    }

    let mut shown = 0;
    for (index, participant) in roster.participants.iter().enumerate() {
        let line = format!(
            "\n{}. {} · {}",
            index + 1,
            participant.display_name(),
            format_timestamp(participant.registered_at),
        );
        if text.chars().count() + line.chars().count() > render::LISTING_TEXT_LIMIT {
            break;
        }
        text.push_str(&line);
        shown += 1;
    }
    push_more_note(&mut text, roster.participants.len() - shown, &ctx, &lang);

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        ctx.i18n.t("buttons.navigation.back", &lang, None),
        format!("admin_event:{}", event_id),
    )]]);

    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}

async fn show_stats(bot: Bot, chat_id: ChatId, user: &User, ctx: &AppContext, lang: &str) -> Result<()> {
    let stats = match ctx.services.stats(telegram_id(user)).await {
        Ok(stats) => stats,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, lang, e).await,
    };

    let mut params = HashMap::new();
    params.insert("users".to_string(), stats.users.to_string());
    params.insert("events".to_string(), stats.events.to_string());
    params.insert("registrations".to_string(), stats.registrations.to_string());
    params.insert("news".to_string(), stats.news.to_string());

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        ctx.i18n.t("buttons.navigation.back", lang, None),
        "admin:back",
    )]]);

    bot.send_message(chat_id, ctx.i18n.t("admin.stats", lang, Some(&params)))
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle /newevent command
pub async fn handle_new_event(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let chat_id = msg.chat.id;

    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    start_event_creation(bot, chat_id, user, &ctx, &lang).await
}

async fn start_event_creation(bot: Bot, chat_id: ChatId, user: &User, ctx: &AppContext, lang: &str) -> Result<()> {
    let mut context = ConversationContext::new(telegram_id(user));
    ctx.scenario_manager.start_scenario(&mut context, scenarios::EVENT_CREATION, ctx.state_storage.default_ttl())?;
    ctx.state_storage.save_context(&context).await?;

    info!(user_id = telegram_id(user), "Event creation wizard started");
    send_step_prompt(&bot, chat_id, &context, ctx, lang).await
}

/// Handle /cancel command
pub async fn handle_cancel(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let lang = ctx.language(user).await?;

    let key = match ctx.state_storage.load_context(telegram_id(user)).await? {
        Some(context) if context.is_active() => {
            ctx.state_storage.delete_context(telegram_id(user)).await?;
            "wizard.cancelled"
        }
        _ => "wizard.nothing_to_cancel",
    };

    bot.send_message(msg.chat.id, ctx.i18n.t(key, &lang, None)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_menu_parsing() {
        assert_eq!("events".parse::<AdminMenu>().unwrap(), AdminMenu::Events);
        assert_eq!("new_event".parse::<AdminMenu>().unwrap(), AdminMenu::NewEvent);
        assert_eq!("back".parse::<AdminMenu>().unwrap(), AdminMenu::Back);
        assert_eq!("new_news".parse::<AdminMenu>().unwrap(), AdminMenu::NewNews);
        assert!("users".parse::<AdminMenu>().is_err());
    }

    #[test]
    fn test_event_field_parsing() {
        for field in EventField::ALL {
            assert_eq!(field.as_str().parse::<EventField>().unwrap(), field);
        }
        assert_eq!(EventField::Banner.step(), steps::BANNER_INPUT);
        assert!("date".parse::<EventField>().is_err());
    }
}
