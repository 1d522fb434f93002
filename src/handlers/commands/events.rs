//! Event browsing and registration handlers

use std::collections::HashMap;
use std::str::FromStr;
use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton, ChatId, ParseMode, User}, prelude::*};
use tracing::{info, debug};
use crate::utils::errors::{RunRaceError, Result};
use crate::handlers::{AppContext, render, report_error, require_sender, telegram_id};
use crate::models::event::{EventStatus, EventSummary};

/// Most events listed in one message; long names may cut the list shorter
const MAX_LISTED_EVENTS: usize = 30;

/// Which events a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    All,
    /// Registration currently possible
    Open,
    /// By administrator-set status
    Stored(EventStatus),
}

impl EventFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventFilter::All => "all",
            EventFilter::Open => "open",
            EventFilter::Stored(status) => status.as_str(),
        }
    }
}

impl FromStr for EventFilter {
    type Err = RunRaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(EventFilter::All),
            "open" => Ok(EventFilter::Open),
            other => other.parse::<EventStatus>().map(EventFilter::Stored),
        }
    }
}

/// Handle /events command
pub async fn handle_events_list(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let lang = ctx.language(user).await?;

    debug!(user_id = telegram_id(user), "Processing /events command");
    show_event_list(bot, msg.chat.id, EventFilter::All, &ctx, &lang).await
}

/// Send the event listing for a filter
pub async fn show_event_list(
    bot: Bot,
    chat_id: ChatId,
    filter: EventFilter,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let events = fetch_events(filter, ctx).await?;
    let today = ctx.services.event_service.today();

    let mut params = HashMap::new();
    params.insert("filter".to_string(), ctx.i18n.t(&format!("events.filters.{}", filter.as_str()), lang, None));
    let mut text = ctx.i18n.t("commands.events.list_title", lang, Some(&params));

    let mut rows = vec![render::filter_keyboard_row(&ctx.i18n, lang)];

    if events.is_empty() {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.t("commands.events.empty", lang, None));
    }

    let mut shown = 0;
    for summary in events.iter().take(MAX_LISTED_EVENTS) {
        let decision = summary.event.decision(today);
        let line = render::event_list_line(summary, &decision, &ctx.i18n, lang);
        if !render::push_within_limit(&mut text, &line, render::LISTING_TEXT_LIMIT) {
            break;
        }
        rows.push(vec![render::event_button(summary, &decision, "event")]);
        shown += 1;
    }
    push_more_note(&mut text, events.len() - shown, ctx, lang);

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;

    Ok(())
}

/// "…and N more" after a truncated listing
pub(crate) fn push_more_note(text: &mut String, hidden: usize, ctx: &AppContext, lang: &str) {
    if hidden > 0 {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.tp("commands.events.more", lang, hidden as i64, None));
    }
}

async fn fetch_events(filter: EventFilter, ctx: &AppContext) -> Result<Vec<EventSummary>> {
    let event_service = &ctx.services.event_service;
    match filter {
        EventFilter::All => event_service.list_events(None).await,
        EventFilter::Open => event_service.list_open_for_registration().await,
        EventFilter::Stored(status) => event_service.list_events(Some(status)).await,
    }
}

/// Send the detail card with register or withdraw button
pub async fn show_event_card(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let card = match ctx.services.event_service.event_card(event_id).await {
        Ok(card) => card,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, lang, e).await,
    };
    let is_registered = ctx.services.registration_service.is_registered(telegram_id(user), event_id).await?;

    let mut text = render::event_card_text(&card, &ctx.i18n, lang, false);
    if is_registered {
        text.push_str("\n\n");
        text.push_str(&crate::utils::helpers::escape_markdown(
            &ctx.i18n.t("events.card.you_are_registered", lang, None),
        ));
    }

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(render::registration_keyboard(&card, is_registered, &ctx.i18n, lang))
        .await?;

    Ok(())
}

/// Handle /myevents command
pub async fn handle_my_events(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let lang = ctx.language(user).await?;
    let chat_id = msg.chat.id;

    let registrations = match ctx.services.registration_service.my_registrations(telegram_id(user)).await {
        Ok(registrations) => registrations,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    if registrations.is_empty() {
        bot.send_message(chat_id, ctx.i18n.t("commands.my_events.empty", &lang, None)).await?;
        return Ok(());
    }

    let mut text = ctx.i18n.t("commands.my_events.title", &lang, None);
    let mut rows = Vec::new();
    for item in registrations.iter().take(MAX_LISTED_EVENTS) {
        let line = render::my_registration_line(item, &ctx.i18n, &lang);
        if !render::push_within_limit(&mut text, &line, render::LISTING_TEXT_LIMIT) {
            break;
        }

        let event = &item.registration.event;
        rows.push(vec![InlineKeyboardButton::callback(
            format!("{} {}", render::status_badge(item.decision.effective_status), event.name),
            format!("event:{}", event.id),
        )]);
    }
    push_more_note(&mut text, registrations.len() - rows.len(), &ctx, &lang);

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;

    Ok(())
}

/// Handle `event_register:<id>`
pub async fn handle_event_register_callback(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let user_id = telegram_id(user);
    let lang = ctx.language(user).await?;

    let result = match ctx.rate_limiter.check(user_id) {
        Ok(()) => register(user, event_id, &ctx).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(event_name) => {
            let mut params = HashMap::new();
            params.insert("event_name".to_string(), event_name);
            bot.send_message(chat_id, ctx.i18n.t("commands.events.register_success", &lang, Some(&params))).await?;
            info!(user_id = user_id, event_id = event_id, "Registration confirmed to user");
            show_event_card(bot, chat_id, user, event_id, &ctx, &lang).await
        }
        Err(e) => report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    }
}

async fn register(user: &User, event_id: i64, ctx: &AppContext) -> Result<String> {
    let user_id = telegram_id(user);

    // A member may tap register before ever sending /start
    ctx.services.user_service.register_or_get_user(
        user_id,
        user.username.clone(),
        Some(user.first_name.clone()),
        user.last_name.clone(),
    ).await?;

    ctx.services.registration_service.register(user_id, event_id).await?;
    let event = ctx.services.event_service.get_event(event_id).await?;
    Ok(event.event.name)
}

/// Handle `event_unregister:<id>`
pub async fn handle_event_unregister_callback(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    event_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let user_id = telegram_id(user);
    let lang = ctx.language(user).await?;

    let result = match ctx.rate_limiter.check(user_id) {
        Ok(()) => ctx.services.registration_service.unregister(user_id, event_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            bot.send_message(chat_id, ctx.i18n.t("commands.events.unregister_success", &lang, None)).await?;
            show_event_card(bot, chat_id, user, event_id, &ctx, &lang).await
        }
        Err(e) => report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_filter_parsing() {
        assert_eq!("all".parse::<EventFilter>().unwrap(), EventFilter::All);
        assert_eq!("open".parse::<EventFilter>().unwrap(), EventFilter::Open);
        assert_eq!(
            "completed".parse::<EventFilter>().unwrap(),
            EventFilter::Stored(EventStatus::Completed)
        );
        assert!("closed".parse::<EventFilter>().is_err());
    }

    #[test]
    fn test_event_filter_round_trips_through_callback_text() {
        for filter in [EventFilter::All, EventFilter::Open, EventFilter::Stored(EventStatus::Ongoing)] {
            assert_eq!(filter.as_str().parse::<EventFilter>().unwrap(), filter);
        }
    }
}
