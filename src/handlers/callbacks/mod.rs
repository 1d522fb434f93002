//! Callback query handlers module
//!
//! Inline keyboard data is `action:arg[:arg]`. It is parsed once into a
//! [`CallbackAction`] and routed to the owning handler.

use std::str::FromStr;
use teloxide::{Bot, types::{CallbackQuery, ChatId}, prelude::*};
use tracing::{debug, warn};
use crate::utils::errors::{RunRaceError, Result};
use crate::handlers::AppContext;
use crate::handlers::commands::{start, events, admin, news};
use crate::handlers::commands::admin::{AdminMenu, EventField};
use crate::handlers::commands::events::EventFilter;
use crate::handlers::commands::news::NewsField;
use crate::handlers::messages::{self, WizardAction};
use crate::models::event::EventStatus;

/// Parsed inline keyboard callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `events:<filter>`
    ListEvents(EventFilter),
    /// `event:<id>`
    ShowEvent(i64),
    Register(i64),
    Unregister(i64),
    /// `news_list`
    ListNews,
    /// `news:<id>`
    ShowNews(i64),
    /// `lang:<code>`
    SetLanguage(String),
    Admin(AdminMenu),
    AdminEvent(i64),
    AdminSetStatus(i64, EventStatus),
    AdminEdit(i64, EventField),
    AdminReschedule(i64),
    AdminDelete(i64),
    AdminDeleteConfirm(i64),
    AdminParticipants(i64),
    AdminNews(i64),
    AdminNewsEdit(i64, NewsField),
    AdminNewsDelete(i64),
    AdminNewsDeleteConfirm(i64),
    WizardStatus(EventStatus),
    Wizard(WizardAction),
}

fn record_id(arg: Option<&str>) -> Result<i64> {
    let raw = arg.ok_or_else(|| RunRaceError::InvalidInput("Missing record id".to_string()))?;
    raw.parse()
        .map_err(|_| RunRaceError::InvalidInput(format!("Invalid record id: {}", raw)))
}

fn argument(arg: Option<&str>) -> Result<&str> {
    arg.filter(|value| !value.is_empty())
        .ok_or_else(|| RunRaceError::InvalidInput("Missing callback argument".to_string()))
}

impl FromStr for CallbackAction {
    type Err = RunRaceError;

    fn from_str(data: &str) -> Result<Self> {
        let mut parts = data.splitn(3, ':');
        let action = parts.next().unwrap_or_default();
        let first = parts.next();
        let second = parts.next();

        let parsed = match action {
            "events" => CallbackAction::ListEvents(argument(first)?.parse()?),
            "event" => CallbackAction::ShowEvent(record_id(first)?),
            "event_register" => CallbackAction::Register(record_id(first)?),
            "event_unregister" => CallbackAction::Unregister(record_id(first)?),
            "news_list" => CallbackAction::ListNews,
            "news" => CallbackAction::ShowNews(record_id(first)?),
            "lang" => CallbackAction::SetLanguage(argument(first)?.to_string()),
            "admin" => CallbackAction::Admin(argument(first)?.parse()?),
            "admin_event" => CallbackAction::AdminEvent(record_id(first)?),
            "admin_status" => CallbackAction::AdminSetStatus(record_id(first)?, argument(second)?.parse()?),
            "admin_edit" => CallbackAction::AdminEdit(record_id(first)?, argument(second)?.parse()?),
            "admin_reschedule" => CallbackAction::AdminReschedule(record_id(first)?),
            "admin_delete" => CallbackAction::AdminDelete(record_id(first)?),
            "admin_delete_confirm" => CallbackAction::AdminDeleteConfirm(record_id(first)?),
            "admin_participants" => CallbackAction::AdminParticipants(record_id(first)?),
            "admin_news" => CallbackAction::AdminNews(record_id(first)?),
            "admin_news_edit" => CallbackAction::AdminNewsEdit(record_id(first)?, argument(second)?.parse()?),
            "admin_news_delete" => CallbackAction::AdminNewsDelete(record_id(first)?),
            "admin_news_delete_confirm" => CallbackAction::AdminNewsDeleteConfirm(record_id(first)?),
            "wizard_status" => CallbackAction::WizardStatus(argument(first)?.parse()?),
            "wizard" => CallbackAction::Wizard(argument(first)?.parse()?),
            other => {
                return Err(RunRaceError::InvalidInput(format!("Unknown callback action: {}", other)));
            }
        };

        Ok(parsed)
    }
}

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, ctx: AppContext) -> Result<()> {
    let user = &query.from;
    let user_id = user.id.0 as i64;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or_else(|| ChatId(user_id));

    // Clear the button spinner before doing any work
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(user_id = user_id, callback_data = %data, error = %e, "Ignoring malformed callback");
            return Ok(());
        }
    };

    debug!(user_id = user_id, chat_id = ?chat_id, action = ?action, "Routing callback");

    match action {
        CallbackAction::ListEvents(filter) => {
            let lang = ctx.language(user).await?;
            events::show_event_list(bot, chat_id, filter, &ctx, &lang).await
        }
        CallbackAction::ShowEvent(event_id) => {
            let lang = ctx.language(user).await?;
            events::show_event_card(bot, chat_id, user, event_id, &ctx, &lang).await
        }
        CallbackAction::Register(event_id) => {
            events::handle_event_register_callback(bot, chat_id, user, event_id, ctx).await
        }
        CallbackAction::Unregister(event_id) => {
            events::handle_event_unregister_callback(bot, chat_id, user, event_id, ctx).await
        }
        CallbackAction::ListNews => {
            let lang = ctx.language(user).await?;
            news::show_news_list(bot, chat_id, &ctx, &lang).await
        }
        CallbackAction::ShowNews(news_id) => {
            let lang = ctx.language(user).await?;
            news::show_news_article(bot, chat_id, news_id, &ctx, &lang).await
        }
        CallbackAction::SetLanguage(code) => {
            start::handle_language_callback(bot, chat_id, user, code, ctx).await
        }
        CallbackAction::Admin(entry) => admin::handle_admin_callback(bot, chat_id, user, entry, ctx).await,
        CallbackAction::AdminEvent(event_id) => admin::show_admin_event(bot, chat_id, user, event_id, ctx).await,
        CallbackAction::AdminSetStatus(event_id, status) => {
            admin::handle_set_status(bot, chat_id, user, event_id, status, ctx).await
        }
        CallbackAction::AdminEdit(event_id, field) => {
            admin::start_event_edit(bot, chat_id, user, event_id, field, ctx).await
        }
        CallbackAction::AdminReschedule(event_id) => admin::start_reschedule(bot, chat_id, user, event_id, ctx).await,
        CallbackAction::AdminDelete(event_id) => admin::confirm_delete(bot, chat_id, user, event_id, ctx).await,
        CallbackAction::AdminDeleteConfirm(event_id) => admin::handle_delete(bot, chat_id, user, event_id, ctx).await,
        CallbackAction::AdminParticipants(event_id) => {
            admin::show_participants(bot, chat_id, user, event_id, ctx).await
        }
        CallbackAction::AdminNews(news_id) => news::show_admin_news(bot, chat_id, user, news_id, ctx).await,
        CallbackAction::AdminNewsEdit(news_id, field) => {
            news::start_news_edit(bot, chat_id, user, news_id, field, ctx).await
        }
        CallbackAction::AdminNewsDelete(news_id) => news::confirm_news_delete(bot, chat_id, user, news_id, ctx).await,
        CallbackAction::AdminNewsDeleteConfirm(news_id) => {
            news::handle_news_delete(bot, chat_id, user, news_id, ctx).await
        }
        CallbackAction::WizardStatus(status) => messages::handle_wizard_status(bot, chat_id, user, status, ctx).await,
        CallbackAction::Wizard(action) => messages::handle_wizard_action(bot, chat_id, user, action, ctx).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_member_callbacks() {
        assert_eq!("events:open".parse::<CallbackAction>().unwrap(), CallbackAction::ListEvents(EventFilter::Open));
        assert_eq!(
            "events:ongoing".parse::<CallbackAction>().unwrap(),
            CallbackAction::ListEvents(EventFilter::Stored(EventStatus::Ongoing))
        );
        assert_eq!("event:12".parse::<CallbackAction>().unwrap(), CallbackAction::ShowEvent(12));
        assert_eq!("event_register:7".parse::<CallbackAction>().unwrap(), CallbackAction::Register(7));
        assert_eq!("event_unregister:7".parse::<CallbackAction>().unwrap(), CallbackAction::Unregister(7));
        assert_eq!("lang:id".parse::<CallbackAction>().unwrap(), CallbackAction::SetLanguage("id".to_string()));
        assert_eq!("news_list".parse::<CallbackAction>().unwrap(), CallbackAction::ListNews);
        assert_eq!("news:9".parse::<CallbackAction>().unwrap(), CallbackAction::ShowNews(9));
    }

    #[test]
    fn test_admin_callbacks() {
        assert_eq!("admin:stats".parse::<CallbackAction>().unwrap(), CallbackAction::Admin(AdminMenu::Stats));
        assert_eq!(
            "admin_status:3:completed".parse::<CallbackAction>().unwrap(),
            CallbackAction::AdminSetStatus(3, EventStatus::Completed)
        );
        assert_eq!("admin_delete_confirm:3".parse::<CallbackAction>().unwrap(), CallbackAction::AdminDeleteConfirm(3));
        assert_eq!("admin_participants:3".parse::<CallbackAction>().unwrap(), CallbackAction::AdminParticipants(3));
        assert_eq!(
            "wizard_status:upcoming".parse::<CallbackAction>().unwrap(),
            CallbackAction::WizardStatus(EventStatus::Upcoming)
        );
        assert_eq!("wizard:confirm".parse::<CallbackAction>().unwrap(), CallbackAction::Wizard(WizardAction::Confirm));
        assert_eq!(
            "admin_edit:3:banner".parse::<CallbackAction>().unwrap(),
            CallbackAction::AdminEdit(3, EventField::Banner)
        );
        assert_eq!(
            "admin_news_edit:8:content".parse::<CallbackAction>().unwrap(),
            CallbackAction::AdminNewsEdit(8, NewsField::Content)
        );
        assert_eq!("admin_news_delete_confirm:8".parse::<CallbackAction>().unwrap(), CallbackAction::AdminNewsDeleteConfirm(8));
    }

    #[test]
    fn test_malformed_callbacks() {
        assert_matches!("event:abc".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
        assert_matches!("event_register".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
        assert_matches!("admin_status:3".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
        assert_matches!("lang:".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
        assert_matches!("checkout:1".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
        assert_matches!("admin_edit:3:date".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
        assert_matches!("news:".parse::<CallbackAction>(), Err(RunRaceError::InvalidInput(_)));
    }
}
