//! Message handlers module
//!
//! Free text only matters while an admin is inside a wizard; everything
//! else gets pointed at the command list.

use std::collections::HashMap;
use std::str::FromStr;
use chrono::NaiveDate;
use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton, ChatId, User}, prelude::*};
use tracing::{info, debug, warn};
use crate::utils::errors::{RunRaceError, Result};
use crate::utils::helpers::{format_event_date, normalize_whitespace, parse_event_date};
use crate::handlers::{AppContext, report_error, telegram_id};
use crate::handlers::commands::admin::send_admin_card;
use crate::handlers::commands::news::send_admin_news_card;
use crate::models::event::{CreateEventRequest, EventStatus, UpdateEventRequest};
use crate::models::news::{CreateNewsRequest, UpdateNewsRequest};
use crate::state::{ConversationContext, context::keys, scenarios::{self, steps, SKIP_INPUT}};

/// Final buttons of the creation wizards, `wizard:<action>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    Confirm,
    Cancel,
}

impl FromStr for WizardAction {
    type Err = RunRaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "confirm" => Ok(WizardAction::Confirm),
            "cancel" => Ok(WizardAction::Cancel),
            other => Err(RunRaceError::InvalidInput(format!("Unknown wizard action: {}", other))),
        }
    }
}

/// Handle incoming text messages
pub async fn handle_message(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let user_id = telegram_id(user);
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, chat_id = ?chat_id, "Processing message");

    // Wizards only run in private chats
    if !msg.chat.is_private() {
        return Ok(());
    }

    let lang = ctx.language(user).await?;

    if let Some(context) = ctx.state_storage.load_context(user_id).await? {
        if context.is_active() {
            let Some(text) = msg.text() else {
                bot.send_message(chat_id, ctx.i18n.t("wizard.text_expected", &lang, None)).await?;
                return Ok(());
            };
            return handle_wizard_input(bot, chat_id, user, context, text, &ctx, &lang).await;
        }
    }

    bot.send_message(chat_id, ctx.i18n.t("messages.use_commands", &lang, None)).await?;
    Ok(())
}

async fn handle_wizard_input(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    mut context: ConversationContext,
    text: &str,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    if let Err(e) = ctx.scenario_manager.validate_input(&context, text) {
        return report_error(&bot, chat_id, &ctx.i18n, lang, e).await;
    }

    let scenario = context.scenario.clone().unwrap_or_default();
    let step = context.step.clone().unwrap_or_default();

    // Article bodies keep their line breaks
    let text = if step == steps::CONTENT_INPUT { text.trim().to_string() } else { normalize_whitespace(text) };

    debug!(user_id = telegram_id(user), scenario = %scenario, step = %step, "Wizard input");

    let next = match (scenario.as_str(), step.as_str()) {
        (scenarios::EVENT_RESCHEDULE, steps::DATE_INPUT) => {
            return finish_reschedule(bot, chat_id, user, context, &text, ctx, lang).await;
        }
        (scenarios::EVENT_CREATION, steps::NAME_INPUT) => {
            context.set_data(keys::NAME, &text)?;
            steps::LOCATION_INPUT
        }
        (scenarios::EVENT_CREATION, steps::LOCATION_INPUT) => {
            context.set_data(keys::LOCATION, &text)?;
            steps::CATEGORY_INPUT
        }
        (scenarios::EVENT_CREATION, steps::CATEGORY_INPUT) => {
            context.set_data(keys::CATEGORY, &text)?;
            steps::DATE_INPUT
        }
        (scenarios::EVENT_CREATION, steps::DATE_INPUT) => {
            context.set_data(keys::EVENT_DATE, parse_event_date(&text)?)?;
            steps::BANNER_INPUT
        }
        (scenarios::EVENT_CREATION, steps::BANNER_INPUT) => {
            if let Some(banner_url) = optional_answer(&text) {
                context.set_data(keys::BANNER_URL, banner_url)?;
            }
            steps::STATUS_INPUT
        }
        (scenarios::EVENT_CREATION, steps::STATUS_INPUT) => {
            context.set_data(keys::STATUS, EventStatus::from_str(&text)?)?;
            steps::CONFIRMATION
        }
        (scenarios::EVENT_EDIT, steps::NAME_INPUT | steps::LOCATION_INPUT | steps::CATEGORY_INPUT | steps::BANNER_INPUT) => {
            return finish_event_edit(bot, chat_id, user, context, &text, ctx, lang).await;
        }
        (scenarios::NEWS_CREATION, steps::TITLE_INPUT) => {
            context.set_data(keys::TITLE, &text)?;
            steps::CONTENT_INPUT
        }
        (scenarios::NEWS_CREATION, steps::CONTENT_INPUT) => {
            context.set_data(keys::CONTENT, &text)?;
            steps::IMAGE_INPUT
        }
        (scenarios::NEWS_CREATION, steps::IMAGE_INPUT) => {
            if let Some(image_url) = optional_answer(&text) {
                context.set_data(keys::IMAGE_URL, image_url)?;
            }
            steps::CONFIRMATION
        }
        (scenarios::NEWS_EDIT, steps::TITLE_INPUT | steps::CONTENT_INPUT | steps::IMAGE_INPUT) => {
            return finish_news_edit(bot, chat_id, user, context, &text, ctx, lang).await;
        }
        _ => {
            // Steps answered with buttons: show the buttons again
            return send_step_prompt(&bot, chat_id, &context, ctx, lang).await;
        }
    };

    ctx.scenario_manager.next_step(&mut context, next)?;
    ctx.state_storage.save_context(&context).await?;
    send_step_prompt(&bot, chat_id, &context, ctx, lang).await
}

async fn finish_reschedule(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    mut context: ConversationContext,
    text: &str,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let event_id: i64 = context.require(keys::EVENT_ID)?;
    let event_date = parse_event_date(text)?;

    match ctx.services.event_service.reschedule(telegram_id(user), event_id, event_date).await {
        Ok(event) => {
            ctx.scenario_manager.next_step(&mut context, steps::DONE)?;
            ctx.state_storage.delete_context(telegram_id(user)).await?;

            let mut params = HashMap::new();
            params.insert("name".to_string(), event.name.clone());
            params.insert("date".to_string(), format_event_date(event.event_date));
            bot.send_message(chat_id, ctx.i18n.t("admin.event.rescheduled", lang, Some(&params))).await?;

            info!(user_id = telegram_id(user), event_id = event_id, event_date = %event_date, "Event rescheduled");
            send_admin_card(bot, chat_id, event_id, ctx, lang).await
        }
        Err(e) => {
            // A missing event or revoked admin ends the wizard
            if matches!(e, RunRaceError::EventNotFound { .. } | RunRaceError::PermissionDenied(_)) {
                ctx.state_storage.delete_context(telegram_id(user)).await?;
            }
            report_error(&bot, chat_id, &ctx.i18n, lang, e).await
        }
    }
}

/// `None` when the admin skipped an optional field
fn optional_answer(text: &str) -> Option<&str> {
    (text != SKIP_INPUT).then_some(text)
}

/// Partial event update carrying the single field answered at `step`
fn event_update(step: &str, text: &str) -> Result<UpdateEventRequest> {
    let mut request = UpdateEventRequest::default();
    match step {
        steps::NAME_INPUT => request.name = Some(text.to_string()),
        steps::LOCATION_INPUT => request.location = Some(text.to_string()),
        steps::CATEGORY_INPUT => request.category = Some(text.to_string()),
        steps::BANNER_INPUT => match optional_answer(text) {
            Some(url) => request.banner_url = Some(url.to_string()),
            None => request.clear_banner = true,
        },
        other => return Err(RunRaceError::InvalidInput(format!("Not an event field step: {}", other))),
    }
    Ok(request)
}

/// Partial article update carrying the single field answered at `step`
fn news_update(step: &str, text: &str) -> Result<UpdateNewsRequest> {
    let mut request = UpdateNewsRequest::default();
    match step {
        steps::TITLE_INPUT => request.title = Some(text.to_string()),
        steps::CONTENT_INPUT => request.content = Some(text.to_string()),
        steps::IMAGE_INPUT => match optional_answer(text) {
            Some(url) => request.image_url = Some(url.to_string()),
            None => request.clear_image = true,
        },
        other => return Err(RunRaceError::InvalidInput(format!("Not a news field step: {}", other))),
    }
    Ok(request)
}

async fn finish_event_edit(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    mut context: ConversationContext,
    text: &str,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let user_id = telegram_id(user);
    let event_id: i64 = context.require(keys::EVENT_ID)?;
    let request = event_update(context.step.as_deref().unwrap_or_default(), text)?;

    match ctx.services.event_service.update_event(user_id, event_id, request).await {
        Ok(event) => {
            ctx.scenario_manager.next_step(&mut context, steps::DONE)?;
            ctx.state_storage.delete_context(user_id).await?;

            let mut params = HashMap::new();
            params.insert("name".to_string(), event.name.clone());
            bot.send_message(chat_id, ctx.i18n.t("admin.event.updated", lang, Some(&params))).await?;

            send_admin_card(bot, chat_id, event_id, ctx, lang).await
        }
        Err(e) => {
            if matches!(e, RunRaceError::EventNotFound { .. } | RunRaceError::PermissionDenied(_)) {
                ctx.state_storage.delete_context(user_id).await?;
            }
            report_error(&bot, chat_id, &ctx.i18n, lang, e).await
        }
    }
}

async fn finish_news_edit(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    mut context: ConversationContext,
    text: &str,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let user_id = telegram_id(user);
    let news_id: i64 = context.require(keys::NEWS_ID)?;
    let request = news_update(context.step.as_deref().unwrap_or_default(), text)?;

    match ctx.services.news_service.update_news(user_id, news_id, request).await {
        Ok(news) => {
            ctx.scenario_manager.next_step(&mut context, steps::DONE)?;
            ctx.state_storage.delete_context(user_id).await?;

            let mut params = HashMap::new();
            params.insert("title".to_string(), news.title.clone());
            bot.send_message(chat_id, ctx.i18n.t("admin.news.updated", lang, Some(&params))).await?;

            send_admin_news_card(bot, chat_id, news_id, ctx, lang).await
        }
        Err(e) => {
            if matches!(e, RunRaceError::NewsNotFound { .. } | RunRaceError::PermissionDenied(_)) {
                ctx.state_storage.delete_context(user_id).await?;
            }
            report_error(&bot, chat_id, &ctx.i18n, lang, e).await
        }
    }
}

/// Send the question for the context's current step
pub async fn send_step_prompt(
    bot: &Bot,
    chat_id: ChatId,
    context: &ConversationContext,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let step = context.step.as_deref().unwrap_or_default();

    if context.is_in_scenario(scenarios::EVENT_EDIT) || context.is_in_scenario(scenarios::NEWS_EDIT) {
        let name = context.get_string(keys::NAME).or_else(|| context.get_string(keys::TITLE)).unwrap_or_default();
        let mut params = HashMap::new();
        params.insert("name".to_string(), name);
        bot.send_message(chat_id, ctx.i18n.t(&format!("wizard.edit_prompt.{}", step), lang, Some(&params))).await?;
        return Ok(());
    }

    match step {
        steps::STATUS_INPUT => {
            let buttons = EventStatus::ALL
                .iter()
                .map(|status| {
                    InlineKeyboardButton::callback(
                        ctx.i18n.t(&format!("admin.status.{}", status), lang, None),
                        format!("wizard_status:{}", status),
                    )
                })
                .collect::<Vec<_>>();

            bot.send_message(chat_id, ctx.i18n.t("wizard.prompt.status_input", lang, None))
                .reply_markup(InlineKeyboardMarkup::new(vec![buttons]))
                .await?;
        }
        steps::CONFIRMATION => {
            let summary = if context.is_in_scenario(scenarios::NEWS_CREATION) {
                news_confirmation_summary(context, ctx, lang)?
            } else {
                confirmation_summary(context, ctx, lang)?
            };
            bot.send_message(chat_id, summary)
                .reply_markup(InlineKeyboardMarkup::new(vec![vec![
                    InlineKeyboardButton::callback(ctx.i18n.t("buttons.wizard.confirm", lang, None), "wizard:confirm"),
                    InlineKeyboardButton::callback(ctx.i18n.t("buttons.wizard.cancel", lang, None), "wizard:cancel"),
                ]]))
                .await?;
        }
        step => {
            bot.send_message(chat_id, ctx.i18n.t(&format!("wizard.prompt.{}", step), lang, None)).await?;
        }
    }

    Ok(())
}

fn confirmation_summary(context: &ConversationContext, ctx: &AppContext, lang: &str) -> Result<String> {
    let event_date: NaiveDate = context.require(keys::EVENT_DATE)?;
    let status: EventStatus = context.require(keys::STATUS)?;

    let mut params = HashMap::new();
    params.insert("name".to_string(), context.require::<String>(keys::NAME)?);
    params.insert("location".to_string(), context.require::<String>(keys::LOCATION)?);
    params.insert("category".to_string(), context.require::<String>(keys::CATEGORY)?);
    params.insert("date".to_string(), format_event_date(event_date));
    params.insert("status".to_string(), ctx.i18n.t(&format!("admin.status.{}", status), lang, None));
    params.insert(
        "banner".to_string(),
        context.get_string(keys::BANNER_URL).unwrap_or_else(|| ctx.i18n.t("wizard.none", lang, None)),
    );

    let mut text = ctx.i18n.t("wizard.confirm_summary", lang, Some(&params));

    // Admins may schedule inside the cutoff; members will never see it open
    let decision = crate::policy::evaluate(event_date, ctx.services.event_service.today());
    if !decision.can_register {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n.t("wizard.closed_warning", lang, None));
    }

    Ok(text)
}

fn news_confirmation_summary(context: &ConversationContext, ctx: &AppContext, lang: &str) -> Result<String> {
    let mut params = HashMap::new();
    params.insert("title".to_string(), context.require::<String>(keys::TITLE)?);
    params.insert("content".to_string(), context.require::<String>(keys::CONTENT)?);
    params.insert(
        "image".to_string(),
        context.get_string(keys::IMAGE_URL).unwrap_or_else(|| ctx.i18n.t("wizard.none", lang, None)),
    );

    Ok(ctx.i18n.t("wizard.confirm_news_summary", lang, Some(&params)))
}

/// Handle `wizard_status:<status>`
pub async fn handle_wizard_status(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    status: EventStatus,
    ctx: AppContext,
) -> Result<()> {
    let lang = ctx.language(user).await?;

    let mut context = match ctx.state_storage.load_context(telegram_id(user)).await? {
        Some(context) if context.is_at(scenarios::EVENT_CREATION, steps::STATUS_INPUT) => context,
        _ => {
            bot.send_message(chat_id, ctx.i18n.t("wizard.expired", &lang, None)).await?;
            return Ok(());
        }
    };

    context.set_data(keys::STATUS, status)?;
    ctx.scenario_manager.next_step(&mut context, steps::CONFIRMATION)?;
    ctx.state_storage.save_context(&context).await?;

    send_step_prompt(&bot, chat_id, &context, &ctx, &lang).await
}

/// Handle `wizard:<confirm|cancel>`
pub async fn handle_wizard_action(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    action: WizardAction,
    ctx: AppContext,
) -> Result<()> {
    let user_id = telegram_id(user);
    let lang = ctx.language(user).await?;

    if action == WizardAction::Cancel {
        ctx.state_storage.delete_context(user_id).await?;
        bot.send_message(chat_id, ctx.i18n.t("wizard.cancelled", &lang, None)).await?;
        return Ok(());
    }

    let context = match ctx.state_storage.load_context(user_id).await? {
        Some(context) if context.is_at_step(steps::CONFIRMATION) => context,
        _ => {
            bot.send_message(chat_id, ctx.i18n.t("wizard.expired", &lang, None)).await?;
            return Ok(());
        }
    };

    if context.is_in_scenario(scenarios::NEWS_CREATION) {
        return publish_news(bot, chat_id, user_id, &context, &ctx, &lang).await;
    }

    let request = CreateEventRequest {
        name: context.require(keys::NAME)?,
        location: context.require(keys::LOCATION)?,
        category: context.require(keys::CATEGORY)?,
        event_date: context.require(keys::EVENT_DATE)?,
        status: context.require(keys::STATUS)?,
        banner_url: context.get_string(keys::BANNER_URL),
        created_by: None,
    };

    match ctx.services.event_service.create_event(user_id, request).await {
        Ok(event) => {
            ctx.state_storage.delete_context(user_id).await?;

            let mut params = HashMap::new();
            params.insert("name".to_string(), event.name.clone());
            bot.send_message(chat_id, ctx.i18n.t("wizard.created", &lang, Some(&params))).await?;

            send_admin_card(bot, chat_id, event.id, &ctx, &lang).await
        }
        Err(e) => {
            warn!(user_id = user_id, error = %e, "Event creation failed");
            report_error(&bot, chat_id, &ctx.i18n, &lang, e).await
        }
    }
}

async fn publish_news(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    context: &ConversationContext,
    ctx: &AppContext,
    lang: &str,
) -> Result<()> {
    let request = CreateNewsRequest {
        title: context.require(keys::TITLE)?,
        content: context.require(keys::CONTENT)?,
        image_url: context.get_string(keys::IMAGE_URL),
        created_by: None,
    };

    match ctx.services.news_service.create_news(user_id, request).await {
        Ok(news) => {
            ctx.state_storage.delete_context(user_id).await?;

            let mut params = HashMap::new();
            params.insert("title".to_string(), news.title.clone());
            bot.send_message(chat_id, ctx.i18n.t("admin.news.created", lang, Some(&params))).await?;

            send_admin_news_card(bot, chat_id, news.id, ctx, lang).await
        }
        Err(e) => {
            warn!(user_id = user_id, error = %e, "News creation failed");
            report_error(&bot, chat_id, &ctx.i18n, lang, e).await
        }
    }
}
