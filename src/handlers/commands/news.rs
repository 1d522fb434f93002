//! News feed handlers
//!
//! Members read the latest articles with /news. Administrators publish,
//! edit and delete them from the admin panel.

use std::collections::HashMap;
use std::str::FromStr;
use teloxide::{Bot, types::{Message, InlineKeyboardMarkup, InlineKeyboardButton, ChatId, ParseMode, User}, prelude::*};
use tracing::{info, debug};
use crate::utils::errors::{RunRaceError, Result};
use crate::handlers::{AppContext, render, report_error, require_sender, telegram_id};
use crate::handlers::commands::admin::authorize;
use crate::handlers::messages::send_step_prompt;
use crate::models::news::News;
use crate::state::{ConversationContext, scenarios::{self, steps}, context::keys};

/// Articles shown by /news
const MAX_LISTED_NEWS: i64 = 10;

/// Articles shown in the admin list
const MAX_ADMIN_NEWS: i64 = 30;

/// Article fields an admin can edit, `admin_news_edit:<id>:<field>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsField {
    Title,
    Content,
    Image,
}

impl NewsField {
    pub const ALL: [NewsField; 3] = [NewsField::Title, NewsField::Content, NewsField::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsField::Title => "title",
            NewsField::Content => "content",
            NewsField::Image => "image",
        }
    }

    pub fn step(&self) -> &'static str {
        match self {
            NewsField::Title => steps::TITLE_INPUT,
            NewsField::Content => steps::CONTENT_INPUT,
            NewsField::Image => steps::IMAGE_INPUT,
        }
    }
}

impl FromStr for NewsField {
    type Err = RunRaceError;

    fn from_str(s: &str) -> Result<Self> {
        NewsField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| RunRaceError::InvalidInput(format!("Unknown news field: {}", s)))
    }
}

/// Handle /news command
pub async fn handle_news(bot: Bot, msg: Message, ctx: AppContext) -> Result<()> {
    let user = require_sender(msg.from.as_ref())?;
    let lang = ctx.language(user).await?;

    debug!(user_id = telegram_id(user), "Processing /news command");
    show_news_list(bot, msg.chat.id, &ctx, &lang).await
}

/// Send the latest articles with a button for each
pub async fn show_news_list(bot: Bot, chat_id: ChatId, ctx: &AppContext, lang: &str) -> Result<()> {
    let articles = ctx.services.news_service.latest(MAX_LISTED_NEWS).await?;

    if articles.is_empty() {
        bot.send_message(chat_id, ctx.i18n.t("commands.news.empty", lang, None)).await?;
        return Ok(());
    }

    let mut text = ctx.i18n.t("commands.news.title", lang, None);
    let mut rows = Vec::new();
    for news in &articles {
        if !render::push_within_limit(&mut text, &render::news_list_line(news), render::LISTING_TEXT_LIMIT) {
            break;
        }
        rows.push(vec![render::news_button(news, "news")]);
    }

    bot.send_message(chat_id, text)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;

    Ok(())
}

/// Handle `news:<id>`
pub async fn show_news_article(bot: Bot, chat_id: ChatId, news_id: i64, ctx: &AppContext, lang: &str) -> Result<()> {
    let news = match ctx.services.news_service.get_news(news_id).await {
        Ok(news) => news,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, lang, e).await,
    };

    let mut rows = Vec::new();
    if let Some(row) = render::link_row(news.image_url.as_deref(), ctx.i18n.t("buttons.news.image", lang, None)) {
        rows.push(row);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        ctx.i18n.t("buttons.navigation.back", lang, None),
        "news_list",
    )]);

    bot.send_message(chat_id, render::news_card_text(&news))
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;

    Ok(())
}

/// Admin list of articles, newest first
pub(crate) async fn show_admin_news_list(bot: Bot, chat_id: ChatId, ctx: &AppContext, lang: &str) -> Result<()> {
    let articles = ctx.services.news_service.latest(MAX_ADMIN_NEWS).await?;

    let mut rows: Vec<Vec<InlineKeyboardButton>> = articles
        .iter()
        .map(|news| vec![render::news_button(news, "admin_news")])
        .collect();
    rows.push(vec![
        InlineKeyboardButton::callback(ctx.i18n.t("admin.menu.new_news", lang, None), "admin:new_news"),
        InlineKeyboardButton::callback(ctx.i18n.t("buttons.navigation.back", lang, None), "admin:back"),
    ]);

    let key = if articles.is_empty() { "admin.news.empty" } else { "admin.news.title" };
    bot.send_message(chat_id, ctx.i18n.t(key, lang, None))
        .reply_markup(InlineKeyboardMarkup::new(rows))
        .await?;

    Ok(())
}

/// Handle `admin_news:<id>`
pub async fn show_admin_news(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    news_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    send_admin_news_card(bot, chat_id, news_id, &ctx, &lang).await
}

pub(crate) async fn send_admin_news_card(bot: Bot, chat_id: ChatId, news_id: i64, ctx: &AppContext, lang: &str) -> Result<()> {
    let news = match ctx.services.news_service.get_news(news_id).await {
        Ok(news) => news,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, lang, e).await,
    };

    bot.send_message(chat_id, render::news_card_text(&news))
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(admin_news_keyboard(&news, ctx, lang))
        .await?;

    Ok(())
}

fn admin_news_keyboard(news: &News, ctx: &AppContext, lang: &str) -> InlineKeyboardMarkup {
    let edit_row = NewsField::ALL
        .into_iter()
        .map(|field| {
            InlineKeyboardButton::callback(
                ctx.i18n.t(&format!("buttons.admin.edit.{}", field.as_str()), lang, None),
                format!("admin_news_edit:{}:{}", news.id, field.as_str()),
            )
        })
        .collect::<Vec<_>>();

    let mut rows = vec![edit_row];
    if let Some(row) = render::link_row(news.image_url.as_deref(), ctx.i18n.t("buttons.news.image", lang, None)) {
        rows.push(row);
    }
    rows.push(vec![
        InlineKeyboardButton::callback(
            ctx.i18n.t("buttons.admin.delete", lang, None),
            format!("admin_news_delete:{}", news.id),
        ),
        InlineKeyboardButton::callback(ctx.i18n.t("buttons.navigation.back", lang, None), "admin:news"),
    ]);

    InlineKeyboardMarkup::new(rows)
}

pub(crate) async fn start_news_creation(bot: Bot, chat_id: ChatId, user: &User, ctx: &AppContext, lang: &str) -> Result<()> {
    let mut context = ConversationContext::new(telegram_id(user));
    ctx.scenario_manager.start_scenario(&mut context, scenarios::NEWS_CREATION, ctx.state_storage.default_ttl())?;
    ctx.state_storage.save_context(&context).await?;

    info!(user_id = telegram_id(user), "News creation wizard started");
    send_step_prompt(&bot, chat_id, &context, ctx, lang).await
}

/// Handle `admin_news_edit:<id>:<field>`
pub async fn start_news_edit(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    news_id: i64,
    field: NewsField,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    let news = match ctx.services.news_service.get_news(news_id).await {
        Ok(news) => news,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    let mut context = ConversationContext::new(telegram_id(user));
    ctx.scenario_manager.start_scenario(&mut context, scenarios::NEWS_EDIT, ctx.state_storage.default_ttl())?;
    ctx.scenario_manager.next_step(&mut context, field.step())?;
    context.set_data(keys::NEWS_ID, news_id)?;
    context.set_data(keys::TITLE, &news.title)?;
    ctx.state_storage.save_context(&context).await?;

    info!(user_id = telegram_id(user), news_id = news_id, field = field.as_str(), "News edit wizard started");
    send_step_prompt(&bot, chat_id, &context, &ctx, &lang).await
}

/// Handle `admin_news_delete:<id>`: ask for confirmation
pub async fn confirm_news_delete(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    news_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let Some(lang) = authorize(&bot, chat_id, user, &ctx).await? else {
        return Ok(());
    };

    let news = match ctx.services.news_service.get_news(news_id).await {
        Ok(news) => news,
        Err(e) => return report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    };

    let mut params = HashMap::new();
    params.insert("title".to_string(), news.title.clone());

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            ctx.i18n.t("buttons.admin.delete_confirm", &lang, None),
            format!("admin_news_delete_confirm:{}", news_id),
        ),
        InlineKeyboardButton::callback(
            ctx.i18n.t("buttons.navigation.back", &lang, None),
            format!("admin_news:{}", news_id),
        ),
    ]]);

    bot.send_message(chat_id, ctx.i18n.t("admin.news.delete_prompt", &lang, Some(&params)))
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle `admin_news_delete_confirm:<id>`
pub async fn handle_news_delete(
    bot: Bot,
    chat_id: ChatId,
    user: &User,
    news_id: i64,
    ctx: AppContext,
) -> Result<()> {
    let lang = ctx.language(user).await?;

    match ctx.services.news_service.delete_news(telegram_id(user), news_id).await {
        Ok(()) => {
            bot.send_message(chat_id, ctx.i18n.t("admin.news.deleted", &lang, None)).await?;
            show_admin_news_list(bot, chat_id, &ctx, &lang).await
        }
        Err(e) => report_error(&bot, chat_id, &ctx.i18n, &lang, e).await,
    }
}
