//! Text rendering for event cards, news, listings and error replies

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use crate::i18n::{I18n, TranslationParams};
use crate::models::event::EventSummary;
use crate::models::news::News;
use crate::policy::{Countdown, EffectiveStatus, RegistrationDecision};
use crate::services::{EventCard, MyRegistration};
use crate::utils::errors::RunRaceError;
use crate::utils::helpers::{escape_markdown, format_event_date, truncate_text};

/// Longest event name shown on a list button
const BUTTON_NAME_LENGTH: usize = 40;

/// Listing text budget, below Telegram's 4096 character message limit so a
/// trailing "and N more" line still fits
pub const LISTING_TEXT_LIMIT: usize = 3800;

/// Append `block` after a blank line unless that would push `text` past
/// `limit` characters. Returns whether it was appended.
pub fn push_within_limit(text: &mut String, block: &str, limit: usize) -> bool {
    if text.chars().count() + 2 + block.chars().count() > limit {
        return false;
    }
    text.push_str("\n\n");
    text.push_str(block);
    true
}

fn params<const N: usize>(pairs: [(&str, String); N]) -> TranslationParams {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Emoji marking the effective status
pub fn status_badge(status: EffectiveStatus) -> &'static str {
    match status {
        EffectiveStatus::Open => "🟢",
        EffectiveStatus::ClosedForRegistration => "🟠",
        EffectiveStatus::Completed => "⚫",
    }
}

pub fn status_label(status: EffectiveStatus, i18n: &I18n, lang: &str) -> String {
    i18n.t(&format!("events.status.{}", status.as_str()), lang, None)
}

/// "Today", "Tomorrow" or "H-n"; empty once the event has passed
pub fn countdown_label(decision: &RegistrationDecision, i18n: &I18n, lang: &str) -> String {
    match decision.countdown() {
        Some(Countdown::Today) => i18n.t("events.countdown.today", lang, None),
        Some(Countdown::Tomorrow) => i18n.t("events.countdown.tomorrow", lang, None),
        Some(Countdown::DaysLeft(days)) => {
            i18n.t("events.countdown.days_left", lang, Some(&params([("days", days.to_string())])))
        }
        None => String::new(),
    }
}

/// Plain-text line for an event in a listing
pub fn event_list_line(
    summary: &EventSummary,
    decision: &RegistrationDecision,
    i18n: &I18n,
    lang: &str,
) -> String {
    let event = &summary.event;
    let mut line = format!(
        "{} {} · {} · {}",
        status_badge(decision.effective_status),
        event.name,
        format_event_date(event.event_date),
        event.location,
    );

    let countdown = countdown_label(decision, i18n, lang);
    if !countdown.is_empty() {
        line.push_str(&format!(" · {}", countdown));
    }

    line.push_str(&format!(
        "\n   {}",
        i18n.tp("events.registration_count", lang, summary.registration_count, None)
    ));
    line
}

/// MarkdownV2 detail card
pub fn event_card_text(card: &EventCard, i18n: &I18n, lang: &str, admin_view: bool) -> String {
    let event = &card.summary.event;
    let decision = &card.decision;

    let mut lines = vec![
        format!("*{}*", escape_markdown(&event.name)),
        escape_markdown(&i18n.t("events.card.location", lang, Some(&params([("location", event.location.clone())])))),
        escape_markdown(&i18n.t("events.card.category", lang, Some(&params([("category", event.category.clone())])))),
        escape_markdown(&i18n.t("events.card.date", lang, Some(&params([("date", format_event_date(event.event_date))])))),
        escape_markdown(&format!(
            "{} {}",
            status_badge(decision.effective_status),
            status_label(decision.effective_status, i18n, lang)
        )),
    ];

    let countdown = countdown_label(decision, i18n, lang);
    if !countdown.is_empty() {
        let countdown = if decision.is_urgent() { format!("⏰ {}", countdown) } else { countdown };
        lines.push(escape_markdown(&countdown));
    }

    lines.push(escape_markdown(&i18n.tp(
        "events.registration_count",
        lang,
        card.summary.registration_count,
        None,
    )));

    let hint_key = match decision.effective_status {
        EffectiveStatus::Open => "events.card.open_hint",
        EffectiveStatus::ClosedForRegistration => "events.card.closed_hint",
        EffectiveStatus::Completed => "events.card.completed_hint",
    };
    lines.push(String::new());
    lines.push(format!("_{}_", escape_markdown(&i18n.t(hint_key, lang, None))));

    if admin_view {
        lines.push(String::new());
        lines.push(escape_markdown(&i18n.t(
            "admin.event.stored_status",
            lang,
            Some(&params([("status", event.status.clone())])),
        )));
        if card.stale_status {
            lines.push(escape_markdown(&i18n.t(
                "admin.event.stale_status",
                lang,
                Some(&params([("suggested", decision.effective_status.legacy_status().to_string())])),
            )));
        }
    }

    lines.join("\n")
}

/// One line per registration on the "my events" screen
pub fn my_registration_line(item: &MyRegistration, i18n: &I18n, lang: &str) -> String {
    let event = &item.registration.event;
    let countdown = countdown_label(&item.decision, i18n, lang);
    let mut line = format!(
        "{} {} · {}",
        status_badge(item.decision.effective_status),
        event.name,
        format_event_date(event.event_date),
    );
    if !countdown.is_empty() {
        line.push_str(&format!(" · {}", countdown));
    }
    line
}

/// Listing line for a news article
pub fn news_list_line(news: &News) -> String {
    format!("🗞 {} · {}", news.title, format_event_date(news.created_at.date_naive()))
}

/// MarkdownV2 article card
pub fn news_card_text(news: &News) -> String {
    format!(
        "*{}*\n_{}_\n\n{}",
        escape_markdown(&news.title),
        escape_markdown(&format_event_date(news.created_at.date_naive())),
        escape_markdown(&news.content),
    )
}

/// Button opening an article
pub fn news_button(news: &News, callback_prefix: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(
        format!("🗞 {}", truncate_text(&news.title, BUTTON_NAME_LENGTH)),
        format!("{}:{}", callback_prefix, news.id),
    )
}

/// Row with a link button for an optional image or banner URL
pub fn link_row(raw: Option<&str>, label: String) -> Option<Vec<InlineKeyboardButton>> {
    let url = raw.and_then(|url| url::Url::parse(url).ok())?;
    Some(vec![InlineKeyboardButton::url(label, url)])
}

/// Button opening an event card
pub fn event_button(summary: &EventSummary, decision: &RegistrationDecision, callback_prefix: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(
        format!(
            "{} {}",
            status_badge(decision.effective_status),
            truncate_text(&summary.event.name, BUTTON_NAME_LENGTH)
        ),
        format!("{}:{}", callback_prefix, summary.event.id),
    )
}

/// Filter row shown above event listings
pub fn filter_keyboard_row(i18n: &I18n, lang: &str) -> Vec<InlineKeyboardButton> {
    ["open", "upcoming", "ongoing", "completed", "all"]
        .into_iter()
        .map(|filter| {
            InlineKeyboardButton::callback(
                i18n.t(&format!("events.filters.{}", filter), lang, None),
                format!("events:{}", filter),
            )
        })
        .collect()
}

/// Register or withdraw button for a member viewing a card
pub fn registration_keyboard(
    card: &EventCard,
    is_registered: bool,
    i18n: &I18n,
    lang: &str,
) -> InlineKeyboardMarkup {
    let event_id = card.summary.event.id;
    let mut rows = Vec::new();

    if is_registered {
        rows.push(vec![InlineKeyboardButton::callback(
            i18n.t("buttons.events.unregister", lang, None),
            format!("event_unregister:{}", event_id),
        )]);
    } else if card.decision.can_register {
        rows.push(vec![InlineKeyboardButton::callback(
            i18n.t("buttons.events.register", lang, None),
            format!("event_register:{}", event_id),
        )]);
    }

    if let Some(row) = link_row(card.summary.event.banner_url.as_deref(), i18n.t("buttons.events.banner", lang, None)) {
        rows.push(row);
    }

    rows.push(vec![InlineKeyboardButton::callback(
        i18n.t("buttons.navigation.back", lang, None),
        "events:all",
    )]);

    InlineKeyboardMarkup::new(rows)
}

/// Translation key and parameters describing an error to the user
pub fn error_key(error: &RunRaceError) -> (String, TranslationParams) {
    match error {
        RunRaceError::Policy(policy_error) => {
            let mut values = TranslationParams::new();
            if let crate::policy::PolicyError::RegistrationClosed { days_until_event } = policy_error {
                values.insert("days".to_string(), days_until_event.to_string());
            }
            (format!("errors.policy.{}", policy_error.kind()), values)
        }
        RunRaceError::EventNotFound { .. } => ("errors.event_not_found".to_string(), TranslationParams::new()),
        RunRaceError::NewsNotFound { .. } => ("errors.news_not_found".to_string(), TranslationParams::new()),
        RunRaceError::UserNotFound { .. } => ("errors.user_not_found".to_string(), TranslationParams::new()),
        RunRaceError::UserBanned { .. } => ("errors.user_banned".to_string(), TranslationParams::new()),
        RunRaceError::PermissionDenied(_) => ("errors.permission_denied".to_string(), TranslationParams::new()),
        RunRaceError::RateLimitExceeded => ("errors.rate_limited".to_string(), TranslationParams::new()),
        RunRaceError::InvalidInput(details) => (
            "errors.invalid_input".to_string(),
            params([("details", details.clone())]),
        ),
        _ => ("errors.generic".to_string(), TranslationParams::new()),
    }
}

/// Localised text for an error
pub fn error_text(error: &RunRaceError, i18n: &I18n, lang: &str) -> String {
    let (key, values) = error_key(error);
    i18n.t(&key, lang, Some(&values))
}
