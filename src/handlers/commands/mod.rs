//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /help, etc.

pub mod start;
pub mod help;
pub mod events;
pub mod admin;
pub mod news;

use teloxide::{Bot, types::Message, utils::command::BotCommands};
use crate::utils::errors::Result;
use super::AppContext;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "RunRace commands:")]
pub enum Command {
    #[command(description = "Start the bot and show welcome message")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Browse races")]
    Events,
    #[command(description = "Races you registered for")]
    MyEvents,
    #[command(description = "Latest community news")]
    News,
    #[command(description = "Admin panel (admin only)")]
    Admin,
    #[command(description = "Create a new race (admin only)")]
    NewEvent,
    #[command(description = "Cancel the current wizard")]
    Cancel,
}

/// Main command dispatcher
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, ctx: AppContext) -> Result<()> {
    match cmd {
        Command::Start => start::handle_start(bot, msg, ctx).await,
        Command::Help => help::handle_help(bot, msg, ctx).await,
        Command::Events => events::handle_events_list(bot, msg, ctx).await,
        Command::MyEvents => events::handle_my_events(bot, msg, ctx).await,
        Command::News => news::handle_news(bot, msg, ctx).await,
        Command::Admin => admin::handle_admin_panel(bot, msg, ctx).await,
        Command::NewEvent => admin::handle_new_event(bot, msg, ctx).await,
        Command::Cancel => admin::handle_cancel(bot, msg, ctx).await,
    }
}
