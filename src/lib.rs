//! RunRace Telegram Bot
//!
//! Registration for community running races. Members browse the race
//! calendar and sign up; registration closes seven days before race day
//! (the "H-7" cutoff). Administrators maintain the calendar and a small
//! news feed from the chat.
//!
//! The cutoff rule itself lives in [`policy`] and has no I/O.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod policy;
pub mod state;
pub mod i18n;
pub mod utils;
pub mod middleware;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{RunRaceError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use state::{ScenarioManager, StateStorage};
pub use i18n::I18n;
pub use policy::{
    evaluate, register_user, unregister_user, EffectiveStatus, PolicyError, RegistrationDecision,
    REGISTRATION_CUTOFF_DAYS,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
