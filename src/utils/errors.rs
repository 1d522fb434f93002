//! Error handling for RunRace
//!
//! This module defines the main error type used throughout the application.
//! Registration rule violations live in [`crate::policy::PolicyError`] and are
//! wrapped here so handlers can propagate everything with `?`.

use thiserror::Error;
use crate::policy::PolicyError;

/// Main error type for RunRace application
#[derive(Error, Debug)]
pub enum RunRaceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Registration rejected: {0}")]
    Policy(#[from] PolicyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("News article not found: {news_id}")]
    NewsNotFound { news_id: i64 },

    #[error("User is banned: {user_id}")]
    UserBanned { user_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for RunRace operations
pub type Result<T> = std::result::Result<T, RunRaceError>;

impl RunRaceError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            RunRaceError::Database(_) => false,
            RunRaceError::Migration(_) => false,
            RunRaceError::Telegram(_) => true,
            RunRaceError::Policy(_) => true,
            RunRaceError::Config(_) => false,
            RunRaceError::PermissionDenied(_) => false,
            RunRaceError::UserNotFound { .. } => false,
            RunRaceError::EventNotFound { .. } => false,
            RunRaceError::NewsNotFound { .. } => false,
            RunRaceError::UserBanned { .. } => false,
            RunRaceError::InvalidStateTransition { .. } => false,
            RunRaceError::Redis(_) => true,
            RunRaceError::Serialization(_) => false,
            RunRaceError::Io(_) => true,
            RunRaceError::UrlParse(_) => false,
            RunRaceError::RateLimitExceeded => true,
            RunRaceError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RunRaceError::Database(_) => ErrorSeverity::Critical,
            RunRaceError::Migration(_) => ErrorSeverity::Critical,
            RunRaceError::Config(_) => ErrorSeverity::Critical,
            RunRaceError::PermissionDenied(_) => ErrorSeverity::Warning,
            RunRaceError::RateLimitExceeded => ErrorSeverity::Warning,
            RunRaceError::Policy(_) => ErrorSeverity::Info,
            RunRaceError::EventNotFound { .. } | RunRaceError::NewsNotFound { .. } => ErrorSeverity::Info,
            RunRaceError::UserBanned { .. } => ErrorSeverity::Warning,
            RunRaceError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP-style status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            RunRaceError::Policy(e) => e.status_code(),
            RunRaceError::EventNotFound { .. }
            | RunRaceError::NewsNotFound { .. }
            | RunRaceError::UserNotFound { .. } => 404,
            RunRaceError::InvalidInput(_) | RunRaceError::InvalidStateTransition { .. } => 400,
            RunRaceError::PermissionDenied(_) | RunRaceError::UserBanned { .. } => 403,
            RunRaceError::RateLimitExceeded => 429,
            _ => 500,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
