//! Registration model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::event::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub registered_at: DateTime<Utc>,
}

/// A registered participant as shown to administrators
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub registration_id: i64,
    pub user_id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Participant {
    pub fn display_name(&self) -> String {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        match (&self.username, full_name.is_empty()) {
            (Some(username), true) => format!("@{}", username),
            (Some(username), false) => format!("{} (@{})", full_name, username),
            (None, false) => full_name,
            (None, true) => format!("#{}", self.telegram_id),
        }
    }
}

/// An event a user registered for, with the registration time
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegisteredEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(username: Option<&str>, first: Option<&str>, last: Option<&str>) -> Participant {
        Participant {
            registration_id: 1,
            user_id: 2,
            telegram_id: 3003,
            username: username.map(str::to_string),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(participant(Some("budi"), Some("Budi"), Some("Santoso")).display_name(), "Budi Santoso (@budi)");
        assert_eq!(participant(Some("budi"), None, None).display_name(), "@budi");
        assert_eq!(participant(None, Some("Siti"), None).display_name(), "Siti");
        assert_eq!(participant(None, None, None).display_name(), "#3003");
    }
}
