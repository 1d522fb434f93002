//! Event model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use crate::policy::{self, RegistrationDecision};
use crate::utils::errors::RunRaceError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub category: String,
    pub event_date: NaiveDate,
    /// Administrator-set status, display only
    pub status: String,
    pub banner_url: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Evaluate the registration policy for this event
    pub fn decision(&self, today: NaiveDate) -> RegistrationDecision {
        policy::evaluate(self.event_date, today)
    }

    pub fn stored_status(&self) -> Option<EventStatus> {
        self.status.parse().ok()
    }

    /// Whether the stored status disagrees with the date-derived one
    pub fn status_is_stale(&self, today: NaiveDate) -> bool {
        let derived = self.decision(today).effective_status.legacy_status();
        self.stored_status() != Some(derived)
    }
}

/// Event row with its registration count, as listed to users
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub registration_count: i64,
}

/// Stored event status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 3] = [EventStatus::Upcoming, EventStatus::Ongoing, EventStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = RunRaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "completed" => Ok(EventStatus::Completed),
            other => Err(RunRaceError::InvalidInput(format!("Invalid event status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub location: String,
    pub category: String,
    pub event_date: NaiveDate,
    pub status: EventStatus,
    pub banner_url: Option<String>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub status: Option<EventStatus>,
    pub banner_url: Option<String>,
    /// Remove the banner; wins over `banner_url`
    #[serde(default)]
    pub clear_banner: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_date: NaiveDate, status: &str) -> Event {
        Event {
            id: 1,
            name: "Bandung Half Marathon".to_string(),
            location: "Gedung Sate".to_string(),
            category: "21K".to_string(),
            event_date,
            status: status.to_string(),
            banner_url: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("upcoming".parse::<EventStatus>().unwrap(), EventStatus::Upcoming);
        assert_eq!(" Ongoing ".parse::<EventStatus>().unwrap(), EventStatus::Ongoing);
        assert!("cancelled".parse::<EventStatus>().is_err());
    }

    #[test]
    fn test_stale_status_detection() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let past = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let far = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        assert!(event(past, "upcoming").status_is_stale(today));
        assert!(!event(past, "completed").status_is_stale(today));
        assert!(!event(far, "upcoming").status_is_stale(today));
        assert!(event(far, "garbage").status_is_stale(today));
    }
}
