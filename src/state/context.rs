//! Conversation context management
//!
//! Tracks which admin wizard a user is in, the current step, and the
//! answers collected so far.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, Duration};

use crate::utils::errors::{RunRaceError, Result};

/// Wizard data keys
pub mod keys {
    pub const NAME: &str = "name";
    pub const LOCATION: &str = "location";
    pub const CATEGORY: &str = "category";
    pub const EVENT_DATE: &str = "event_date";
    pub const BANNER_URL: &str = "banner_url";
    pub const STATUS: &str = "status";
    pub const EVENT_ID: &str = "event_id";
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const IMAGE_URL: &str = "image_url";
    pub const NEWS_ID: &str = "news_id";
}

/// User conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Telegram id this context belongs to
    pub user_id: i64,
    /// Current scenario the user is in
    pub scenario: Option<String>,
    /// Current step within the scenario
    pub step: Option<String>,
    /// Scenario-specific data
    pub data: HashMap<String, serde_json::Value>,
    /// When this context expires
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    /// Create a new conversation context for a user
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            scenario: None,
            step: None,
            data: HashMap::new(),
            expires_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Start a new scenario, discarding any previous answers
    pub fn start_scenario(&mut self, scenario: &str, initial_step: &str, ttl: Duration) {
        self.scenario = Some(scenario.to_string());
        self.step = Some(initial_step.to_string());
        self.data.clear();
        self.updated_at = Utc::now();
        self.expires_at = Some(Utc::now() + ttl);
    }

    /// Move to the next step in the current scenario
    pub fn next_step(&mut self, step: &str) -> Result<()> {
        if self.scenario.is_none() {
            return Err(RunRaceError::InvalidStateTransition {
                from: "no_scenario".to_string(),
                to: step.to_string(),
            });
        }

        self.step = Some(step.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Complete the current scenario and clear context
    pub fn complete_scenario(&mut self) {
        self.scenario = None;
        self.step = None;
        self.data.clear();
        self.expires_at = None;
        self.updated_at = Utc::now();
    }

    pub fn set_data<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), json_value);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn get_data<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_data::<String>(key).unwrap_or(None)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_data::<i64>(key).unwrap_or(None)
    }

    /// Fetch a value every later step depends on
    pub fn require<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T> {
        self.get_data(key)?.ok_or_else(|| {
            RunRaceError::InvalidInput(format!("Missing required context data: {}", key))
        })
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |expires_at| Utc::now() > expires_at)
    }

    pub fn set_expiry(&mut self, expires_at: DateTime<Utc>) {
        self.expires_at = Some(expires_at);
        self.updated_at = Utc::now();
    }

    pub fn is_in_scenario(&self, scenario: &str) -> bool {
        self.scenario.as_deref() == Some(scenario)
    }

    pub fn is_at_step(&self, step: &str) -> bool {
        self.step.as_deref() == Some(step)
    }

    pub fn is_at(&self, scenario: &str, step: &str) -> bool {
        self.is_in_scenario(scenario) && self.is_at_step(step)
    }

    /// Whether a wizard is in progress
    pub fn is_active(&self) -> bool {
        self.scenario.is_some() && !self.is_expired()
    }

    pub fn current_state(&self) -> (Option<&str>, Option<&str>) {
        (self.scenario.as_deref(), self.step.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_new_context() {
        let context = ConversationContext::new(123);
        assert_eq!(context.user_id, 123);
        assert!(context.scenario.is_none());
        assert!(context.step.is_none());
        assert!(context.data.is_empty());
        assert!(!context.is_active());
    }

    #[test]
    fn test_start_scenario() {
        let mut context = ConversationContext::new(123);
        context.set_data(keys::NAME, "stale").unwrap();
        context.start_scenario("event_creation", "name_input", Duration::hours(1));

        assert_eq!(context.current_state(), (Some("event_creation"), Some("name_input")));
        assert!(context.expires_at.is_some());
        assert!(context.data.is_empty());
        assert!(context.is_active());
    }

    #[test]
    fn test_next_step_requires_scenario() {
        let mut context = ConversationContext::new(123);
        assert_matches!(
            context.next_step("location_input"),
            Err(RunRaceError::InvalidStateTransition { .. })
        );
    }

    #[test]
    fn test_data_operations() {
        let mut context = ConversationContext::new(123);
        context.set_data(keys::NAME, "Borobudur Marathon").unwrap();
        context.set_data(keys::EVENT_ID, 42).unwrap();

        assert_eq!(context.get_string(keys::NAME), Some("Borobudur Marathon".to_string()));
        assert_eq!(context.get_i64(keys::EVENT_ID), Some(42));
        assert_eq!(context.get_string(keys::LOCATION), None);
        assert_eq!(context.require::<i64>(keys::EVENT_ID).unwrap(), 42);
        assert_matches!(context.require::<String>(keys::CATEGORY), Err(RunRaceError::InvalidInput(_)));
    }

    #[test]
    fn test_scenario_checks() {
        let mut context = ConversationContext::new(123);
        context.start_scenario("event_reschedule", "date_input", Duration::hours(1));

        assert!(context.is_in_scenario("event_reschedule"));
        assert!(!context.is_in_scenario("event_creation"));
        assert!(context.is_at("event_reschedule", "date_input"));

        context.complete_scenario();
        assert_eq!(context.current_state(), (None, None));
    }

    #[test]
    fn test_expiry() {
        let mut context = ConversationContext::new(123);
        context.start_scenario("event_creation", "name_input", Duration::hours(1));

        context.set_expiry(Utc::now() - Duration::hours(1));
        assert!(context.is_expired());
        assert!(!context.is_active());

        context.set_expiry(Utc::now() + Duration::hours(1));
        assert!(!context.is_expired());
    }
}
