//! Conversation scenarios implementation
//!
//! Defines the admin wizards for the race calendar and the news feed.
//! Each scenario is a small graph of steps with per-step input validation.

use std::collections::HashMap;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use crate::models::event::EventStatus;
use crate::services::news::MAX_CONTENT_LENGTH;
use crate::utils::errors::{RunRaceError, Result};
use crate::utils::helpers::parse_event_date;
use super::context::ConversationContext;

pub const EVENT_CREATION: &str = "event_creation";
pub const EVENT_RESCHEDULE: &str = "event_reschedule";
pub const EVENT_EDIT: &str = "event_edit";
pub const NEWS_CREATION: &str = "news_creation";
pub const NEWS_EDIT: &str = "news_edit";

/// Answer that leaves an optional field empty
pub const SKIP_INPUT: &str = "-";

/// Step identifiers
pub mod steps {
    pub const NAME_INPUT: &str = "name_input";
    pub const LOCATION_INPUT: &str = "location_input";
    pub const CATEGORY_INPUT: &str = "category_input";
    pub const DATE_INPUT: &str = "date_input";
    pub const BANNER_INPUT: &str = "banner_input";
    pub const STATUS_INPUT: &str = "status_input";
    pub const TITLE_INPUT: &str = "title_input";
    pub const CONTENT_INPUT: &str = "content_input";
    pub const IMAGE_INPUT: &str = "image_input";
    /// Edit wizards wait here until a field button is pressed
    pub const FIELD_CHOICE: &str = "field_choice";
    pub const CONFIRMATION: &str = "confirmation";
    pub const DONE: &str = "done";
}

/// Represents a conversation scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub initial_step: String,
    pub steps: HashMap<String, ScenarioStep>,
    /// Maximum duration for this scenario (in seconds)
    pub max_duration: Option<u64>,
}

/// Represents a step within a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub id: String,
    /// Possible next steps from this step
    pub next_steps: Vec<String>,
    /// Whether this step is answered by a text message
    pub requires_input: bool,
    pub validation: Option<StepValidation>,
}

/// Validation rules for a scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepValidation {
    pub input_type: InputType,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Pattern to match (regex)
    pub pattern: Option<String>,
    pub error_message: Option<String>,
}

/// Types of input expected in a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputType {
    Text,
    Date,
    /// An http(s) link, or [`SKIP_INPUT`]
    OptionalUrl,
    Choice(Vec<String>),
}

/// Scenario manager for handling all conversation scenarios
#[derive(Debug, Clone)]
pub struct ScenarioManager {
    scenarios: HashMap<String, Scenario>,
}

impl Default for ScenarioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioManager {
    /// Create a new scenario manager with the admin wizards registered
    pub fn new() -> Self {
        let mut manager = Self {
            scenarios: HashMap::new(),
        };

        manager.register_scenario(create_event_creation_scenario());
        manager.register_scenario(create_event_reschedule_scenario());
        manager.register_scenario(create_event_edit_scenario());
        manager.register_scenario(create_news_creation_scenario());
        manager.register_scenario(create_news_edit_scenario());
        manager
    }

    pub fn register_scenario(&mut self, scenario: Scenario) {
        self.scenarios.insert(scenario.id.clone(), scenario);
    }

    pub fn get_scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    fn scenario(&self, id: &str) -> Result<&Scenario> {
        self.get_scenario(id)
            .ok_or_else(|| RunRaceError::InvalidInput(format!("Unknown scenario: {}", id)))
    }

    /// Start a scenario for a user
    pub fn start_scenario(&self, context: &mut ConversationContext, scenario_id: &str, default_ttl: Duration) -> Result<()> {
        let scenario = self.scenario(scenario_id)?;

        let ttl = scenario
            .max_duration
            .map(|seconds| Duration::seconds(seconds as i64))
            .unwrap_or(default_ttl);
        context.start_scenario(scenario_id, &scenario.initial_step, ttl);

        Ok(())
    }

    /// Move to the next step in a scenario
    pub fn next_step(&self, context: &mut ConversationContext, next_step: &str) -> Result<()> {
        let current_step = self.get_current_step(context).map_err(|_| RunRaceError::InvalidStateTransition {
            from: context.step.clone().unwrap_or_else(|| "no_step".to_string()),
            to: next_step.to_string(),
        })?;

        if !current_step.next_steps.iter().any(|step| step == next_step) {
            return Err(RunRaceError::InvalidStateTransition {
                from: current_step.id.clone(),
                to: next_step.to_string(),
            });
        }

        context.next_step(next_step)
    }

    /// Validate user input for the current step
    pub fn validate_input(&self, context: &ConversationContext, input: &str) -> Result<()> {
        let step = self.get_current_step(context)?;

        if let Some(validation) = &step.validation {
            validate_input_against_rules(input, validation)?;
        }

        Ok(())
    }

    /// Get the current step information
    pub fn get_current_step(&self, context: &ConversationContext) -> Result<&ScenarioStep> {
        let scenario_id = context.scenario.as_deref()
            .ok_or_else(|| RunRaceError::InvalidInput("No active scenario".to_string()))?;

        let step_id = context.step.as_deref()
            .ok_or_else(|| RunRaceError::InvalidInput("No active step".to_string()))?;

        self.scenario(scenario_id)?
            .steps
            .get(step_id)
            .ok_or_else(|| RunRaceError::InvalidInput(format!("Unknown step: {}", step_id)))
    }
}

/// Validate input against validation rules
fn validate_input_against_rules(input: &str, validation: &StepValidation) -> Result<()> {
    let input = input.trim();
    let length = input.chars().count();

    if let Some(min_length) = validation.min_length {
        if length < min_length {
            return Err(RunRaceError::InvalidInput(
                validation.error_message.clone()
                    .unwrap_or_else(|| format!("Input too short (minimum {} characters)", min_length))
            ));
        }
    }

    if let Some(max_length) = validation.max_length {
        if length > max_length {
            return Err(RunRaceError::InvalidInput(
                validation.error_message.clone()
                    .unwrap_or_else(|| format!("Input too long (maximum {} characters)", max_length))
            ));
        }
    }

    if let Some(pattern) = &validation.pattern {
        let regex = regex::Regex::new(pattern)
            .map_err(|_| RunRaceError::Config("Invalid regex pattern".to_string()))?;

        if !regex.is_match(input) {
            return Err(RunRaceError::InvalidInput(
                validation.error_message.clone()
                    .unwrap_or_else(|| "Input format is invalid".to_string())
            ));
        }
    }

    match &validation.input_type {
        InputType::Date => {
            parse_event_date(input)?;
        }
        InputType::OptionalUrl if input == SKIP_INPUT => {}
        InputType::OptionalUrl => {
            let is_web_link = url::Url::parse(input)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !is_web_link {
                return Err(RunRaceError::InvalidInput(
                    validation.error_message.clone()
                        .unwrap_or_else(|| "Only http and https links are accepted".to_string())
                ));
            }
        }
        InputType::Choice(choices) => {
            if !choices.iter().any(|choice| choice == input) {
                return Err(RunRaceError::InvalidInput(
                    format!("Invalid choice. Available options: {}", choices.join(", "))
                ));
            }
        }
        InputType::Text => {}
    }

    Ok(())
}

fn text_step(id: &str, next: &str, max_length: usize, error_message: &str) -> ScenarioStep {
    ScenarioStep {
        id: id.to_string(),
        next_steps: vec![next.to_string()],
        requires_input: true,
        validation: Some(StepValidation {
            input_type: InputType::Text,
            min_length: Some(2),
            max_length: Some(max_length),
            pattern: None,
            error_message: Some(error_message.to_string()),
        }),
    }
}

fn category_step(next: &str) -> ScenarioStep {
    ScenarioStep {
        id: steps::CATEGORY_INPUT.to_string(),
        next_steps: vec![next.to_string()],
        requires_input: true,
        validation: Some(StepValidation {
            input_type: InputType::Text,
            min_length: Some(1),
            max_length: Some(100),
            pattern: Some(r"^[\p{L}\p{N}][\p{L}\p{N} .,/+&-]*$".to_string()),
            error_message: Some("Category should be a short label such as 5K or Half Marathon".to_string()),
        }),
    }
}

fn link_step(id: &str, next: &str) -> ScenarioStep {
    ScenarioStep {
        id: id.to_string(),
        next_steps: vec![next.to_string()],
        requires_input: true,
        validation: Some(StepValidation {
            input_type: InputType::OptionalUrl,
            min_length: Some(1),
            max_length: Some(2048),
            pattern: None,
            error_message: Some("Send an http(s) link, or - to leave it empty".to_string()),
        }),
    }
}

fn content_step(next: &str) -> ScenarioStep {
    ScenarioStep {
        id: steps::CONTENT_INPUT.to_string(),
        next_steps: vec![next.to_string()],
        requires_input: true,
        validation: Some(StepValidation {
            input_type: InputType::Text,
            min_length: Some(10),
            max_length: Some(MAX_CONTENT_LENGTH),
            pattern: None,
            error_message: Some(format!("Article text should be 10-{} characters", MAX_CONTENT_LENGTH)),
        }),
    }
}

fn final_step(id: &str) -> ScenarioStep {
    ScenarioStep {
        id: id.to_string(),
        next_steps: vec![],
        requires_input: false,
        validation: None,
    }
}

/// Entry step of the edit wizards, one exit per editable field
fn field_choice_step(fields: &[&str]) -> ScenarioStep {
    ScenarioStep {
        id: steps::FIELD_CHOICE.to_string(),
        next_steps: fields.iter().map(|field| field.to_string()).collect(),
        requires_input: false,
        validation: None,
    }
}

fn date_step(next: &str) -> ScenarioStep {
    ScenarioStep {
        id: steps::DATE_INPUT.to_string(),
        next_steps: vec![next.to_string()],
        requires_input: true,
        validation: Some(StepValidation {
            input_type: InputType::Date,
            min_length: None,
            max_length: None,
            pattern: Some(r"^\d{1,4}[-./]\d{1,2}[-./]\d{1,4}$".to_string()),
            error_message: Some("Date must look like YYYY-MM-DD".to_string()),
        }),
    }
}

fn create_event_creation_scenario() -> Scenario {
    let mut steps = HashMap::new();
    let mut add = |step: ScenarioStep| {
        steps.insert(step.id.clone(), step);
    };

    add(text_step(steps::NAME_INPUT, steps::LOCATION_INPUT, 255, "Event name should be 2-255 characters"));
    add(text_step(steps::LOCATION_INPUT, steps::CATEGORY_INPUT, 255, "Location should be 2-255 characters"));
    add(category_step(steps::DATE_INPUT));
    add(date_step(steps::BANNER_INPUT));
    add(link_step(steps::BANNER_INPUT, steps::STATUS_INPUT));
    add(ScenarioStep {
        id: steps::STATUS_INPUT.to_string(),
        next_steps: vec![steps::CONFIRMATION.to_string()],
        requires_input: false,
        validation: Some(StepValidation {
            input_type: InputType::Choice(
                EventStatus::ALL.iter().map(|status| status.as_str().to_string()).collect(),
            ),
            min_length: None,
            max_length: None,
            pattern: None,
            error_message: None,
        }),
    });
    add(final_step(steps::CONFIRMATION));

    Scenario {
        id: EVENT_CREATION.to_string(),
        name: "Event Creation".to_string(),
        initial_step: steps::NAME_INPUT.to_string(),
        steps,
        max_duration: Some(3600),
    }
}

fn create_event_reschedule_scenario() -> Scenario {
    let mut steps = HashMap::new();
    steps.insert(steps::DATE_INPUT.to_string(), date_step(steps::DONE));
    steps.insert(steps::DONE.to_string(), final_step(steps::DONE));

    Scenario {
        id: EVENT_RESCHEDULE.to_string(),
        name: "Event Reschedule".to_string(),
        initial_step: steps::DATE_INPUT.to_string(),
        steps,
        max_duration: Some(900),
    }
}

fn create_event_edit_scenario() -> Scenario {
    let fields = [
        text_step(steps::NAME_INPUT, steps::DONE, 255, "Event name should be 2-255 characters"),
        text_step(steps::LOCATION_INPUT, steps::DONE, 255, "Location should be 2-255 characters"),
        category_step(steps::DONE),
        link_step(steps::BANNER_INPUT, steps::DONE),
    ];

    Scenario {
        id: EVENT_EDIT.to_string(),
        name: "Event Edit".to_string(),
        initial_step: steps::FIELD_CHOICE.to_string(),
        steps: edit_steps(fields),
        max_duration: Some(900),
    }
}

fn create_news_creation_scenario() -> Scenario {
    let mut steps = HashMap::new();
    for step in [
        text_step(steps::TITLE_INPUT, steps::CONTENT_INPUT, 255, "Title should be 2-255 characters"),
        content_step(steps::IMAGE_INPUT),
        link_step(steps::IMAGE_INPUT, steps::CONFIRMATION),
        final_step(steps::CONFIRMATION),
    ] {
        steps.insert(step.id.clone(), step);
    }

    Scenario {
        id: NEWS_CREATION.to_string(),
        name: "News Creation".to_string(),
        initial_step: steps::TITLE_INPUT.to_string(),
        steps,
        max_duration: Some(3600),
    }
}

fn create_news_edit_scenario() -> Scenario {
    let fields = [
        text_step(steps::TITLE_INPUT, steps::DONE, 255, "Title should be 2-255 characters"),
        content_step(steps::DONE),
        link_step(steps::IMAGE_INPUT, steps::DONE),
    ];

    Scenario {
        id: NEWS_EDIT.to_string(),
        name: "News Edit".to_string(),
        initial_step: steps::FIELD_CHOICE.to_string(),
        steps: edit_steps(fields),
        max_duration: Some(1800),
    }
}

fn edit_steps<const N: usize>(fields: [ScenarioStep; N]) -> HashMap<String, ScenarioStep> {
    let ids: Vec<&str> = fields.iter().map(|step| step.id.as_str()).collect();
    let mut steps = HashMap::new();
    steps.insert(steps::FIELD_CHOICE.to_string(), field_choice_step(&ids));
    for step in fields {
        steps.insert(step.id.clone(), step);
    }
    steps.insert(steps::DONE.to_string(), final_step(steps::DONE));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn started(scenario: &str) -> (ScenarioManager, ConversationContext) {
        let manager = ScenarioManager::new();
        let mut context = ConversationContext::new(555);
        manager.start_scenario(&mut context, scenario, Duration::hours(1)).unwrap();
        (manager, context)
    }

    #[test]
    fn test_scenarios_registered() {
        let manager = ScenarioManager::new();
        assert!(manager.get_scenario(EVENT_CREATION).is_some());
        assert!(manager.get_scenario(EVENT_RESCHEDULE).is_some());
        assert!(manager.get_scenario(EVENT_EDIT).is_some());
        assert!(manager.get_scenario(NEWS_CREATION).is_some());
        assert!(manager.get_scenario(NEWS_EDIT).is_some());
        assert!(manager.get_scenario("onboarding").is_none());
    }

    #[test]
    fn test_creation_walks_every_step() {
        let (manager, mut context) = started(EVENT_CREATION);
        assert!(context.is_at(EVENT_CREATION, steps::NAME_INPUT));

        for step in [
            steps::LOCATION_INPUT,
            steps::CATEGORY_INPUT,
            steps::DATE_INPUT,
            steps::BANNER_INPUT,
            steps::STATUS_INPUT,
            steps::CONFIRMATION,
        ] {
            manager.next_step(&mut context, step).unwrap();
            assert!(context.is_at_step(step));
        }
    }

    #[test]
    fn test_skipping_steps_rejected() {
        let (manager, mut context) = started(EVENT_CREATION);
        assert_matches!(
            manager.next_step(&mut context, steps::DATE_INPUT),
            Err(RunRaceError::InvalidStateTransition { .. })
        );
        assert!(context.is_at_step(steps::NAME_INPUT));
    }

    #[test]
    fn test_name_validation() {
        let (manager, context) = started(EVENT_CREATION);
        assert!(manager.validate_input(&context, "Jakarta Marathon").is_ok());
        assert!(manager.validate_input(&context, "J").is_err());
        assert!(manager.validate_input(&context, &"x".repeat(256)).is_err());
    }

    #[test]
    fn test_category_pattern() {
        let (manager, mut context) = started(EVENT_CREATION);
        manager.next_step(&mut context, steps::LOCATION_INPUT).unwrap();
        manager.next_step(&mut context, steps::CATEGORY_INPUT).unwrap();

        assert!(manager.validate_input(&context, "10K").is_ok());
        assert!(manager.validate_input(&context, "Half Marathon").is_ok());
        assert!(manager.validate_input(&context, "<script>").is_err());
    }

    #[test]
    fn test_date_validation() {
        let (manager, context) = started(EVENT_RESCHEDULE);
        assert!(manager.validate_input(&context, "2025-11-16").is_ok());
        assert!(manager.validate_input(&context, "16.11.2025").is_ok());
        assert!(manager.validate_input(&context, "2025-13-01").is_err());
        assert!(manager.validate_input(&context, "tomorrow").is_err());
    }

    #[test]
    fn test_status_choice_validation() {
        let (manager, mut context) = started(EVENT_CREATION);
        for step in [
            steps::LOCATION_INPUT,
            steps::CATEGORY_INPUT,
            steps::DATE_INPUT,
            steps::BANNER_INPUT,
            steps::STATUS_INPUT,
        ] {
            manager.next_step(&mut context, step).unwrap();
        }

        assert!(manager.validate_input(&context, "upcoming").is_ok());
        assert!(manager.validate_input(&context, "cancelled").is_err());
    }

    #[test]
    fn test_banner_accepts_link_or_skip() {
        let (manager, mut context) = started(EVENT_CREATION);
        for step in [steps::LOCATION_INPUT, steps::CATEGORY_INPUT, steps::DATE_INPUT, steps::BANNER_INPUT] {
            manager.next_step(&mut context, step).unwrap();
        }

        assert!(manager.validate_input(&context, "https://cdn.example.com/borobudur.jpg").is_ok());
        assert!(manager.validate_input(&context, SKIP_INPUT).is_ok());
        assert_matches!(manager.validate_input(&context, "borobudur.jpg"), Err(RunRaceError::InvalidInput(_)));
        assert_matches!(manager.validate_input(&context, "ftp://cdn.example.com/a.jpg"), Err(RunRaceError::InvalidInput(_)));
    }

    #[test]
    fn test_event_edit_branches_to_one_field() {
        let (manager, mut context) = started(EVENT_EDIT);
        assert!(context.is_at_step(steps::FIELD_CHOICE));

        manager.next_step(&mut context, steps::CATEGORY_INPUT).unwrap();
        assert!(manager.validate_input(&context, "Ultra 50K").is_ok());
        assert!(manager.next_step(&mut context, steps::NAME_INPUT).is_err());
        manager.next_step(&mut context, steps::DONE).unwrap();

        let (manager, mut context) = started(EVENT_EDIT);
        assert!(manager.next_step(&mut context, steps::DATE_INPUT).is_err());
    }

    #[test]
    fn test_news_creation_walks_every_step() {
        let (manager, mut context) = started(NEWS_CREATION);
        assert!(context.is_at_step(steps::TITLE_INPUT));

        manager.next_step(&mut context, steps::CONTENT_INPUT).unwrap();
        assert!(manager.validate_input(&context, "too short").is_err());
        assert!(manager.validate_input(&context, "Race packs can be collected from Friday.").is_ok());

        manager.next_step(&mut context, steps::IMAGE_INPUT).unwrap();
        manager.next_step(&mut context, steps::CONFIRMATION).unwrap();
    }

    #[test]
    fn test_news_edit_fields() {
        let (manager, mut context) = started(NEWS_EDIT);
        manager.next_step(&mut context, steps::IMAGE_INPUT).unwrap();
        assert!(manager.validate_input(&context, SKIP_INPUT).is_ok());

        let (manager, mut context) = started(NEWS_EDIT);
        assert!(manager.next_step(&mut context, steps::BANNER_INPUT).is_err());
    }

    #[test]
    fn test_reschedule_finishes() {
        let (manager, mut context) = started(EVENT_RESCHEDULE);
        manager.next_step(&mut context, steps::DONE).unwrap();
        assert!(manager.next_step(&mut context, steps::DATE_INPUT).is_err());
    }

    #[test]
    fn test_unknown_scenario() {
        let manager = ScenarioManager::new();
        let mut context = ConversationContext::new(1);
        assert_matches!(
            manager.start_scenario(&mut context, "checkout", Duration::hours(1)),
            Err(RunRaceError::InvalidInput(_))
        );
    }
}
