//! Event service implementation
//!
//! Listings and detail cards for members, and the administrator CRUD that
//! maintains the race calendar. Admin edits are not subject to the
//! registration cutoff; any date may be set.

use std::sync::Arc;
use chrono::NaiveDate;
use tracing::{debug, info};
use crate::database::repositories::{EventRepository, RegistrationRepository};
use crate::models::event::{Event, EventSummary, EventStatus, CreateEventRequest, UpdateEventRequest};
use crate::models::registration::Participant;
use crate::policy::RegistrationDecision;
use crate::services::auth::AuthService;
use crate::services::clock::Clock;
use crate::utils::errors::{RunRaceError, Result};
use crate::utils::helpers::{optional_url, required_text};
use crate::utils::logging::log_admin_action;

/// An event together with its registration decision for today
#[derive(Debug, Clone)]
pub struct EventCard {
    pub summary: EventSummary,
    pub decision: RegistrationDecision,
    /// Stored status disagrees with the date-derived status
    pub stale_status: bool,
}

/// Admin view of who registered for an event
#[derive(Debug, Clone)]
pub struct EventParticipants {
    pub event: EventSummary,
    pub participants: Vec<Participant>,
}

#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    registrations: RegistrationRepository,
    auth: AuthService,
    clock: Arc<dyn Clock>,
}

impl EventService {
    pub fn new(
        events: EventRepository,
        registrations: RegistrationRepository,
        auth: AuthService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { events, registrations, auth, clock }
    }

    /// Today in the event calendar's timezone
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// List events ordered by date, optionally by stored status
    pub async fn list_events(&self, filter: Option<EventStatus>) -> Result<Vec<EventSummary>> {
        debug!(filter = ?filter, "Listing events");
        self.events.list(filter).await
    }

    /// Events a member can still register for today
    pub async fn list_open_for_registration(&self) -> Result<Vec<EventSummary>> {
        let today = self.today();
        let events = self.events.list(None).await?;

        Ok(events
            .into_iter()
            .filter(|summary| summary.event.decision(today).can_register)
            .collect())
    }

    pub async fn get_event(&self, event_id: i64) -> Result<EventSummary> {
        self.events
            .get_summary(event_id)
            .await?
            .ok_or(RunRaceError::EventNotFound { event_id })
    }

    /// Build the detail card shown to members and admins
    pub async fn event_card(&self, event_id: i64) -> Result<EventCard> {
        let summary = self.get_event(event_id).await?;
        Ok(self.card_for(summary))
    }

    /// Decorate an already loaded summary with today's decision
    pub fn card_for(&self, summary: EventSummary) -> EventCard {
        let today = self.today();
        let decision = summary.event.decision(today);
        let stale_status = summary.event.status_is_stale(today);
        EventCard { summary, decision, stale_status }
    }

    pub async fn create_event(&self, actor: i64, mut request: CreateEventRequest) -> Result<Event> {
        self.auth.require_admin(actor)?;

        request.name = required_text("Event name", &request.name)?;
        request.location = required_text("Event location", &request.location)?;
        request.category = required_text("Event category", &request.category)?;
        request.banner_url = optional_url(request.banner_url)?;
        request.created_by = Some(actor);

        let event = self.events.create(request).await?;
        info!(event_id = event.id, event_date = %event.event_date, "Event created");
        log_admin_action(actor, "create_event", Some(&event.id.to_string()), Some(&event.name));

        Ok(event)
    }

    pub async fn update_event(&self, actor: i64, event_id: i64, mut request: UpdateEventRequest) -> Result<Event> {
        self.auth.require_admin(actor)?;

        if self.events.find_by_id(event_id).await?.is_none() {
            return Err(RunRaceError::EventNotFound { event_id });
        }

        if let Some(name) = &request.name {
            request.name = Some(required_text("Event name", name)?);
        }
        if let Some(location) = &request.location {
            request.location = Some(required_text("Event location", location)?);
        }
        if let Some(category) = &request.category {
            request.category = Some(required_text("Event category", category)?);
        }
        request.banner_url = if request.clear_banner { None } else { optional_url(request.banner_url)? };

        let event = self.events.update(event_id, request).await?;
        info!(event_id = event_id, "Event updated");
        log_admin_action(actor, "update_event", Some(&event_id.to_string()), None);

        Ok(event)
    }

    /// Change only the stored (display) status
    pub async fn set_status(&self, actor: i64, event_id: i64, status: EventStatus) -> Result<Event> {
        let request = UpdateEventRequest {
            status: Some(status),
            ..Default::default()
        };
        self.update_event(actor, event_id, request).await
    }

    /// Move an event to a new date
    pub async fn reschedule(&self, actor: i64, event_id: i64, event_date: NaiveDate) -> Result<Event> {
        let request = UpdateEventRequest {
            event_date: Some(event_date),
            ..Default::default()
        };
        self.update_event(actor, event_id, request).await
    }

    /// Delete an event; its registrations go with it
    pub async fn delete_event(&self, actor: i64, event_id: i64) -> Result<()> {
        self.auth.require_admin(actor)?;

        if !self.events.delete(event_id).await? {
            return Err(RunRaceError::EventNotFound { event_id });
        }

        log_admin_action(actor, "delete_event", Some(&event_id.to_string()), None);
        Ok(())
    }

    pub async fn participants(&self, actor: i64, event_id: i64) -> Result<EventParticipants> {
        self.auth.require_admin(actor)?;

        let event = self.get_event(event_id).await?;
        let participants = self.registrations.participants(event_id).await?;

        Ok(EventParticipants { event, participants })
    }
}
