//! Event repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::event::{Event, EventSummary, EventStatus, CreateEventRequest, UpdateEventRequest};
use crate::utils::errors::RunRaceError;

const EVENT_COLUMNS: &str =
    "id, name, location, category, event_date, status, banner_url, created_by, created_at, updated_at";

/// Events joined with their registration counts
const SUMMARY_SELECT: &str = r#"
    SELECT e.id, e.name, e.location, e.category, e.event_date, e.status, e.banner_url,
           e.created_by, e.created_at, e.updated_at,
           COUNT(r.id) AS registration_count
    FROM events e
    LEFT JOIN registrations r ON r.event_id = e.id
"#;

#[derive(Clone)]
#[derive(Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, request: CreateEventRequest) -> Result<Event, RunRaceError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, location, category, event_date, status, banner_url, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(request.name)
        .bind(request.location)
        .bind(request.category)
        .bind(request.event_date)
        .bind(request.status.as_str())
        .bind(request.banner_url)
        .bind(request.created_by)
        .bind(Utc::now())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, RunRaceError> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Update event, leaving absent fields untouched
    pub async fn update(&self, id: i64, request: UpdateEventRequest) -> Result<Event, RunRaceError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET name = COALESCE($2, name),
                location = COALESCE($3, location),
                category = COALESCE($4, category),
                event_date = COALESCE($5, event_date),
                status = COALESCE($6, status),
                banner_url = CASE WHEN $9 THEN NULL ELSE COALESCE($7, banner_url) END,
                updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(request.name)
        .bind(request.location)
        .bind(request.category)
        .bind(request.event_date)
        .bind(request.status.map(|status| status.as_str()))
        .bind(request.banner_url)
        .bind(Utc::now())
        .bind(request.clear_banner)
        .fetch_optional(&self.pool)
        .await?;

        event.ok_or(RunRaceError::EventNotFound { event_id: id })
    }

    /// Delete event; registrations cascade. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, RunRaceError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List events by date, optionally filtered by stored status
    pub async fn list(&self, status: Option<EventStatus>) -> Result<Vec<EventSummary>, RunRaceError> {
        let events = sqlx::query_as::<_, EventSummary>(&format!(
            "{} WHERE ($1::TEXT IS NULL OR e.status = $1) GROUP BY e.id ORDER BY e.event_date ASC, e.id ASC",
            SUMMARY_SELECT
        ))
        .bind(status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Get a single event with its registration count
    pub async fn get_summary(&self, id: i64) -> Result<Option<EventSummary>, RunRaceError> {
        let event = sqlx::query_as::<_, EventSummary>(&format!(
            "{} WHERE e.id = $1 GROUP BY e.id",
            SUMMARY_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Count total events
    pub async fn count(&self) -> Result<i64, RunRaceError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
