//! Registration repository implementation

use sqlx::PgPool;
use crate::models::registration::{Registration, Participant, RegisteredEvent};
use crate::policy::NewRegistration;
use crate::utils::errors::RunRaceError;

#[derive(Clone)]
#[derive(Debug)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a registration, stamping the server time.
    ///
    /// A duplicate `(user_id, event_id)` surfaces as a unique-violation
    /// database error; callers decide how to report it.
    pub async fn insert(&self, registration: NewRegistration) -> Result<Registration, RunRaceError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (user_id, event_id, registered_at)
            VALUES ($1, $2, NOW())
            RETURNING id, user_id, event_id, registered_at
            "#
        )
        .bind(registration.user_id)
        .bind(registration.event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(registration)
    }

    /// Delete the registration for a pair, returning rows affected
    pub async fn delete(&self, user_id: i64, event_id: i64) -> Result<u64, RunRaceError> {
        let result = sqlx::query("DELETE FROM registrations WHERE user_id = $1 AND event_id = $2")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Registrations matching a user and event (zero or one row)
    pub async fn find_for_pair(&self, user_id: i64, event_id: i64) -> Result<Vec<Registration>, RunRaceError> {
        let registrations = sqlx::query_as::<_, Registration>(
            "SELECT id, user_id, event_id, registered_at FROM registrations WHERE user_id = $1 AND event_id = $2"
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    /// Events a user registered for, soonest first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<RegisteredEvent>, RunRaceError> {
        let events = sqlx::query_as::<_, RegisteredEvent>(
            r#"
            SELECT e.id, e.name, e.location, e.category, e.event_date, e.status, e.banner_url,
                   e.created_by, e.created_at, e.updated_at, r.registered_at
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.user_id = $1
            ORDER BY e.event_date ASC
            "#
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Participants of an event, most recent registration first
    pub async fn participants(&self, event_id: i64) -> Result<Vec<Participant>, RunRaceError> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT r.id AS registration_id, u.id AS user_id, u.telegram_id, u.username,
                   u.first_name, u.last_name, r.registered_at
            FROM registrations r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1
            ORDER BY r.registered_at DESC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Number of registrations for an event
    pub async fn count_for_event(&self, event_id: i64) -> Result<i64, RunRaceError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count total registrations
    pub async fn count(&self) -> Result<i64, RunRaceError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
