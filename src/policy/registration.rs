//! Registration and withdrawal preconditions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::models::event::Event;
use crate::models::registration::Registration;
use super::decision::{evaluate, EffectiveStatus};
use super::error::{PolicyError, PolicyResult};

/// A registration that passed every precondition and may be inserted.
///
/// `registered_at` is stamped by the database on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    pub user_id: i64,
    pub event_id: i64,
}

/// Check whether `user_id` may register for `event` on `today`.
///
/// Checks run in order and the first failure wins: the event must exist, its
/// date must be outside the cutoff window, and the pair must not already be
/// registered. The stored status of the event is never consulted.
pub fn register_user(
    user_id: i64,
    event: Option<&Event>,
    today: NaiveDate,
    existing_registrations: &[Registration],
) -> PolicyResult<NewRegistration> {
    let event = event.ok_or(PolicyError::NotFound)?;

    let decision = evaluate(event.event_date, today);
    match decision.effective_status {
        EffectiveStatus::Completed => return Err(PolicyError::EventCompleted),
        EffectiveStatus::ClosedForRegistration => {
            return Err(PolicyError::RegistrationClosed {
                days_until_event: decision.days_until_event,
            })
        }
        EffectiveStatus::Open => {}
    }

    if is_registered(user_id, event.id, existing_registrations) {
        return Err(PolicyError::AlreadyRegistered);
    }

    Ok(NewRegistration {
        user_id,
        event_id: event.id,
    })
}

/// Check whether `user_id` may withdraw from `event_id`.
///
/// Withdrawal has no date restriction; only an existing registration is required.
pub fn unregister_user(
    user_id: i64,
    event_id: i64,
    existing_registrations: &[Registration],
) -> PolicyResult<()> {
    if is_registered(user_id, event_id, existing_registrations) {
        Ok(())
    } else {
        Err(PolicyError::NotRegistered)
    }
}

fn is_registered(user_id: i64, event_id: i64, registrations: &[Registration]) -> bool {
    registrations
        .iter()
        .any(|r| r.user_id == user_id && r.event_id == event_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use crate::models::event::EventStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event_on(id: i64, event_date: NaiveDate, status: EventStatus) -> Event {
        Event {
            id,
            name: "Jakarta Night Run".to_string(),
            location: "Senayan".to_string(),
            category: "10K".to_string(),
            event_date,
            status: status.to_string(),
            banner_url: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn registration(id: i64, user_id: i64, event_id: i64) -> Registration {
        Registration {
            id,
            user_id,
            event_id,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_event_is_not_found() {
        let result = register_user(1, None, date(2024, 1, 1), &[]);
        assert_eq!(result, Err(PolicyError::NotFound));
    }

    #[test]
    fn test_register_then_register_again() {
        let today = date(2024, 1, 1);
        let event = event_on(10, date(2024, 2, 1), EventStatus::Upcoming);
        let mut registrations = Vec::new();

        let first = register_user(1, Some(&event), today, &registrations).unwrap();
        assert_eq!(first, NewRegistration { user_id: 1, event_id: 10 });
        registrations.push(registration(100, first.user_id, first.event_id));

        let second = register_user(1, Some(&event), today, &registrations);
        assert_eq!(second, Err(PolicyError::AlreadyRegistered));
    }

    #[test]
    fn test_other_users_registrations_do_not_block() {
        let today = date(2024, 1, 1);
        let event = event_on(10, date(2024, 2, 1), EventStatus::Upcoming);
        let registrations = vec![registration(1, 2, 10), registration(2, 1, 11)];

        assert!(register_user(1, Some(&event), today, &registrations).is_ok());
    }

    #[test]
    fn test_stored_upcoming_does_not_override_cutoff() {
        let event = event_on(10, date(2024, 1, 8), EventStatus::Upcoming);
        let result = register_user(1, Some(&event), date(2024, 1, 1), &[]);
        assert_matches!(result, Err(PolicyError::RegistrationClosed { days_until_event: 7 }));
    }

    #[test]
    fn test_stored_completed_does_not_block_open_event() {
        let event = event_on(10, date(2024, 3, 1), EventStatus::Completed);
        assert!(register_user(1, Some(&event), date(2024, 1, 1), &[]).is_ok());
    }

    #[test]
    fn test_past_event_is_completed() {
        let event = event_on(10, date(2023, 12, 31), EventStatus::Upcoming);
        let result = register_user(1, Some(&event), date(2024, 1, 1), &[]);
        assert_eq!(result, Err(PolicyError::EventCompleted));
    }

    #[test]
    fn test_date_check_runs_before_duplicate_check() {
        let event = event_on(10, date(2024, 1, 3), EventStatus::Upcoming);
        let registrations = vec![registration(1, 1, 10)];
        let result = register_user(1, Some(&event), date(2024, 1, 1), &registrations);
        assert_matches!(result, Err(PolicyError::RegistrationClosed { .. }));
    }

    #[test]
    fn test_unregister_without_registration() {
        assert_eq!(unregister_user(1, 10, &[]), Err(PolicyError::NotRegistered));
        let others = vec![registration(1, 2, 10)];
        assert_eq!(unregister_user(1, 10, &others), Err(PolicyError::NotRegistered));
    }

    #[test]
    fn test_unregister_ignores_cutoff() {
        // Withdrawal takes no date at all, so a registration for an event
        // inside the window can still be cancelled.
        let registrations = vec![registration(1, 1, 10)];
        assert_eq!(unregister_user(1, 10, &registrations), Ok(()));
    }
}
