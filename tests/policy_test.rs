//! Registration cutoff behaviour through the public policy API

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;

use RunRace::models::event::Event;
use RunRace::models::registration::Registration;
use RunRace::policy::{
    evaluate, register_user, unregister_user, EffectiveStatus, NewRegistration, PolicyError,
    REGISTRATION_CUTOFF_DAYS,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

fn event_in(days: i64) -> Event {
    Event {
        id: 10,
        name: "Jakarta Marathon".to_string(),
        location: "Monas".to_string(),
        category: "42K".to_string(),
        event_date: today() + Duration::days(days),
        // Stored status is display only; it contradicts the date here
        status: "completed".to_string(),
        banner_url: None,
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn registration(user_id: i64, event_id: i64) -> Registration {
    Registration { id: 1, user_id, event_id, registered_at: Utc::now() }
}

#[test]
fn test_cutoff_boundaries() {
    let cases = [
        (30, EffectiveStatus::Open, true),
        (8, EffectiveStatus::Open, true),
        (7, EffectiveStatus::ClosedForRegistration, false),
        (1, EffectiveStatus::ClosedForRegistration, false),
        (0, EffectiveStatus::ClosedForRegistration, false),
        (-1, EffectiveStatus::Completed, false),
    ];

    for (days, status, can_register) in cases {
        let decision = evaluate(today() + Duration::days(days), today());
        assert_eq!(decision.effective_status, status, "H-{}", days);
        assert_eq!(decision.can_register, can_register, "H-{}", days);
        assert_eq!(decision.days_until_event, days);
    }
}

#[test]
fn test_register_eight_days_out_succeeds() {
    let event = event_in(8);
    assert_eq!(
        register_user(1, Some(&event), today(), &[]),
        Ok(NewRegistration { user_id: 1, event_id: 10 })
    );
}

#[test]
fn test_register_seven_days_out_is_closed() {
    let event = event_in(7);
    assert_eq!(
        register_user(1, Some(&event), today(), &[]),
        Err(PolicyError::RegistrationClosed { days_until_event: 7 })
    );
}

#[test]
fn test_register_on_race_day_and_after() {
    assert_matches!(
        register_user(1, Some(&event_in(0)), today(), &[]),
        Err(PolicyError::RegistrationClosed { days_until_event: 0 })
    );
    assert_eq!(register_user(1, Some(&event_in(-2)), today(), &[]), Err(PolicyError::EventCompleted));
}

#[test]
fn test_register_missing_event() {
    assert_eq!(register_user(1, None, today(), &[]), Err(PolicyError::NotFound));
}

#[test]
fn test_duplicate_registration() {
    let event = event_in(20);
    let existing = [registration(1, 10)];
    assert_eq!(register_user(1, Some(&event), today(), &existing), Err(PolicyError::AlreadyRegistered));

    // Another runner's registration does not block this one
    let others = [registration(2, 10)];
    assert!(register_user(1, Some(&event), today(), &others).is_ok());
}

#[test]
fn test_date_checks_win_over_duplicate_check() {
    let existing = [registration(1, 10)];
    assert_matches!(
        register_user(1, Some(&event_in(3)), today(), &existing),
        Err(PolicyError::RegistrationClosed { .. })
    );
}

#[test]
fn test_unregister_ignores_cutoff() {
    let existing = [registration(1, 10)];
    assert_eq!(unregister_user(1, 10, &existing), Ok(()));
    assert_eq!(unregister_user(1, 11, &existing), Err(PolicyError::NotRegistered));
    assert_eq!(unregister_user(2, 10, &[]), Err(PolicyError::NotRegistered));
}

#[test]
fn test_policy_error_status_codes() {
    assert_eq!(PolicyError::NotFound.status_code(), 404);
    assert_eq!(PolicyError::RegistrationClosed { days_until_event: 2 }.status_code(), 400);
    assert_eq!(PolicyError::AlreadyRegistered.kind(), "already_registered");
}

proptest! {
    #[test]
    fn prop_register_agrees_with_evaluate(days in -400i64..400) {
        let event = event_in(days);
        let decision = evaluate(event.event_date, today());
        let result = register_user(1, Some(&event), today(), &[]);

        prop_assert_eq!(result.is_ok(), decision.can_register);
        prop_assert_eq!(decision.can_register, days > REGISTRATION_CUTOFF_DAYS);
    }

    #[test]
    fn prop_status_never_reopens(days in -400i64..400, later in 0i64..30) {
        let date = today() + Duration::days(days);
        let now = evaluate(date, today());
        let then = evaluate(date, today() + Duration::days(later));

        if !now.can_register {
            prop_assert!(!then.can_register);
        }
        if now.effective_status == EffectiveStatus::Completed {
            prop_assert_eq!(then.effective_status, EffectiveStatus::Completed);
        }
    }
}
