//! Date-based registration eligibility

use std::fmt;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::models::event::EventStatus;

/// Registration closes this many days before the event (H-7), inclusive.
pub const REGISTRATION_CUTOFF_DAYS: i64 = 7;

/// Lifecycle state derived from the event date, never from the stored status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveStatus {
    Completed,
    ClosedForRegistration,
    Open,
}

impl EffectiveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveStatus::Completed => "completed",
            EffectiveStatus::ClosedForRegistration => "closed_for_registration",
            EffectiveStatus::Open => "open",
        }
    }

    /// The stored-status word an administrator would use for this state
    pub fn legacy_status(&self) -> EventStatus {
        match self {
            EffectiveStatus::Completed => EventStatus::Completed,
            EffectiveStatus::ClosedForRegistration => EventStatus::Ongoing,
            EffectiveStatus::Open => EventStatus::Upcoming,
        }
    }
}

impl fmt::Display for EffectiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing countdown to the event day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Today,
    Tomorrow,
    /// Rendered as "H-n"
    DaysLeft(i64),
}

/// Outcome of evaluating an event date against today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationDecision {
    pub effective_status: EffectiveStatus,
    /// Negative once the event date has passed
    pub days_until_event: i64,
    pub can_register: bool,
}

impl RegistrationDecision {
    pub fn countdown(&self) -> Option<Countdown> {
        match self.days_until_event {
            d if d < 0 => None,
            0 => Some(Countdown::Today),
            1 => Some(Countdown::Tomorrow),
            d => Some(Countdown::DaysLeft(d)),
        }
    }

    /// True while the event is inside the cutoff window but has not passed
    pub fn is_urgent(&self) -> bool {
        self.effective_status == EffectiveStatus::ClosedForRegistration
    }
}

/// Whole days from `today` to `event_date`, positive for future dates.
pub fn days_between(today: NaiveDate, event_date: NaiveDate) -> i64 {
    event_date.signed_duration_since(today).num_days()
}

/// Classify `event_date` relative to `today`.
///
/// Only calendar dates are compared. An event happening today is closed for
/// registration, not completed; it becomes completed the day after.
pub fn evaluate(event_date: NaiveDate, today: NaiveDate) -> RegistrationDecision {
    let days_until_event = days_between(today, event_date);

    let effective_status = if event_date < today {
        EffectiveStatus::Completed
    } else if days_until_event <= REGISTRATION_CUTOFF_DAYS {
        EffectiveStatus::ClosedForRegistration
    } else {
        EffectiveStatus::Open
    };

    RegistrationDecision {
        effective_status,
        days_until_event,
        can_register: effective_status == EffectiveStatus::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_seven_days_out_is_closed() {
        let decision = evaluate(date(2024, 1, 8), date(2024, 1, 1));
        assert_eq!(decision.days_until_event, 7);
        assert_eq!(decision.effective_status, EffectiveStatus::ClosedForRegistration);
        assert!(!decision.can_register);
    }

    #[test]
    fn test_eight_days_out_is_open() {
        let decision = evaluate(date(2024, 1, 9), date(2024, 1, 1));
        assert_eq!(decision.days_until_event, 8);
        assert_eq!(decision.effective_status, EffectiveStatus::Open);
        assert!(decision.can_register);
    }

    #[test]
    fn test_yesterday_is_completed() {
        let decision = evaluate(date(2023, 12, 31), date(2024, 1, 1));
        assert_eq!(decision.days_until_event, -1);
        assert_eq!(decision.effective_status, EffectiveStatus::Completed);
        assert!(!decision.can_register);
    }

    #[test]
    fn test_event_today_is_closed_not_completed() {
        let decision = evaluate(date(2024, 1, 1), date(2024, 1, 1));
        assert_eq!(decision.days_until_event, 0);
        assert_eq!(decision.effective_status, EffectiveStatus::ClosedForRegistration);
        assert_eq!(decision.countdown(), Some(Countdown::Today));
    }

    #[test]
    fn test_days_between_crosses_leap_day() {
        assert_eq!(days_between(date(2024, 2, 28), date(2024, 3, 1)), 2);
        assert_eq!(days_between(date(2024, 3, 1), date(2024, 2, 28)), -2);
    }

    #[test]
    fn test_countdown_labels() {
        let today = date(2024, 6, 1);
        assert_eq!(evaluate(date(2024, 6, 2), today).countdown(), Some(Countdown::Tomorrow));
        assert_eq!(evaluate(date(2024, 6, 11), today).countdown(), Some(Countdown::DaysLeft(10)));
        assert_eq!(evaluate(date(2024, 5, 1), today).countdown(), None);
    }

    #[test]
    fn test_urgency_only_inside_window() {
        let today = date(2024, 6, 1);
        assert!(evaluate(date(2024, 6, 5), today).is_urgent());
        assert!(!evaluate(date(2024, 6, 20), today).is_urgent());
        assert!(!evaluate(date(2024, 5, 20), today).is_urgent());
    }

    #[test]
    fn test_legacy_status_mapping() {
        assert_eq!(EffectiveStatus::Completed.legacy_status(), EventStatus::Completed);
        assert_eq!(EffectiveStatus::ClosedForRegistration.legacy_status(), EventStatus::Ongoing);
        assert_eq!(EffectiveStatus::Open.legacy_status(), EventStatus::Upcoming);
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&EffectiveStatus::ClosedForRegistration).unwrap();
        assert_eq!(json, "\"closed_for_registration\"");
    }

    proptest! {
        #[test]
        fn prop_evaluate_is_pure(offset in -2000i64..2000, base in 0i64..20000) {
            let today = date(1990, 1, 1) + chrono::Duration::days(base);
            let event_date = today + chrono::Duration::days(offset);
            prop_assert_eq!(evaluate(event_date, today), evaluate(event_date, today));
        }

        #[test]
        fn prop_days_until_event_matches_offset(offset in -2000i64..2000) {
            let today = date(2024, 1, 1);
            let decision = evaluate(today + chrono::Duration::days(offset), today);
            prop_assert_eq!(decision.days_until_event, offset);
            prop_assert_eq!(decision.can_register, offset > REGISTRATION_CUTOFF_DAYS);
        }
    }
}
