//! Calendar source for registration decisions

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use crate::utils::errors::{RunRaceError, Result};

/// Supplies the current calendar date in the event calendar's timezone
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate;
}

/// Wall clock shifted to a fixed UTC offset
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(utc_offset_hours: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            RunRaceError::Config(format!("Invalid UTC offset: {} hours", utc_offset_hours))
        })?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }
}

/// Clock pinned to a single date, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::MIN).and_utc()
    }

    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 5).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }

    #[test]
    fn test_system_clock_offset() {
        let clock = SystemClock::new(7).unwrap();
        assert_eq!(clock.offset().local_minus_utc(), 7 * 3600);

        let utc_today = Utc::now().date_naive();
        let diff = (clock.today() - utc_today).num_days();
        assert!((0..=1).contains(&diff));
    }

    #[test]
    fn test_system_clock_rejects_out_of_range_offset() {
        assert!(SystemClock::new(30).is_err());
    }
}
