//! Injectable time source.
//!
//! "Today" is the calendar date in the user's configured timezone, which
//! decides the date-scoped storage keys and every report window.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date of `now()`.
    fn today(&self) -> NaiveDate;

    fn timezone(&self) -> Tz;
}

/// Wall clock in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Clock pinned to a single instant, for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    pub current_time: DateTime<Utc>,
    pub tz: Tz,
}

impl FixedClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            current_time: time,
            tz: Tz::UTC,
        }
    }

    /// Noon UTC on the given date.
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self::new(noon)
    }

    pub fn advance(&mut self, duration: chrono::Duration) {
        self.current_time += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.current_time
    }

    fn today(&self) -> NaiveDate {
        self.current_time.with_timezone(&self.tz).date_naive()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_today_follows_timezone() {
        let late_utc = Utc.with_ymd_and_hms(2026, 10, 20, 2, 0, 0).unwrap();
        let mut clock = FixedClock::new(late_utc);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());

        clock.tz = chrono_tz::America::New_York;
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn test_advance_rolls_date() {
        let mut clock = FixedClock::at_date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        clock.advance(chrono::Duration::days(1));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
    }
}
