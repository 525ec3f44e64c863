// ⏰ Day Clock - the canonical game day
//
// A game day does not start at midnight. It starts at a fixed UTC reset hour,
// so every player sees the same answer at the same instant regardless of
// timezone:
//
//   2026-03-10 16:59:59 UTC  →  day key 2026-03-09
//   2026-03-10 17:00:00 UTC  →  day key 2026-03-10
//
// The day key is never stored as ground truth. It is recomputed from the
// clock on every access and only used to key persisted state and to detect
// rollover.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

// ============================================================================
// CLOCK
// ============================================================================

/// Source of "now". Injected so day boundaries and TTLs are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: RwLock::new(now),
        }
    }

    pub fn shared(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// ============================================================================
// DAY KEY
// ============================================================================

/// Calendar date (UTC) identifying one game day, rendered `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        DayKey(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The game day before this one
    pub fn previous(&self) -> DayKey {
        self.days_back(1)
    }

    /// The game day `days` before this one
    pub fn days_back(&self, days: u32) -> DayKey {
        DayKey(self.0 - Duration::days(days as i64))
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(DayKey)
    }
}

// ============================================================================
// DAY CLOCK
// ============================================================================

pub struct DayClock {
    clock: SharedClock,

    /// UTC hour at which the game day flips (0-23)
    reset_hour: u32,

    /// Instant of day index 0
    launch: DateTime<Utc>,
}

impl DayClock {
    pub fn new(clock: SharedClock, reset_hour: u32, launch: DateTime<Utc>) -> Self {
        DayClock {
            clock,
            reset_hour: reset_hour.min(23),
            launch,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn reset_hour(&self) -> u32 {
        self.reset_hour
    }

    pub fn current_day_key(&self) -> DayKey {
        self.day_key_at(self.now())
    }

    pub fn previous_day_key(&self) -> DayKey {
        self.current_day_key().previous()
    }

    pub fn time_until_next_reset(&self) -> Duration {
        self.time_until_reset_at(self.now())
    }

    pub fn days_since_launch(&self) -> i64 {
        self.days_since_launch_at(self.now())
    }

    /// Day key for an arbitrary instant: before the reset hour it is still
    /// yesterday's game
    pub fn day_key_at(&self, now: DateTime<Utc>) -> DayKey {
        let date = now.date_naive();
        if now.time() < self.reset_time() {
            DayKey(date - Duration::days(1))
        } else {
            DayKey(date)
        }
    }

    /// Remaining time until the next reset boundary, never negative
    pub fn time_until_reset_at(&self, now: DateTime<Utc>) -> Duration {
        let today_reset = now.date_naive().and_time(self.reset_time()).and_utc();
        let next_reset = if now < today_reset {
            today_reset
        } else {
            today_reset + Duration::days(1)
        };

        let remaining = next_reset - now;
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }

    /// Whole days since launch, 0 for any instant before launch
    pub fn days_since_launch_at(&self, now: DateTime<Utc>) -> i64 {
        let elapsed = (now - self.launch).num_seconds();
        elapsed.div_euclid(86_400).max(0)
    }

    fn reset_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.reset_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

/// Render a countdown as `HH:MM:SS` (hours may reach 24)
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn day_clock(now: DateTime<Utc>) -> (Arc<FixedClock>, DayClock) {
        let clock = FixedClock::shared(now);
        let day_clock = DayClock::new(clock.clone(), 17, at(2026, 1, 14, 17, 0, 0));
        (clock, day_clock)
    }

    #[test]
    fn test_day_key_before_reset_is_yesterday() {
        let (_, dc) = day_clock(at(2026, 3, 10, 16, 59, 59));
        assert_eq!(dc.current_day_key().to_string(), "2026-03-09");
    }

    #[test]
    fn test_day_key_at_reset_is_today() {
        let (_, dc) = day_clock(at(2026, 3, 10, 17, 0, 0));
        assert_eq!(dc.current_day_key().to_string(), "2026-03-10");
    }

    #[test]
    fn test_day_key_crosses_month_and_year() {
        let (_, dc) = day_clock(at(2027, 1, 1, 3, 0, 0));
        assert_eq!(dc.current_day_key().to_string(), "2026-12-31");

        let (_, dc) = day_clock(at(2026, 3, 1, 0, 0, 0));
        assert_eq!(dc.current_day_key().to_string(), "2026-02-28");
    }

    #[test]
    fn test_previous_day_key() {
        let (_, dc) = day_clock(at(2026, 3, 1, 18, 0, 0));
        assert_eq!(dc.previous_day_key().to_string(), "2026-02-28");
    }

    #[test]
    fn test_day_key_round_trips_through_string() {
        let key: DayKey = "2026-05-04".parse().unwrap();
        assert_eq!(key.to_string(), "2026-05-04");
        assert_eq!(key.days_back(7).to_string(), "2026-04-27");
        assert!("05/04/2026".parse::<DayKey>().is_err());
    }

    #[test]
    fn test_time_until_reset_later_today() {
        let (_, dc) = day_clock(at(2026, 3, 10, 15, 30, 15));
        assert_eq!(format_countdown(dc.time_until_next_reset()), "01:29:45");
    }

    #[test]
    fn test_time_until_reset_tomorrow() {
        let (_, dc) = day_clock(at(2026, 3, 10, 20, 0, 0));
        assert_eq!(format_countdown(dc.time_until_next_reset()), "21:00:00");
    }

    #[test]
    fn test_time_until_reset_at_boundary() {
        let (clock, dc) = day_clock(at(2026, 3, 10, 16, 59, 59));
        assert_eq!(format_countdown(dc.time_until_next_reset()), "00:00:01");

        clock.set(at(2026, 3, 10, 17, 0, 0));
        assert_eq!(format_countdown(dc.time_until_next_reset()), "24:00:00");
    }

    #[test]
    fn test_time_until_reset_monotonic_within_window() {
        let (clock, dc) = day_clock(at(2026, 3, 10, 17, 0, 1));
        let mut last = dc.time_until_next_reset();
        for _ in 0..(24 * 60) {
            clock.advance(Duration::minutes(1));
            let now = dc.time_until_next_reset();
            if dc.current_day_key().to_string() != "2026-03-10" {
                break;
            }
            assert!(now <= last);
            last = now;
        }
    }

    #[test]
    fn test_days_since_launch() {
        let (clock, dc) = day_clock(at(2026, 1, 1, 0, 0, 0));
        assert_eq!(dc.days_since_launch(), 0);

        clock.set(at(2026, 1, 14, 17, 0, 0));
        assert_eq!(dc.days_since_launch(), 0);

        clock.set(at(2026, 1, 15, 16, 59, 59));
        assert_eq!(dc.days_since_launch(), 0);

        clock.set(at(2026, 1, 15, 17, 0, 0));
        assert_eq!(dc.days_since_launch(), 1);

        clock.set(at(2026, 2, 14, 18, 0, 0));
        assert_eq!(dc.days_since_launch(), 31);
    }

    #[test]
    fn test_configurable_reset_hour() {
        let clock = FixedClock::shared(at(2026, 7, 1, 16, 30, 0));
        let summer = DayClock::new(clock, 16, at(2026, 1, 14, 17, 0, 0));
        assert_eq!(summer.current_day_key().to_string(), "2026-07-01");
        assert_eq!(format_countdown(summer.time_until_next_reset()), "23:30:00");
    }

    #[test]
    fn test_format_countdown_clamps_negative() {
        assert_eq!(format_countdown(Duration::seconds(-5)), "00:00:00");
        assert_eq!(format_countdown(Duration::seconds(3723)), "01:02:03");
    }
}
