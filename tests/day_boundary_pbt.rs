use catdle::temporal::{DayClock, FixedClock};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

fn day_clock(reset_hour: u32) -> DayClock {
    let launch = Utc.with_ymd_and_hms(2026, 1, 14, 17, 0, 0).unwrap();
    DayClock::new(FixedClock::shared(launch), reset_hour, launch)
}

proptest! {
    #[test]
    fn test_reset_second_flips_the_day(days in 0i64..3650, reset_hour in 0u32..24) {
        let dc = day_clock(reset_hour);
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(days);
        let at_reset = date.and_hms_opt(reset_hour, 0, 0).unwrap().and_utc();
        let just_before = at_reset - Duration::seconds(1);

        let after = dc.day_key_at(at_reset);
        let before = dc.day_key_at(just_before);

        prop_assert_eq!(after.to_string(), date.format("%Y-%m-%d").to_string());
        prop_assert_eq!(before.date() + Duration::days(1), after.date());
    }

    #[test]
    fn test_time_until_reset_within_a_day(secs in 0i64..(3650 * 86_400)) {
        let dc = day_clock(17);
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs);
        let remaining = dc.time_until_reset_at(now);

        prop_assert!(remaining > Duration::zero());
        prop_assert!(remaining <= Duration::hours(24));

        // The reset lands on the next day key
        let next = dc.day_key_at(now + remaining);
        prop_assert_eq!(next.date(), dc.day_key_at(now).date() + Duration::days(1));
    }

    #[test]
    fn test_days_since_launch_never_negative(secs in -(3650i64 * 86_400)..(3650 * 86_400)) {
        let dc = day_clock(17);
        let now = Utc.with_ymd_and_hms(2026, 1, 14, 17, 0, 0).unwrap() + Duration::seconds(secs);
        let days = dc.days_since_launch_at(now);

        prop_assert!(days >= 0);
        if secs >= 0 {
            prop_assert_eq!(days, secs / 86_400);
        }
    }
}
