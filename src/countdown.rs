// ⏳ Countdown - time left until the next reset
//
// Driven by an external one-second tick (the UI event loop). Each tick reports
// the remaining time; the tick that lands in a new game day reports Expired
// exactly once, and the owner performs the rollover. Once cancelled the
// countdown stays cancelled.

use crate::temporal::{DayClock, DayKey};
use chrono::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Remaining(Duration),

    /// A reset boundary was crossed since the last tick
    Expired,

    Cancelled,
}

/// Cancels a countdown from anywhere that holds a clone
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct Countdown {
    armed_for: DayKey,
    cancel: CancelHandle,
}

impl Countdown {
    /// Start counting down the current game day
    pub fn start(day_clock: &DayClock) -> Self {
        Countdown {
            armed_for: day_clock.current_day_key(),
            cancel: CancelHandle::default(),
        }
    }

    pub fn tick(&mut self, day_clock: &DayClock) -> CountdownTick {
        if self.cancel.is_cancelled() {
            return CountdownTick::Cancelled;
        }

        let today = day_clock.current_day_key();
        if today != self.armed_for {
            tracing::debug!("Countdown expired: {} → {}", self.armed_for, today);
            self.armed_for = today;
            return CountdownTick::Expired;
        }

        CountdownTick::Remaining(day_clock.time_until_next_reset())
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::FixedClock;
    use chrono::{TimeZone, Utc};

    fn setup() -> (Arc<FixedClock>, DayClock) {
        let clock = FixedClock::shared(Utc.with_ymd_and_hms(2026, 3, 10, 16, 59, 58).unwrap());
        let launch = Utc.with_ymd_and_hms(2026, 1, 14, 17, 0, 0).unwrap();
        let day_clock = DayClock::new(clock.clone(), 17, launch);
        (clock, day_clock)
    }

    #[test]
    fn test_tick_counts_down_then_expires_once() {
        let (clock, day_clock) = setup();
        let mut countdown = Countdown::start(&day_clock);

        assert_eq!(countdown.tick(&day_clock), CountdownTick::Remaining(Duration::seconds(2)));

        clock.advance(Duration::seconds(1));
        assert_eq!(countdown.tick(&day_clock), CountdownTick::Remaining(Duration::seconds(1)));

        clock.advance(Duration::seconds(1));
        assert_eq!(countdown.tick(&day_clock), CountdownTick::Expired);

        clock.advance(Duration::seconds(1));
        assert_eq!(
            countdown.tick(&day_clock),
            CountdownTick::Remaining(Duration::hours(24) - Duration::seconds(1))
        );
    }

    #[test]
    fn test_cancel_is_permanent() {
        let (clock, day_clock) = setup();
        let mut countdown = Countdown::start(&day_clock);
        let handle = countdown.cancel_handle();

        handle.cancel();
        assert!(countdown.is_cancelled());
        assert_eq!(countdown.tick(&day_clock), CountdownTick::Cancelled);

        clock.advance(Duration::seconds(5));
        assert_eq!(countdown.tick(&day_clock), CountdownTick::Cancelled);
    }
}
