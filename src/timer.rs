use std::time::{Duration, Instant};

pub const TIMER_HZ: u32 = 60;

/// 8-bit countdown register (delay or sound).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    /// One 1/60 s period elapsed. Returns whether the timer was running.
    pub fn tick(&mut self) -> bool {
        let running = self.count > 0;
        self.count = saturating_decrement(self.count);
        running
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

/// Clamp-at-zero decrement.
pub fn saturating_decrement(value: u8) -> u8 {
    if value == 0 {
        0
    } else {
        value - 1
    }
}

/// Converts elapsed real time into a whole number of fixed-rate periods.
///
/// The host keeps one of these for the 60 Hz timers and one for the
/// instruction rate. The fractional part of a period is carried over, so
/// over a long run the number of periods handed out matches real time.
/// After a stall longer than the lag limit the backlog is dropped instead
/// of being replayed all at once.
#[derive(Debug, Clone)]
pub struct Pacer {
    period: Duration,
    last_updated: Instant,
    carry: Duration,
    max_due: u32,
}

impl Pacer {
    pub fn new(hz: u32, now: Instant) -> Self {
        let period = (Duration::from_secs(1) / hz.max(1)).max(Duration::from_nanos(1));
        Self {
            period,
            last_updated: now,
            carry: Duration::ZERO,
            max_due: u32::MAX,
        }
    }

    /// Never hand out more than `max_lag` worth of periods from one call.
    pub fn with_max_lag(mut self, max_lag: Duration) -> Self {
        let periods = max_lag.as_nanos() / self.period.as_nanos();
        self.max_due = periods.clamp(1, u32::MAX as u128) as u32;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Periods elapsed between the previous call and `now`.
    pub fn due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_updated) + self.carry;
        self.last_updated = now;

        let periods = elapsed.as_nanos() / self.period.as_nanos();
        if periods > self.max_due as u128 {
            log::debug!("dropping {} periods of backlog", periods - self.max_due as u128);
            self.carry = Duration::ZERO;
            return self.max_due;
        }
        let periods = periods as u32;
        self.carry = elapsed - self.period * periods;
        periods
    }
}
