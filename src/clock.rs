use chrono::{DateTime, Utc};

/// Abstraction over "current time" to make behavior deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Seconds since the Unix epoch, clamped at zero.
    ///
    /// TOTP generation and session-age checks both key off this.
    fn unix_time(&self) -> u64 {
        self.now().timestamp().max(0) as u64
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Fixed clock at a Unix timestamp, for TOTP test vectors.
    pub fn at_unix(secs: i64) -> Self {
        Self {
            now: DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_unix_time() {
        let clock = FixedClock::at_unix(1111111109);
        assert_eq!(clock.unix_time(), 1111111109);
    }

    #[test]
    fn unix_time_clamps_pre_epoch() {
        let clock = FixedClock::at_unix(-5);
        assert_eq!(clock.unix_time(), 0);
    }
}
