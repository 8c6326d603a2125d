//! Time source for expiry and cooldown decisions.

use std::sync::Arc;

use parking_lot::Mutex;
use time::OffsetDateTime;

/// Wall-clock source. Everything that compares against "now" asks a `Clock`.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current wall-clock time (UTC).
    fn now(&self) -> OffsetDateTime;

    /// Current time in milliseconds since the UNIX epoch.
    fn now_ms(&self) -> i64 {
        to_epoch_ms(self.now())
    }
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Settable clock for tests and simulations.
///
/// Clones share the same instant, so a test can hold one handle and give
/// another to the component under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Clock starting at the given epoch milliseconds.
    #[must_use]
    pub fn at_ms(epoch_ms: i64) -> Self {
        Self::new(from_epoch_ms(epoch_ms))
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: std::time::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock()
    }
}

/// Converts a timestamp to epoch milliseconds (saturating at the `i64` range).
#[must_use]
pub fn to_epoch_ms(t: OffsetDateTime) -> i64 {
    let ms = t.unix_timestamp_nanos() / 1_000_000;
    i64::try_from(ms).unwrap_or(if ms < 0 { i64::MIN } else { i64::MAX })
}

/// Converts epoch milliseconds to a timestamp, clamping out-of-range values
/// to the earliest/latest representable instant.
#[must_use]
pub fn from_epoch_ms(epoch_ms: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000).unwrap_or(
        if epoch_ms < 0 {
            time::PrimitiveDateTime::MIN.assume_utc()
        } else {
            time::PrimitiveDateTime::MAX.assume_utc()
        },
    )
}
