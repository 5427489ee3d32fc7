//! Wall clock abstraction and the exchange time synchronizer.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Clock trait for deterministic time in tests.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock using actual wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for deterministic testing.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Clone)]
pub struct MockClock {
    now: DateTime<Utc>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Create a mock clock frozen at a Unix timestamp in milliseconds.
    pub fn from_millis(ms: i64) -> Self {
        Self {
            now: DateTime::from_timestamp_millis(ms).expect("timestamp in range"),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&mut self, duration: chrono::Duration) {
        self.now += duration;
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Tracks the additive offset between the local clock and the exchange clock.
///
/// Every timestamp handed to the signer is `clock + offset`. The offset is
/// overwritten by [`set_offset`](Self::set_offset) (last write wins) and starts
/// at zero.
pub struct TimeSynchronizer {
    clock: Arc<dyn Clock>,
    offset_ms: AtomicI64,
}

impl TimeSynchronizer {
    /// Create a synchronizer over the given clock with a zero offset.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            offset_ms: AtomicI64::new(0),
        }
    }

    /// Synchronizer over the system clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Corrected exchange time in milliseconds since the Unix epoch.
    ///
    /// The offset is loaded exactly once per call.
    pub fn timestamp_ms(&self) -> i64 {
        let offset = self.offset_ms.load(Ordering::Acquire);
        self.clock.now_utc().timestamp_millis() + offset
    }

    /// Current offset in milliseconds.
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms.load(Ordering::Acquire)
    }

    /// Overwrite the offset. No smoothing and no bounds checking.
    pub fn set_offset(&self, offset_ms: i64) {
        self.offset_ms.store(offset_ms, Ordering::Release);
        tracing::info!(offset_ms, "server time offset set");
    }

    /// Derive the offset from one server time sample and store it.
    ///
    /// `request_start_ms` and `response_end_ms` are local clock readings taken
    /// around the server time request. Returns the stored offset.
    pub fn sync_from_round_trip(
        &self,
        server_time_ms: i64,
        request_start_ms: i64,
        response_end_ms: i64,
    ) -> i64 {
        let offset = offset_from_round_trip(server_time_ms, request_start_ms, response_end_ms);
        self.set_offset(offset);
        offset
    }

    /// The underlying wall clock.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl std::fmt::Debug for TimeSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSynchronizer")
            .field("offset_ms", &self.offset_ms())
            .finish_non_exhaustive()
    }
}

/// Latency-compensated offset: half the round trip is assumed to be the
/// one-way delay from the server back to us.
pub fn offset_from_round_trip(
    server_time_ms: i64,
    request_start_ms: i64,
    response_end_ms: i64,
) -> i64 {
    let latency = (response_end_ms - request_start_ms) / 2;
    server_time_ms - response_end_ms + latency
}
