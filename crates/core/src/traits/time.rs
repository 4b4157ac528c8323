//! Time abstraction for the transfer protocol.
//!
//! The mission protocol only ever needs a monotonic millisecond clock: upload
//! timeouts and request resends are both measured in milliseconds since boot.
//! `TimeSource` hides where that clock comes from so the protocol can run on
//! the firmware timer or a host test clock alike.

use core::cell::Cell;

/// Monotonic clock in milliseconds since system start.
///
/// # Example
///
/// ```
/// use mavmission_core::traits::{MockTime, TimeSource};
///
/// fn timed_out<T: TimeSource>(time: &T, last_rx_ms: u64, timeout_ms: u64) -> bool {
///     time.elapsed_ms_since(last_rx_ms) > timeout_ms
/// }
///
/// let time = MockTime::new();
/// time.advance_ms(9_000);
/// assert!(timed_out(&time, 0, 8_000));
/// ```
pub trait TimeSource {
    /// Returns current time in milliseconds since system start.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `reference_ms`, saturating at zero.
    fn elapsed_ms_since(&self, reference_ms: u64) -> u64 {
        self.now_ms().saturating_sub(reference_ms)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Host clock that only moves when a test tells it to.
#[derive(Debug, Default)]
pub struct MockTime {
    current_ms: Cell<u64>,
}

impl MockTime {
    /// Creates a new `MockTime` starting at time 0.
    pub fn new() -> Self {
        Self {
            current_ms: Cell::new(0),
        }
    }

    /// Creates a new `MockTime` starting at `ms`.
    pub fn with_initial_ms(ms: u64) -> Self {
        Self {
            current_ms: Cell::new(ms),
        }
    }

    /// Sets the current time to an absolute value.
    pub fn set_ms(&self, ms: u64) {
        self.current_ms.set(ms);
    }

    /// Moves the clock forward by `ms`.
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.set(self.current_ms.get() + ms);
    }
}

impl TimeSource for MockTime {
    fn now_ms(&self) -> u64 {
        self.current_ms.get()
    }
}
