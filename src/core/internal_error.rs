//! Internal error reporting
//!
//! Fault channel for conditions that indicate a bug in the autopilot rather
//! than a misbehaving peer. Reporting never panics: the error is latched in
//! a global bitmask, counted and logged, and the caller turns the offending
//! operation into a no-op so the control loop keeps running.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// Internal consistency violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InternalError {
    /// A mission protocol session is receiving but has no usable link
    MissionProtocolLink = 0,
}

impl InternalError {
    fn bit(self) -> u32 {
        1 << (self as u8)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InternalError::MissionProtocolLink => "mission protocol link",
        }
    }
}

impl fmt::Display for InternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal error: {}", self.as_str())
    }
}

#[derive(Clone, Copy)]
struct FaultState {
    mask: u32,
    count: u32,
}

static FAULTS: Mutex<Cell<FaultState>> = Mutex::new(Cell::new(FaultState { mask: 0, count: 0 }));

/// Latch `error` and log it.
pub fn report(error: InternalError) {
    critical_section::with(|cs| {
        let cell = FAULTS.borrow(cs);
        let state = cell.get();
        cell.set(FaultState {
            mask: state.mask | error.bit(),
            count: state.count.saturating_add(1),
        });
    });
    crate::log_error!("Internal error: {}", error.as_str());
}

/// Whether `error` has been reported since the last [`clear`].
pub fn is_set(error: InternalError) -> bool {
    mask() & error.bit() != 0
}

/// Bitmask of latched errors
pub fn mask() -> u32 {
    critical_section::with(|cs| FAULTS.borrow(cs).get().mask)
}

/// Total number of reports, including repeats
pub fn count() -> u32 {
    critical_section::with(|cs| FAULTS.borrow(cs).get().count)
}

/// Reset the fault mask and counter.
pub fn clear() {
    critical_section::with(|cs| {
        FAULTS.borrow(cs).set(FaultState { mask: 0, count: 0 });
    });
}
