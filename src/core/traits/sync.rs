//! Serialized access to protocol state shared by two call sites.
//!
//! The mission dispatcher is driven from the MAVLink receive path (one call
//! per decoded packet) and from the periodic scheduler tick. Both must run
//! mutually exclusive on the same dispatcher, so the dispatcher lives inside
//! a `SharedState` and every access goes through `with_mut`.
//!
//! - `EmbassyState<T>`: critical-section blocking mutex for firmware tasks
//! - `MockState<T>`: `RefCell` for single-threaded host tests

/// Platform-agnostic synchronized state access.
///
/// # Example
///
/// ```ignore
/// fn on_packet<S: SharedState<MissionDispatcher<T>>>(state: &S, ...) {
///     state.with_mut(|dispatcher| dispatcher.dispatch(links, channel, &header, &msg))
/// }
///
/// fn on_tick<S: SharedState<MissionDispatcher<T>>>(state: &S, ...) {
///     state.with_mut(|dispatcher| dispatcher.update(links))
/// }
/// ```
pub trait SharedState<T> {
    /// Access state immutably.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

#[cfg(feature = "embassy")]
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Critical-section guarded state for embedded targets.
///
/// Safe to reach from any executor task or interrupt; the closure runs with
/// interrupts masked, so keep it short (one packet or one tick).
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    inner: Mutex<CriticalSectionRawMutex, core::cell::RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    /// Const so it can back a `static`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(core::cell::RefCell::new(value)),
        }
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

/// Single-threaded state for host tests.
///
/// # Panics
///
/// Re-entrant access (calling `with_mut` from inside `with`) panics, which
/// is exactly the interleaving the real mutex rules out.
pub struct MockState<T> {
    inner: core::cell::RefCell<T>,
}

impl<T> MockState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: core::cell::RefCell::new(value),
        }
    }
}

impl<T> SharedState<T> for MockState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }
}
