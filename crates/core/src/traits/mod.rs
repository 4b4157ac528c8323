//! Core traits for platform-agnostic protocol timing.
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Platform implementations (Embassy, std) live with the caller

pub mod time;

pub use time::{MockTime, TimeSource};
