//! Platform-agnostic traits used by the protocol layer.
//!
//! Time comes from [`mavmission_core::traits::TimeSource`]; this module adds
//! the synchronization abstraction that needs feature-gated embassy support.

pub mod sync;

pub use mavmission_core::traits::{MockTime, TimeSource};
pub use sync::{MockState, SharedState};

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;
