//! Core infrastructure
//!
//! Logging macros, the internal-error fault channel and the
//! synchronization traits the protocol layer is built on.

pub mod internal_error;
pub mod logging;
pub mod traits;
