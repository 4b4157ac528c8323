//! mavmission_core - Pure no_std item storage for the mission transfer protocol
//!
//! This crate contains the platform-agnostic data types that the MAVLink
//! mission protocol reads and writes. Nothing here knows about MAVLink
//! messages; conversion to and from wire items lives in the `mavmission` crate.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives
//! - **Pure no_std**: Fixed-capacity `heapless` storage, no allocator
//! - **Trait abstractions**: Platform services injected via traits
//!
//! # Modules
//!
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)
//! - [`mission`]: Waypoint storage and command classification
//! - [`fence`]: Geofence item storage and validation
//! - [`rally`]: Rally point storage
//! - [`error`]: Storage error types

#![no_std]

pub mod error;
pub mod fence;
pub mod mission;
pub mod rally;
pub mod traits;

pub use error::StorageError;
