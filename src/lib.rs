#![cfg_attr(not(test), no_std)]

//! mavmission - MAVLink mission item transfer for embedded autopilots
//!
//! This library implements the vehicle side of the MAVLink mission protocol
//! (upload, partial update, download, clear) for the mission, fence and rally
//! categories, on top of a link abstraction that any transport can back.

// Core systems (logging, fault reporting, platform traits)
pub mod core;

// Communication protocols (MAVLink mission protocol)
pub mod communication;
