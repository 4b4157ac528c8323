//! Communication Protocols
//!
//! # Protocols
//!
//! - **MAVLink 2.0**: mission item transfer with the ground control station
//!   - Mission upload / partial update (MISSION_COUNT, MISSION_WRITE_PARTIAL_LIST)
//!   - Mission download (MISSION_REQUEST_LIST, MISSION_REQUEST_INT)
//!   - Mission, fence and rally categories
//!   - Operator notices (STATUSTEXT)
//!
//! Transports are outside this crate; they implement
//! [`self::mavlink::link::MissionLink`] and hand decoded packets to the dispatcher.

pub mod mavlink;
