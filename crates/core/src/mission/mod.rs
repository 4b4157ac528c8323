//! Mission Waypoint Storage
//!
//! Pure data structures for the waypoint list that mission uploads write into
//! and mission downloads read from.
//!
//! # Mission Storage
//!
//! - Fixed-size waypoint array (max [`MAX_WAYPOINTS`])
//! - In-memory storage (no persistence)
//! - Compatible with MAVLink MISSION_ITEM_INT format
//!
//! # Waypoint Format
//!
//! - Scaled integer coordinates (degrees * 1e7) for location commands
//! - Command ID and frame stored as raw MAVLink values
//! - Sequence number matches the storage index

pub mod command;

use heapless::Vec;

use crate::error::StorageError;

pub use command::{cmd_has_location, is_nav_command, is_supported_mission_command};

/// Maximum number of waypoints in a mission
pub const MAX_WAYPOINTS: usize = 128;

/// Mission waypoint
///
/// Represents a single item in a mission plan in MAVLink MISSION_ITEM_INT
/// layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    /// Sequence number (0-indexed)
    pub seq: u16,
    /// Frame of reference (MAV_FRAME_GLOBAL_RELATIVE_ALT, etc.)
    pub frame: u8,
    /// Command ID (MAV_CMD_NAV_WAYPOINT, MAV_CMD_NAV_LOITER_UNLIM, etc.)
    pub command: u16,
    /// Current waypoint (0=false, 1=true)
    pub current: u8,
    /// Autocontinue to next waypoint (0=false, 1=true)
    pub autocontinue: u8,
    /// PARAM1 (command-specific, e.g., hold time for loiter)
    pub param1: f32,
    /// PARAM2 (command-specific, e.g., acceptance radius)
    pub param2: f32,
    /// PARAM3 (command-specific, e.g., pass through waypoint)
    pub param3: f32,
    /// PARAM4 (command-specific, e.g., desired yaw angle)
    pub param4: f32,
    /// X coordinate (latitude in degrees * 1e7, or raw param5)
    pub x: i32,
    /// Y coordinate (longitude in degrees * 1e7, or raw param6)
    pub y: i32,
    /// Z coordinate (altitude in meters, or raw param7)
    pub z: f32,
}

impl Default for Waypoint {
    fn default() -> Self {
        Self {
            seq: 0,
            frame: 0,
            command: 0,
            current: 0,
            autocontinue: 1,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            x: 0,
            y: 0,
            z: 0.0,
        }
    }
}

/// Mission storage
///
/// Stores mission waypoints in a fixed-size array. The transfer protocol
/// replaces, appends and truncates; downloads read by index.
#[derive(Debug, Clone, Default)]
pub struct MissionStorage {
    waypoints: Vec<Waypoint, MAX_WAYPOINTS>,
}

impl MissionStorage {
    /// Create a new empty mission storage
    pub const fn new() -> Self {
        Self {
            waypoints: Vec::new(),
        }
    }

    /// Get number of waypoints
    pub fn count(&self) -> u16 {
        self.waypoints.len() as u16
    }

    /// Storage capacity
    pub fn capacity(&self) -> u16 {
        MAX_WAYPOINTS as u16
    }

    /// Clear all waypoints
    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    /// Drop every waypoint at or beyond `count`
    pub fn truncate(&mut self, count: u16) {
        self.waypoints.truncate(count as usize);
    }

    /// Append a waypoint to the end of the mission
    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> Result<(), StorageError> {
        self.waypoints
            .push(waypoint)
            .map_err(|_| StorageError::Full)
    }

    /// Get a waypoint by sequence number
    pub fn get_waypoint(&self, seq: u16) -> Option<&Waypoint> {
        self.waypoints.get(seq as usize)
    }

    /// Overwrite the waypoint at `seq`
    pub fn set_waypoint(&mut self, seq: u16, waypoint: Waypoint) -> Result<(), StorageError> {
        match self.waypoints.get_mut(seq as usize) {
            Some(slot) => {
                *slot = waypoint;
                Ok(())
            }
            None => Err(StorageError::IndexOutOfBounds),
        }
    }
}
