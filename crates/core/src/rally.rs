//! Rally Point Storage
//!
//! Alternative return locations uploaded with `MAV_MISSION_TYPE_RALLY`.

use heapless::Vec;

use crate::error::StorageError;

/// Maximum number of rally points
pub const MAX_RALLY_POINTS: usize = 10;

/// Rally point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RallyPoint {
    /// Latitude in degrees * 1e7
    pub lat: i32,
    /// Longitude in degrees * 1e7
    pub lon: i32,
    /// Altitude in meters
    pub alt_m: f32,
    /// Frame the altitude is expressed in (raw MAV_FRAME value)
    pub frame: u8,
}

#[derive(Debug, Clone, Default)]
pub struct RallyStorage {
    points: Vec<RallyPoint, MAX_RALLY_POINTS>,
}

impl RallyStorage {
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn count(&self) -> u16 {
        self.points.len() as u16
    }

    pub fn get(&self, index: u16) -> Option<&RallyPoint> {
        self.points.get(index as usize)
    }

    pub fn set(&mut self, index: u16, point: RallyPoint) -> Result<(), StorageError> {
        match self.points.get_mut(index as usize) {
            Some(slot) => {
                *slot = point;
                Ok(())
            }
            None => Err(StorageError::IndexOutOfBounds),
        }
    }

    pub fn push(&mut self, point: RallyPoint) -> Result<(), StorageError> {
        self.points.push(point).map_err(|_| StorageError::Full)
    }

    pub fn truncate(&mut self, count: u16) {
        self.points.truncate(count as usize);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
