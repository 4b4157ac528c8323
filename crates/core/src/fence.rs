//! Geofence Item Storage
//!
//! Polygon and circle fence items as uploaded through the MAVLink mission
//! protocol with `MAV_MISSION_TYPE_FENCE`.
//!
//! A polygon is a run of consecutive vertex items of the same kind, each
//! carrying the total vertex count of its polygon. Circles and the return
//! point are single items.

use core::fmt;

use heapless::Vec;

use crate::error::StorageError;

/// Maximum number of stored fence items
pub const MAX_FENCE_ITEMS: usize = 84;

/// Minimum vertices in a polygon fence
pub const MIN_POLYGON_VERTICES: u16 = 3;

/// Fence item kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FenceItemKind {
    /// Point to return to on breach
    ReturnPoint,
    /// Vertex of a polygon the vehicle must stay inside
    PolygonInclusion {
        /// Total vertices of the owning polygon
        vertex_count: u16,
    },
    /// Vertex of a polygon the vehicle must stay outside
    PolygonExclusion {
        /// Total vertices of the owning polygon
        vertex_count: u16,
    },
    /// Circle the vehicle must stay inside
    CircleInclusion {
        /// Radius in meters
        radius_m: f32,
    },
    /// Circle the vehicle must stay outside
    CircleExclusion {
        /// Radius in meters
        radius_m: f32,
    },
}

/// Single fence item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceItem {
    pub kind: FenceItemKind,
    /// Latitude in degrees * 1e7
    pub lat: i32,
    /// Longitude in degrees * 1e7
    pub lon: i32,
}

/// Reasons a fence item list is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceError {
    /// A polygon declared fewer than three vertices
    TooFewVertices { index: u16 },
    /// Vertices of one polygon disagree on the vertex count, or the list
    /// ends before the polygon is closed
    PolygonIncomplete { index: u16 },
    /// A circle has a non-positive or non-finite radius
    BadRadius { index: u16 },
    /// More than one return point
    MultipleReturnPoints { index: u16 },
}

impl FenceError {
    /// Index of the offending item
    pub fn index(&self) -> u16 {
        match *self {
            FenceError::TooFewVertices { index }
            | FenceError::PolygonIncomplete { index }
            | FenceError::BadRadius { index }
            | FenceError::MultipleReturnPoints { index } => index,
        }
    }
}

impl fmt::Display for FenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenceError::TooFewVertices { index } => {
                write!(f, "fence polygon at item {} has too few vertices", index)
            }
            FenceError::PolygonIncomplete { index } => {
                write!(f, "fence polygon at item {} is incomplete", index)
            }
            FenceError::BadRadius { index } => {
                write!(f, "fence circle at item {} has a bad radius", index)
            }
            FenceError::MultipleReturnPoints { index } => {
                write!(f, "second fence return point at item {}", index)
            }
        }
    }
}

/// Check that a fence item list describes well-formed polygons and circles.
pub fn validate(items: &[FenceItem]) -> Result<(), FenceError> {
    let mut seen_return_point = false;
    let mut i = 0;
    while i < items.len() {
        let index = i as u16;
        match items[i].kind {
            FenceItemKind::ReturnPoint => {
                if seen_return_point {
                    return Err(FenceError::MultipleReturnPoints { index });
                }
                seen_return_point = true;
                i += 1;
            }
            FenceItemKind::CircleInclusion { radius_m }
            | FenceItemKind::CircleExclusion { radius_m } => {
                if !radius_m.is_finite() || radius_m <= 0.0 {
                    return Err(FenceError::BadRadius { index });
                }
                i += 1;
            }
            first @ (FenceItemKind::PolygonInclusion { vertex_count }
            | FenceItemKind::PolygonExclusion { vertex_count }) => {
                if vertex_count < MIN_POLYGON_VERTICES {
                    return Err(FenceError::TooFewVertices { index });
                }
                let end = i + vertex_count as usize;
                if end > items.len() {
                    return Err(FenceError::PolygonIncomplete { index });
                }
                if items[i..end].iter().any(|item| item.kind != first) {
                    return Err(FenceError::PolygonIncomplete { index });
                }
                i = end;
            }
        }
    }
    Ok(())
}

/// Committed fence
#[derive(Debug, Clone, Default)]
pub struct FenceStorage {
    items: Vec<FenceItem, MAX_FENCE_ITEMS>,
}

impl FenceStorage {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn count(&self) -> u16 {
        self.items.len() as u16
    }

    pub fn get(&self, index: u16) -> Option<&FenceItem> {
        self.items.get(index as usize)
    }

    pub fn items(&self) -> &[FenceItem] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the whole fence after validating the new items.
    ///
    /// The stored fence is left untouched when validation fails.
    pub fn commit(&mut self, items: &[FenceItem]) -> Result<(), FenceError> {
        validate(items)?;
        self.items.clear();
        // Both sides share MAX_FENCE_ITEMS, so this cannot overflow
        let _ = self.items.extend_from_slice(items);
        Ok(())
    }
}

/// Fence items being uploaded, committed only once the upload completes
pub type FenceStaging = Vec<FenceItem, MAX_FENCE_ITEMS>;

/// Push onto a staging buffer
pub fn stage(staging: &mut FenceStaging, item: FenceItem) -> Result<(), StorageError> {
    staging.push(item).map_err(|_| StorageError::Full)
}
