//! Fence Store
//!
//! `MAV_MISSION_TYPE_FENCE` items. A fence is only meaningful as a whole, so
//! uploads go into a staging buffer and replace the committed fence in one
//! step once the last item has arrived and the result validates.
//!
//! # Item encoding
//!
//! | Command                         | param1       | x / y      |
//! |---------------------------------|--------------|------------|
//! | NAV_FENCE_RETURN_POINT          | -            | lat / lon  |
//! | NAV_FENCE_POLYGON_VERTEX_*      | vertex count | lat / lon  |
//! | NAV_FENCE_CIRCLE_*              | radius (m)   | lat / lon  |

use mavlink::common::{MavCmd, MavFrame, MavMissionResult, MavMissionType, MISSION_ITEM_INT_DATA};
use mavmission_core::fence::{
    self, FenceItem, FenceItemKind, FenceStaging, FenceStorage, MAX_FENCE_ITEMS,
};
use mavmission_core::StorageError;

use super::convert::check_lat_lon;
use super::store::ItemStore;
use crate::communication::mavlink::status_notifier;

/// Geofence store
#[derive(Debug, Default)]
pub struct FenceStore {
    committed: FenceStorage,
    /// Open while an upload is in progress
    staging: Option<FenceStaging>,
}

impl FenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fence currently in force
    pub fn committed(&self) -> &FenceStorage {
        &self.committed
    }

    pub fn is_staging(&self) -> bool {
        self.staging.is_some()
    }

    fn to_fence_item(item: &MISSION_ITEM_INT_DATA) -> Result<FenceItem, MavMissionResult> {
        let kind = match item.command {
            MavCmd::MAV_CMD_NAV_FENCE_RETURN_POINT => FenceItemKind::ReturnPoint,
            MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_INCLUSION => FenceItemKind::PolygonInclusion {
                vertex_count: vertex_count(item.param1)?,
            },
            MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_EXCLUSION => FenceItemKind::PolygonExclusion {
                vertex_count: vertex_count(item.param1)?,
            },
            MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_INCLUSION => FenceItemKind::CircleInclusion {
                radius_m: item.param1,
            },
            MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_EXCLUSION => FenceItemKind::CircleExclusion {
                radius_m: item.param1,
            },
            _ => return Err(MavMissionResult::MAV_MISSION_UNSUPPORTED),
        };
        check_lat_lon(item.x, item.y)?;

        Ok(FenceItem {
            kind,
            lat: item.x,
            lon: item.y,
        })
    }

    fn visible_items(&self) -> &[FenceItem] {
        match &self.staging {
            Some(staging) => staging.as_slice(),
            None => self.committed.items(),
        }
    }
}

fn vertex_count(param1: f32) -> Result<u16, MavMissionResult> {
    if !param1.is_finite() || param1 < 0.0 || param1 > MAX_FENCE_ITEMS as f32 {
        return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM1);
    }
    Ok(param1 as u16)
}

impl ItemStore for FenceStore {
    fn mission_type(&self) -> MavMissionType {
        MavMissionType::MAV_MISSION_TYPE_FENCE
    }

    fn item_count(&self) -> u16 {
        self.visible_items().len() as u16
    }

    fn max_items(&self) -> u16 {
        MAX_FENCE_ITEMS as u16
    }

    fn get_item(&self, seq: u16) -> Result<MISSION_ITEM_INT_DATA, MavMissionResult> {
        let item = self
            .visible_items()
            .get(seq as usize)
            .ok_or(MavMissionResult::MAV_MISSION_INVALID_SEQUENCE)?;

        let (command, param1) = match item.kind {
            FenceItemKind::ReturnPoint => (MavCmd::MAV_CMD_NAV_FENCE_RETURN_POINT, 0.0),
            FenceItemKind::PolygonInclusion { vertex_count } => (
                MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_INCLUSION,
                vertex_count as f32,
            ),
            FenceItemKind::PolygonExclusion { vertex_count } => (
                MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_EXCLUSION,
                vertex_count as f32,
            ),
            FenceItemKind::CircleInclusion { radius_m } => {
                (MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_INCLUSION, radius_m)
            }
            FenceItemKind::CircleExclusion { radius_m } => {
                (MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_EXCLUSION, radius_m)
            }
        };

        Ok(MISSION_ITEM_INT_DATA {
            target_system: 0,
            target_component: 0,
            seq,
            frame: MavFrame::MAV_FRAME_GLOBAL_INT,
            command,
            current: 0,
            autocontinue: 0,
            param1,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            x: item.lat,
            y: item.lon,
            z: 0.0,
            mission_type: MavMissionType::MAV_MISSION_TYPE_FENCE,
        })
    }

    fn replace_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult> {
        let fence_item = Self::to_fence_item(item)?;
        let staging = self
            .staging
            .as_mut()
            .ok_or(MavMissionResult::MAV_MISSION_ERROR)?;
        let slot = staging
            .get_mut(item.seq as usize)
            .ok_or(MavMissionResult::MAV_MISSION_ERROR)?;
        *slot = fence_item;
        Ok(())
    }

    fn append_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult> {
        let fence_item = Self::to_fence_item(item)?;
        let staging = self
            .staging
            .as_mut()
            .ok_or(MavMissionResult::MAV_MISSION_ERROR)?;
        fence::stage(staging, fence_item).map_err(|e| match e {
            StorageError::Full => MavMissionResult::MAV_MISSION_NO_SPACE,
            StorageError::IndexOutOfBounds => MavMissionResult::MAV_MISSION_ERROR,
        })
    }

    /// Only the staging buffer is truncated; the committed fence changes
    /// through `complete` alone.
    fn truncate(&mut self, count: u16) {
        if let Some(staging) = self.staging.as_mut() {
            staging.truncate(count as usize);
        }
    }

    fn clear_all_items(&mut self) -> bool {
        self.staging = None;
        self.committed.clear();
        true
    }

    fn allocate_receive_resources(&mut self, _count: u16) -> Result<(), MavMissionResult> {
        self.staging = Some(FenceStaging::new());
        Ok(())
    }

    fn allocate_update_resources(&mut self) -> Result<(), MavMissionResult> {
        let copy = FenceStaging::from_slice(self.committed.items())
            .map_err(|_| MavMissionResult::MAV_MISSION_NO_SPACE)?;
        self.staging = Some(copy);
        Ok(())
    }

    fn free_upload_resources(&mut self) {
        self.staging = None;
    }

    fn complete(&mut self) -> MavMissionResult {
        let Some(staging) = self.staging.as_ref() else {
            return MavMissionResult::MAV_MISSION_ERROR;
        };
        match self.committed.commit(staging) {
            Ok(()) => {
                crate::log_info!("Fence committed: {} items", self.committed.count());
                MavMissionResult::MAV_MISSION_ACCEPTED
            }
            Err(e) => {
                crate::log_warn!("Fence rejected at item {}", e.index());
                status_notifier::send_warning("Fence upload invalid");
                MavMissionResult::MAV_MISSION_INVALID_PARAM1
            }
        }
    }

    fn timeout(&mut self) {
        crate::log_warn!("Fence upload timeout");
    }
}
