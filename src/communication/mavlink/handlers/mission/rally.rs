//! Rally Point Store
//!
//! `MAV_MISSION_TYPE_RALLY` items, written straight into [`RallyStorage`].
//! Only `MAV_CMD_NAV_RALLY_POINT` is accepted.

use mavlink::common::{MavCmd, MavMissionResult, MavMissionType, MISSION_ITEM_INT_DATA};
use mavmission_core::rally::{RallyPoint, RallyStorage, MAX_RALLY_POINTS};

use super::convert::{check_lat_lon, frame_from_raw};
use super::store::ItemStore;

#[derive(Debug, Default)]
pub struct RallyStore {
    storage: RallyStorage,
}

impl RallyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage(&self) -> &RallyStorage {
        &self.storage
    }

    fn to_rally_point(item: &MISSION_ITEM_INT_DATA) -> Result<RallyPoint, MavMissionResult> {
        if !matches!(item.command, MavCmd::MAV_CMD_NAV_RALLY_POINT) {
            return Err(MavMissionResult::MAV_MISSION_UNSUPPORTED);
        }
        let frame = item.frame as u8;
        if frame_from_raw(frame).is_none() {
            return Err(MavMissionResult::MAV_MISSION_UNSUPPORTED_FRAME);
        }
        check_lat_lon(item.x, item.y)?;
        if !item.z.is_finite() {
            return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM7);
        }

        Ok(RallyPoint {
            lat: item.x,
            lon: item.y,
            alt_m: item.z,
            frame,
        })
    }
}

impl ItemStore for RallyStore {
    fn mission_type(&self) -> MavMissionType {
        MavMissionType::MAV_MISSION_TYPE_RALLY
    }

    fn item_count(&self) -> u16 {
        self.storage.count()
    }

    fn max_items(&self) -> u16 {
        MAX_RALLY_POINTS as u16
    }

    fn get_item(&self, seq: u16) -> Result<MISSION_ITEM_INT_DATA, MavMissionResult> {
        let point = self
            .storage
            .get(seq)
            .ok_or(MavMissionResult::MAV_MISSION_INVALID_SEQUENCE)?;
        let frame = frame_from_raw(point.frame).ok_or(MavMissionResult::MAV_MISSION_ERROR)?;

        Ok(MISSION_ITEM_INT_DATA {
            target_system: 0,
            target_component: 0,
            seq,
            frame,
            command: MavCmd::MAV_CMD_NAV_RALLY_POINT,
            current: 0,
            autocontinue: 0,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            x: point.lat,
            y: point.lon,
            z: point.alt_m,
            mission_type: MavMissionType::MAV_MISSION_TYPE_RALLY,
        })
    }

    fn replace_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult> {
        let point = Self::to_rally_point(item)?;
        self.storage
            .set(item.seq, point)
            .map_err(|_| MavMissionResult::MAV_MISSION_ERROR)
    }

    fn append_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult> {
        let point = Self::to_rally_point(item)?;
        self.storage
            .push(point)
            .map_err(|_| MavMissionResult::MAV_MISSION_NO_SPACE)
    }

    fn truncate(&mut self, count: u16) {
        self.storage.truncate(count);
    }

    fn clear_all_items(&mut self) -> bool {
        self.storage.clear();
        true
    }

    fn allocate_receive_resources(&mut self, _count: u16) -> Result<(), MavMissionResult> {
        Ok(())
    }

    fn allocate_update_resources(&mut self) -> Result<(), MavMissionResult> {
        Ok(())
    }

    fn free_upload_resources(&mut self) {}

    fn complete(&mut self) -> MavMissionResult {
        crate::log_info!("Rally points received: {}", self.storage.count());
        MavMissionResult::MAV_MISSION_ACCEPTED
    }

    fn timeout(&mut self) {
        crate::log_warn!("Rally upload timeout");
    }
}
