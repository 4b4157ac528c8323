//! Waypoint Store
//!
//! `MAV_MISSION_TYPE_MISSION` items, written straight into [`MissionStorage`].

use mavlink::common::{MavMissionResult, MavMissionType, MISSION_ITEM_INT_DATA};
use mavmission_core::mission::{
    cmd_has_location, is_supported_mission_command, MissionStorage, Waypoint,
};

use super::convert::{check_lat_lon, command_from_raw, frame_from_raw};
use super::store::ItemStore;
use crate::communication::mavlink::status_notifier;

/// Mission plan store
#[derive(Debug, Default)]
pub struct WaypointStore {
    storage: MissionStorage,
    /// Set while the vehicle is flying the mission
    locked: bool,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage(&self) -> &MissionStorage {
        &self.storage
    }

    /// Lock the mission while it is being executed (refuses clear-all)
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn to_waypoint(item: &MISSION_ITEM_INT_DATA) -> Result<Waypoint, MavMissionResult> {
        let frame = item.frame as u8;
        if frame_from_raw(frame).is_none() {
            return Err(MavMissionResult::MAV_MISSION_UNSUPPORTED_FRAME);
        }
        let command = item.command as u16;
        if !is_supported_mission_command(command) {
            return Err(MavMissionResult::MAV_MISSION_UNSUPPORTED);
        }
        if cmd_has_location(command) {
            check_lat_lon(item.x, item.y)?;
        }

        Ok(Waypoint {
            seq: item.seq,
            frame,
            command,
            current: item.current,
            autocontinue: item.autocontinue,
            param1: item.param1,
            param2: item.param2,
            param3: item.param3,
            param4: item.param4,
            x: item.x,
            y: item.y,
            z: item.z,
        })
    }
}

impl ItemStore for WaypointStore {
    fn mission_type(&self) -> MavMissionType {
        MavMissionType::MAV_MISSION_TYPE_MISSION
    }

    fn item_count(&self) -> u16 {
        self.storage.count()
    }

    fn max_items(&self) -> u16 {
        self.storage.capacity()
    }

    fn get_item(&self, seq: u16) -> Result<MISSION_ITEM_INT_DATA, MavMissionResult> {
        let wp = self
            .storage
            .get_waypoint(seq)
            .ok_or(MavMissionResult::MAV_MISSION_INVALID_SEQUENCE)?;
        let frame = frame_from_raw(wp.frame).ok_or(MavMissionResult::MAV_MISSION_ERROR)?;
        let command = command_from_raw(wp.command).ok_or(MavMissionResult::MAV_MISSION_ERROR)?;

        Ok(MISSION_ITEM_INT_DATA {
            target_system: 0,
            target_component: 0,
            seq,
            frame,
            command,
            current: wp.current,
            autocontinue: wp.autocontinue,
            param1: wp.param1,
            param2: wp.param2,
            param3: wp.param3,
            param4: wp.param4,
            x: wp.x,
            y: wp.y,
            z: wp.z,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        })
    }

    fn replace_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult> {
        let wp = Self::to_waypoint(item)?;
        self.storage
            .set_waypoint(item.seq, wp)
            .map_err(|_| MavMissionResult::MAV_MISSION_ERROR)
    }

    fn append_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult> {
        let wp = Self::to_waypoint(item)?;
        self.storage
            .add_waypoint(wp)
            .map_err(|_| MavMissionResult::MAV_MISSION_NO_SPACE)
    }

    fn truncate(&mut self, count: u16) {
        self.storage.truncate(count);
    }

    fn clear_all_items(&mut self) -> bool {
        if self.locked {
            crate::log_warn!("Mission clear refused: mission running");
            return false;
        }
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
        status_notifier::send_info("Flight plan received");
        MavMissionResult::MAV_MISSION_ACCEPTED
    }

    fn timeout(&mut self) {
        status_notifier::send_warning("Mission upload timeout");
    }
}
