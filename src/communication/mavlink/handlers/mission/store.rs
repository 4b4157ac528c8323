//! Item Store Capability Set
//!
//! Everything category-specific about the transfer protocol sits behind
//! [`ItemStore`]: where items live, how many fit, how they are validated, and
//! what "upload finished" means. The session itself only sequences messages.

use mavlink::common::{MavMissionResult, MavMissionType, MISSION_ITEM_INT_DATA};

/// Storage backend for one mission category (waypoints, fence, rally)
///
/// Result codes are MAVLink mission results so that store-specific
/// rejections reach the GCS unchanged.
pub trait ItemStore {
    /// Category tag carried in every message of this session
    fn mission_type(&self) -> MavMissionType;

    /// Items currently visible to uploads and downloads
    fn item_count(&self) -> u16;

    /// Upper bound on `item_count`
    fn max_items(&self) -> u16;

    /// Item at `seq` in wire form.
    ///
    /// Out-of-range indices must return `MAV_MISSION_INVALID_SEQUENCE`.
    fn get_item(&self, seq: u16) -> Result<MISSION_ITEM_INT_DATA, MavMissionResult>;

    /// Overwrite the item at `item.seq` (`item.seq < item_count()`)
    fn replace_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult>;

    /// Append `item` (`item.seq == item_count()`)
    fn append_item(&mut self, item: &MISSION_ITEM_INT_DATA) -> Result<(), MavMissionResult>;

    /// Drop every item at or beyond `count`
    fn truncate(&mut self, count: u16);

    /// Remove every item; false if the store refuses
    fn clear_all_items(&mut self) -> bool;

    /// Reserve what a full upload of `count` items needs
    fn allocate_receive_resources(&mut self, count: u16) -> Result<(), MavMissionResult>;

    /// Reserve what a partial update of existing items needs
    fn allocate_update_resources(&mut self) -> Result<(), MavMissionResult>;

    /// Release upload resources. Called exactly once per allocation.
    fn free_upload_resources(&mut self);

    /// Commit point at the end of a successful upload
    fn complete(&mut self) -> MavMissionResult;

    /// Upload abandoned after inactivity
    fn timeout(&mut self);
}

/// Short name for a result code, usable by every log backend
pub fn result_name(result: MavMissionResult) -> &'static str {
    match result {
        MavMissionResult::MAV_MISSION_ACCEPTED => "ACCEPTED",
        MavMissionResult::MAV_MISSION_ERROR => "ERROR",
        MavMissionResult::MAV_MISSION_UNSUPPORTED_FRAME => "UNSUPPORTED_FRAME",
        MavMissionResult::MAV_MISSION_UNSUPPORTED => "UNSUPPORTED",
        MavMissionResult::MAV_MISSION_NO_SPACE => "NO_SPACE",
        MavMissionResult::MAV_MISSION_INVALID => "INVALID",
        MavMissionResult::MAV_MISSION_INVALID_PARAM1 => "INVALID_PARAM1",
        MavMissionResult::MAV_MISSION_INVALID_PARAM5_X => "INVALID_PARAM5_X",
        MavMissionResult::MAV_MISSION_INVALID_PARAM6_Y => "INVALID_PARAM6_Y",
        MavMissionResult::MAV_MISSION_INVALID_PARAM7 => "INVALID_PARAM7",
        MavMissionResult::MAV_MISSION_INVALID_SEQUENCE => "INVALID_SEQUENCE",
        MavMissionResult::MAV_MISSION_DENIED => "DENIED",
        MavMissionResult::MAV_MISSION_OPERATION_CANCELLED => "OPERATION_CANCELLED",
        _ => "OTHER",
    }
}

/// Short name for a category, usable by every log backend
pub fn mission_type_name(mission_type: MavMissionType) -> &'static str {
    match mission_type {
        MavMissionType::MAV_MISSION_TYPE_MISSION => "mission",
        MavMissionType::MAV_MISSION_TYPE_FENCE => "fence",
        MavMissionType::MAV_MISSION_TYPE_RALLY => "rally",
        _ => "all",
    }
}
