//! Mission Item Conversion
//!
//! Converts between the scaled-integer `MISSION_ITEM_INT` layout the stores
//! work in and the deprecated float `MISSION_ITEM` layout some ground
//! stations still send, and maps raw frame/command values back onto the
//! generated MAVLink enums.

use mavlink::common::{MavCmd, MavFrame, MavMissionResult, MISSION_ITEM_DATA, MISSION_ITEM_INT_DATA};
use mavmission_core::mission::command::*;
use mavmission_core::mission::cmd_has_location;

/// Degrees to degE7
const DEG_TO_E7: f64 = 1.0e7;

const MAX_LAT_E7: i32 = 900_000_000;
const MAX_LON_E7: i32 = 1_800_000_000;

/// Convert an int item to the legacy float layout (download path)
pub fn item_int_to_item(item: &MISSION_ITEM_INT_DATA) -> Result<MISSION_ITEM_DATA, MavMissionResult> {
    let (x, y) = if cmd_has_location(item.command as u16) {
        check_lat_lon(item.x, item.y)?;
        (
            (item.x as f64 / DEG_TO_E7) as f32,
            (item.y as f64 / DEG_TO_E7) as f32,
        )
    } else {
        (item.x as f32, item.y as f32)
    };

    Ok(MISSION_ITEM_DATA {
        target_system: item.target_system,
        target_component: item.target_component,
        seq: item.seq,
        frame: item.frame,
        command: item.command,
        current: item.current,
        autocontinue: item.autocontinue,
        param1: item.param1,
        param2: item.param2,
        param3: item.param3,
        param4: item.param4,
        x,
        y,
        z: item.z,
        mission_type: item.mission_type,
    })
}

/// Convert a legacy float item to the int layout (upload path)
pub fn item_to_item_int(item: &MISSION_ITEM_DATA) -> Result<MISSION_ITEM_INT_DATA, MavMissionResult> {
    if !item.x.is_finite() {
        return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM5_X);
    }
    if !item.y.is_finite() {
        return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM6_Y);
    }
    if !item.z.is_finite() {
        return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM7);
    }

    let (x, y) = if cmd_has_location(item.command as u16) {
        let lat = item.x as f64;
        let lon = item.y as f64;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM5_X);
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM6_Y);
        }
        (round_to_i32(lat * DEG_TO_E7), round_to_i32(lon * DEG_TO_E7))
    } else {
        // Saturating casts
        (item.x as i32, item.y as i32)
    };

    Ok(MISSION_ITEM_INT_DATA {
        target_system: item.target_system,
        target_component: item.target_component,
        seq: item.seq,
        frame: item.frame,
        command: item.command,
        current: item.current,
        autocontinue: item.autocontinue,
        param1: item.param1,
        param2: item.param2,
        param3: item.param3,
        param4: item.param4,
        x,
        y,
        z: item.z,
        mission_type: item.mission_type,
    })
}

/// Range-check a degE7 latitude/longitude pair
pub fn check_lat_lon(lat: i32, lon: i32) -> Result<(), MavMissionResult> {
    if !(-MAX_LAT_E7..=MAX_LAT_E7).contains(&lat) {
        return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM5_X);
    }
    if !(-MAX_LON_E7..=MAX_LON_E7).contains(&lon) {
        return Err(MavMissionResult::MAV_MISSION_INVALID_PARAM6_Y);
    }
    Ok(())
}

fn round_to_i32(value: f64) -> i32 {
    let rounded = if value >= 0.0 { value + 0.5 } else { value - 0.5 };
    rounded as i32
}

/// Map a stored frame value back to [`MavFrame`]
pub fn frame_from_raw(frame: u8) -> Option<MavFrame> {
    match frame {
        0 => Some(MavFrame::MAV_FRAME_GLOBAL),
        2 => Some(MavFrame::MAV_FRAME_MISSION),
        3 => Some(MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT),
        5 => Some(MavFrame::MAV_FRAME_GLOBAL_INT),
        6 => Some(MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT),
        10 => Some(MavFrame::MAV_FRAME_GLOBAL_TERRAIN_ALT),
        11 => Some(MavFrame::MAV_FRAME_GLOBAL_TERRAIN_ALT_INT),
        _ => None,
    }
}

/// Map a stored command id back to [`MavCmd`]
pub fn command_from_raw(command: u16) -> Option<MavCmd> {
    match command {
        MAV_CMD_NAV_WAYPOINT => Some(MavCmd::MAV_CMD_NAV_WAYPOINT),
        MAV_CMD_NAV_LOITER_UNLIM => Some(MavCmd::MAV_CMD_NAV_LOITER_UNLIM),
        MAV_CMD_NAV_LOITER_TIME => Some(MavCmd::MAV_CMD_NAV_LOITER_TIME),
        MAV_CMD_NAV_RETURN_TO_LAUNCH => Some(MavCmd::MAV_CMD_NAV_RETURN_TO_LAUNCH),
        MAV_CMD_NAV_LAND => Some(MavCmd::MAV_CMD_NAV_LAND),
        MAV_CMD_NAV_TAKEOFF => Some(MavCmd::MAV_CMD_NAV_TAKEOFF),
        MAV_CMD_CONDITION_DELAY => Some(MavCmd::MAV_CMD_CONDITION_DELAY),
        MAV_CMD_DO_JUMP => Some(MavCmd::MAV_CMD_DO_JUMP),
        MAV_CMD_DO_CHANGE_SPEED => Some(MavCmd::MAV_CMD_DO_CHANGE_SPEED),
        MAV_CMD_DO_SET_HOME => Some(MavCmd::MAV_CMD_DO_SET_HOME),
        MAV_CMD_NAV_FENCE_RETURN_POINT => Some(MavCmd::MAV_CMD_NAV_FENCE_RETURN_POINT),
        MAV_CMD_NAV_FENCE_POLYGON_VERTEX_INCLUSION => {
            Some(MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_INCLUSION)
        }
        MAV_CMD_NAV_FENCE_POLYGON_VERTEX_EXCLUSION => {
            Some(MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_EXCLUSION)
        }
        MAV_CMD_NAV_FENCE_CIRCLE_INCLUSION => Some(MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_INCLUSION),
        MAV_CMD_NAV_FENCE_CIRCLE_EXCLUSION => Some(MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_EXCLUSION),
        MAV_CMD_NAV_RALLY_POINT => Some(MavCmd::MAV_CMD_NAV_RALLY_POINT),
        _ => None,
    }
}
