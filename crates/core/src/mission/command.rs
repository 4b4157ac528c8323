//! Mission Command Classification
//!
//! Helpers for classifying MAVLink mission commands. Command IDs at or below
//! MAV_CMD_NAV_LAST (95) are NAV commands and carry a location; the fence and
//! rally commands live in the 5000 range and carry a location as well, as
//! does DO_SET_HOME.

/// MAV_CMD_NAV_LAST: command IDs at or below this value are NAV commands.
pub const MAV_CMD_NAV_LAST: u16 = 95;

pub const MAV_CMD_NAV_WAYPOINT: u16 = 16;
pub const MAV_CMD_NAV_LOITER_UNLIM: u16 = 17;
pub const MAV_CMD_NAV_LOITER_TIME: u16 = 19;
pub const MAV_CMD_NAV_RETURN_TO_LAUNCH: u16 = 20;
pub const MAV_CMD_NAV_LAND: u16 = 21;
pub const MAV_CMD_NAV_TAKEOFF: u16 = 22;
pub const MAV_CMD_CONDITION_DELAY: u16 = 112;
pub const MAV_CMD_DO_JUMP: u16 = 177;
pub const MAV_CMD_DO_CHANGE_SPEED: u16 = 178;
pub const MAV_CMD_DO_SET_HOME: u16 = 179;

pub const MAV_CMD_NAV_FENCE_RETURN_POINT: u16 = 5000;
pub const MAV_CMD_NAV_FENCE_POLYGON_VERTEX_INCLUSION: u16 = 5001;
pub const MAV_CMD_NAV_FENCE_POLYGON_VERTEX_EXCLUSION: u16 = 5002;
pub const MAV_CMD_NAV_FENCE_CIRCLE_INCLUSION: u16 = 5003;
pub const MAV_CMD_NAV_FENCE_CIRCLE_EXCLUSION: u16 = 5004;
pub const MAV_CMD_NAV_RALLY_POINT: u16 = 5100;

/// Commands a rover mission may contain.
const SUPPORTED_MISSION_COMMANDS: [u16; 10] = [
    MAV_CMD_NAV_WAYPOINT,
    MAV_CMD_NAV_LOITER_UNLIM,
    MAV_CMD_NAV_LOITER_TIME,
    MAV_CMD_NAV_RETURN_TO_LAUNCH,
    MAV_CMD_NAV_LAND,
    MAV_CMD_NAV_TAKEOFF,
    MAV_CMD_CONDITION_DELAY,
    MAV_CMD_DO_JUMP,
    MAV_CMD_DO_CHANGE_SPEED,
    MAV_CMD_DO_SET_HOME,
];

/// Classify a command as NAV (drives navigation) or DO (immediate action).
pub fn is_nav_command(command_id: u16) -> bool {
    command_id <= MAV_CMD_NAV_LAST
}

/// Check if a command's x/y fields hold a latitude/longitude.
///
/// NAV commands, DO_SET_HOME and the fence/rally commands do; other DO and
/// condition commands use x/y as plain parameters.
pub fn cmd_has_location(command_id: u16) -> bool {
    is_nav_command(command_id)
        || command_id == MAV_CMD_DO_SET_HOME
        || (MAV_CMD_NAV_FENCE_RETURN_POINT..=MAV_CMD_NAV_FENCE_CIRCLE_EXCLUSION)
            .contains(&command_id)
        || command_id == MAV_CMD_NAV_RALLY_POINT
}

/// Check if a command may be stored in a mission.
pub fn is_supported_mission_command(command_id: u16) -> bool {
    SUPPORTED_MISSION_COMMANDS.contains(&command_id)
}
