//! MAVLink Protocol Handlers
//!
//! # Handlers
//!
//! - **Mission Item Protocol**: MISSION_COUNT, MISSION_WRITE_PARTIAL_LIST,
//!   MISSION_ITEM(_INT), MISSION_REQUEST_LIST, MISSION_REQUEST(_INT),
//!   MISSION_CLEAR_ALL, one session per mission category

pub mod mission;

// Re-export commonly used types
pub use mission::{
    FenceStore, ItemStore, MissionItemProtocol, ProtocolStats, RallyStore, TransferConfig,
    WaypointStore,
};
