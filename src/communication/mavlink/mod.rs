//! MAVLink Mission Protocol
//!
//! # Architecture
//!
//! - **Link**: what the protocol needs from a transport (send, buffer space,
//!   stream slowdown, protocol version)
//! - **Dispatcher**: routes mission messages to the session for their category
//! - **Handlers**: the per-category transfer session and its item stores
//! - **Status notifier**: queued STATUSTEXT for the operator
//!
//! # Usage
//!
//! ```ignore
//! use mavmission::communication::mavlink::dispatcher::MissionDispatcher;
//!
//! let mut dispatcher = MissionDispatcher::new(1, 1, clock);
//!
//! // receive path
//! dispatcher.dispatch(&mut links[..], channel, &header, &message)?;
//!
//! // every 10 ms or so
//! dispatcher.update(&mut links[..]);
//! ```

pub mod dispatcher; // Message dispatcher (routing to sessions)
pub mod handlers; // Mission transfer sessions and item stores
pub mod link; // Link abstraction
pub mod status_notifier; // STATUSTEXT notification system
