//! Mission Message Dispatcher
//!
//! Routes decoded mission messages to the session that owns their category
//! and drives the periodic tick of every session.
//!
//! # Architecture
//!
//! ```text
//!   receive path ──► dispatch(links, channel, header, msg) ──┐
//!                                                           ├──► waypoints / fence / rally
//!   scheduler    ──► update(links) ─────────────────────────┘        │
//!                        │                                           ▼
//!                        └── STATUSTEXT flush ──────────────────► LinkSet
//! ```
//!
//! The category comes from the `mission_type` field every mission message
//! carries. Both call sites must be serialised (see
//! [`crate::core::traits::SharedState`]).

use mavlink::common::{MavMessage, MavMissionResult, MavMissionType, MISSION_ACK_DATA};
use mavlink::MavHeader;

use super::handlers::mission::{
    self, mission_type_name, FenceStore, MissionItemProtocol, RallyStore, TransferConfig,
    WaypointStore,
};
use super::link::{Channel, LinkSet, MissionLink, Origin, OutboundKind};
use super::status_notifier;
use crate::core::traits::TimeSource;

/// Dispatcher statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Total messages processed
    pub messages_processed: u32,
    /// Messages routed to a mission session
    pub mission_messages: u32,
    /// Messages no session handles
    pub unhandled_messages: u32,
    /// Mission messages addressed to another system
    pub ignored_other_system: u32,
}

/// Dispatch errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Not a mission protocol message
    NoHandler,
    /// Packet arrived on a channel missing from the link set
    UnknownChannel,
}

impl core::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DispatchError::NoHandler => write!(f, "No handler registered for message type"),
            DispatchError::UnknownChannel => write!(f, "Message arrived on an unknown channel"),
        }
    }
}

/// Runs `$body` with `$session` bound to the session for `$mission_type`.
/// Evaluates to `None` for a category without a session.
macro_rules! with_session {
    ($self:ident, $mission_type:expr, |$session:ident| $body:expr) => {
        match $mission_type {
            MavMissionType::MAV_MISSION_TYPE_MISSION => {
                let $session = &mut $self.waypoints;
                Some($body)
            }
            MavMissionType::MAV_MISSION_TYPE_FENCE => {
                let $session = &mut $self.fence;
                Some($body)
            }
            MavMissionType::MAV_MISSION_TYPE_RALLY => {
                let $session = &mut $self.rally;
                Some($body)
            }
            _ => None,
        }
    };
}

/// Owns one transfer session per mission category
pub struct MissionDispatcher<T: TimeSource> {
    system_id: u8,
    component_id: u8,
    time: T,
    waypoints: MissionItemProtocol<WaypointStore>,
    fence: MissionItemProtocol<FenceStore>,
    rally: MissionItemProtocol<RallyStore>,
    stats: DispatcherStats,
}

impl<T: TimeSource> MissionDispatcher<T> {
    /// Create a dispatcher with default transfer timing
    ///
    /// # Arguments
    ///
    /// * `system_id` - Our MAVLink system ID
    /// * `component_id` - Our MAVLink component ID
    /// * `time` - Millisecond clock for timeouts and resends
    pub fn new(system_id: u8, component_id: u8, time: T) -> Self {
        Self::with_config(system_id, component_id, time, TransferConfig::default())
    }

    pub fn with_config(system_id: u8, component_id: u8, time: T, config: TransferConfig) -> Self {
        Self {
            system_id,
            component_id,
            time,
            waypoints: MissionItemProtocol::with_config(WaypointStore::new(), config),
            fence: MissionItemProtocol::with_config(FenceStore::new(), config),
            rally: MissionItemProtocol::with_config(RallyStore::new(), config),
            stats: DispatcherStats::default(),
        }
    }

    pub fn system_id(&self) -> u8 {
        self.system_id
    }

    pub fn component_id(&self) -> u8 {
        self.component_id
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    pub fn stats(&self) -> DispatcherStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DispatcherStats::default();
    }

    pub fn waypoints(&self) -> &MissionItemProtocol<WaypointStore> {
        &self.waypoints
    }

    pub fn waypoints_mut(&mut self) -> &mut MissionItemProtocol<WaypointStore> {
        &mut self.waypoints
    }

    pub fn fence(&self) -> &MissionItemProtocol<FenceStore> {
        &self.fence
    }

    pub fn fence_mut(&mut self) -> &mut MissionItemProtocol<FenceStore> {
        &mut self.fence
    }

    pub fn rally(&self) -> &MissionItemProtocol<RallyStore> {
        &self.rally
    }

    pub fn rally_mut(&mut self) -> &mut MissionItemProtocol<RallyStore> {
        &mut self.rally
    }

    /// Whether any category has an upload in progress
    pub fn is_receiving(&self) -> bool {
        self.waypoints.is_receiving() || self.fence.is_receiving() || self.rally.is_receiving()
    }

    /// Route one decoded message
    ///
    /// # Arguments
    ///
    /// * `links` - Every link replies may go out on
    /// * `channel` - Link the message arrived on
    /// * `header` - MAVLink header of the message (sender identity)
    /// * `message` - Decoded message
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoHandler`] for non-mission messages, and
    /// [`DispatchError::UnknownChannel`] when `channel` is not in `links`.
    pub fn dispatch<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        channel: Channel,
        header: &MavHeader,
        message: &MavMessage,
    ) -> Result<(), DispatchError> {
        self.stats.messages_processed += 1;

        let Some((target_system, mission_type)) = mission_target(message) else {
            self.stats.unhandled_messages += 1;
            return Err(DispatchError::NoHandler);
        };
        if links.link_mut(channel).is_none() {
            crate::log_warn!("Mission message on unknown channel {}", channel.0);
            return Err(DispatchError::UnknownChannel);
        }
        if target_system != 0 && target_system != self.system_id {
            self.stats.ignored_other_system += 1;
            return Ok(());
        }
        self.stats.mission_messages += 1;

        let origin = Origin::from_header(channel, header);
        let now_ms = self.time.now_ms();

        let routed = match message {
            MavMessage::MISSION_COUNT(data) => with_session!(self, mission_type, |session| {
                session.handle_mission_count(links, origin, data, now_ms)
            }),
            MavMessage::MISSION_WRITE_PARTIAL_LIST(data) => {
                with_session!(self, mission_type, |session| {
                    session.handle_write_partial_list(links, origin, data, now_ms)
                })
            }
            MavMessage::MISSION_ITEM_INT(data) => with_session!(self, mission_type, |session| {
                session.handle_mission_item_int(links, origin, data, now_ms)
            }),
            MavMessage::MISSION_ITEM(data) => with_session!(self, mission_type, |session| {
                session.handle_mission_item(links, origin, data, now_ms)
            }),
            MavMessage::MISSION_REQUEST_LIST(data) => {
                with_session!(self, mission_type, |session| {
                    session.handle_request_list(links, origin, data)
                })
            }
            MavMessage::MISSION_REQUEST_INT(data) => with_session!(self, mission_type, |session| {
                session.handle_request_int(links, origin, data)
            }),
            MavMessage::MISSION_REQUEST(data) => with_session!(self, mission_type, |session| {
                session.handle_request(links, origin, data)
            }),
            MavMessage::MISSION_CLEAR_ALL(data) => {
                if mission_type == MavMissionType::MAV_MISSION_TYPE_ALL {
                    self.clear_all_categories(links, &origin);
                    Some(())
                } else {
                    with_session!(self, mission_type, |session| {
                        session.handle_clear_all(links, origin, data)
                    })
                }
            }
            // Download finished on the GCS side; nothing to reply
            MavMessage::MISSION_ACK(_) => Some(()),
            _ => None,
        };

        if routed.is_none() {
            crate::log_warn!(
                "No session for {} (type {})",
                mission_type_name(mission_type),
                mission_type as u8
            );
            send_ack(
                links,
                &origin,
                mission_type,
                MavMissionResult::MAV_MISSION_UNSUPPORTED,
            );
        }
        Ok(())
    }

    /// Periodic tick: session timeouts and resends, then STATUSTEXT flush
    pub fn update<K: LinkSet + ?Sized>(&mut self, links: &mut K) {
        let now_ms = self.time.now_ms();
        self.waypoints.update(links, now_ms);
        self.fence.update(links, now_ms);
        self.rally.update(links, now_ms);

        for chunk in status_notifier::take_pending_statustext_messages() {
            links.for_each_link(|link| {
                if link.has_space(OutboundKind::StatusText) {
                    link.send_message(MavMessage::STATUSTEXT(chunk.clone()));
                }
            });
        }
    }

    /// MISSION_CLEAR_ALL for every category, answered with a single ack
    fn clear_all_categories<K: LinkSet + ?Sized>(&mut self, links: &mut K, origin: &Origin) {
        // Every category is attempted even after one fails
        let waypoints = self.waypoints.clear_all(origin);
        let fence = self.fence.clear_all(origin);
        let rally = self.rally.clear_all(origin);

        let result = if waypoints && fence && rally {
            MavMissionResult::MAV_MISSION_ACCEPTED
        } else {
            MavMissionResult::MAV_MISSION_ERROR
        };
        send_ack(links, origin, MavMissionType::MAV_MISSION_TYPE_ALL, result);
    }
}

/// `(target_system, mission_type)` of a mission protocol message
fn mission_target(message: &MavMessage) -> Option<(u8, MavMissionType)> {
    match message {
        MavMessage::MISSION_COUNT(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_WRITE_PARTIAL_LIST(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_ITEM_INT(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_ITEM(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_REQUEST_LIST(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_REQUEST_INT(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_REQUEST(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_CLEAR_ALL(d) => Some((d.target_system, d.mission_type)),
        MavMessage::MISSION_ACK(d) => Some((d.target_system, d.mission_type)),
        _ => None,
    }
}

fn send_ack<K: LinkSet + ?Sized>(
    links: &mut K,
    to: &Origin,
    mission_type: MavMissionType,
    result: MavMissionResult,
) {
    mission::send_on(
        links,
        to.channel,
        MavMessage::MISSION_ACK(MISSION_ACK_DATA {
            target_system: to.system_id,
            target_component: to.component_id,
            mavtype: result,
            mission_type,
            opaque_id: 0,
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::mavlink::link::QueueLink;
    use crate::core::traits::{MockState, MockTime, SharedState};
    use mavlink::common::{
        MavCmd, MavFrame, HEARTBEAT_DATA, MISSION_CLEAR_ALL_DATA, MISSION_COUNT_DATA,
        MISSION_ITEM_INT_DATA,
    };
    use serial_test::serial;

    type Link = QueueLink<32>;

    fn header() -> MavHeader {
        MavHeader {
            system_id: 255,
            component_id: 190,
            sequence: 0,
        }
    }

    fn count(target_system: u8, mission_type: MavMissionType, count: u16) -> MavMessage {
        MavMessage::MISSION_COUNT(MISSION_COUNT_DATA {
            target_system,
            target_component: 1,
            count,
            mission_type,
            opaque_id: 0,
        })
    }

    fn fence_vertex(seq: u16) -> MavMessage {
        MavMessage::MISSION_ITEM_INT(MISSION_ITEM_INT_DATA {
            target_system: 1,
            target_component: 1,
            seq,
            frame: MavFrame::MAV_FRAME_GLOBAL_INT,
            command: MavCmd::MAV_CMD_NAV_FENCE_POLYGON_VERTEX_INCLUSION,
            current: 0,
            autocontinue: 0,
            param1: 3.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            x: 357_000_000 + i32::from(seq) * 1_000,
            y: 1_397_000_000,
            z: 0.0,
            mission_type: MavMissionType::MAV_MISSION_TYPE_FENCE,
        })
    }

    fn clear_all(mission_type: MavMissionType) -> MavMessage {
        MavMessage::MISSION_CLEAR_ALL(MISSION_CLEAR_ALL_DATA {
            target_system: 1,
            target_component: 1,
            mission_type,
        })
    }

    fn acks(link: &mut Link) -> Vec<(MavMissionType, MavMissionResult)> {
        link.drain()
            .filter_map(|m| match m {
                MavMessage::MISSION_ACK(ack) => Some((ack.mission_type, ack.mavtype)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_routes_by_mission_type() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &count(1, MavMissionType::MAV_MISSION_TYPE_FENCE, 3),
            )
            .unwrap();

        assert!(dispatcher.fence().is_receiving());
        assert!(!dispatcher.waypoints().is_receiving());
        assert!(!dispatcher.rally().is_receiving());

        for seq in 0..3 {
            time.advance_ms(50);
            dispatcher
                .dispatch(&mut links[..], Channel(0), &header(), &fence_vertex(seq))
                .unwrap();
        }

        assert_eq!(
            acks(&mut links[0]),
            vec![(
                MavMissionType::MAV_MISSION_TYPE_FENCE,
                MavMissionResult::MAV_MISSION_ACCEPTED
            )]
        );
        assert_eq!(dispatcher.fence().store().committed().count(), 3);
        assert_eq!(dispatcher.stats().mission_messages, 4);
    }

    #[test]
    fn test_other_system_ignored() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &count(7, MavMissionType::MAV_MISSION_TYPE_MISSION, 3),
            )
            .unwrap();

        assert!(!dispatcher.is_receiving());
        assert!(links[0].is_empty());
        assert_eq!(dispatcher.stats().ignored_other_system, 1);

        // Broadcast is accepted
        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &count(0, MavMissionType::MAV_MISSION_TYPE_MISSION, 3),
            )
            .unwrap();
        assert!(dispatcher.waypoints().is_receiving());
    }

    #[test]
    fn test_unknown_category_unsupported() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &count(1, MavMissionType::MAV_MISSION_TYPE_ALL, 3),
            )
            .unwrap();

        assert_eq!(
            acks(&mut links[0]),
            vec![(
                MavMissionType::MAV_MISSION_TYPE_ALL,
                MavMissionResult::MAV_MISSION_UNSUPPORTED
            )]
        );
        assert!(!dispatcher.is_receiving());
    }

    #[test]
    fn test_non_mission_message_has_no_handler() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];
        let heartbeat = MavMessage::HEARTBEAT(HEARTBEAT_DATA::default());

        let result = dispatcher.dispatch(&mut links[..], Channel(0), &header(), &heartbeat);

        assert_eq!(result, Err(DispatchError::NoHandler));
        assert_eq!(dispatcher.stats().unhandled_messages, 1);
        assert_eq!(dispatcher.stats().messages_processed, 1);
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];

        let result = dispatcher.dispatch(
            &mut links[..],
            Channel(3),
            &header(),
            &count(1, MavMissionType::MAV_MISSION_TYPE_MISSION, 1),
        );

        assert_eq!(result, Err(DispatchError::UnknownChannel));
        assert!(!dispatcher.is_receiving());
    }

    #[test]
    fn test_gcs_ack_consumed_silently() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];
        let ack = MavMessage::MISSION_ACK(MISSION_ACK_DATA {
            target_system: 1,
            target_component: 1,
            mavtype: MavMissionResult::MAV_MISSION_ACCEPTED,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
            opaque_id: 0,
        });

        dispatcher
            .dispatch(&mut links[..], Channel(0), &header(), &ack)
            .unwrap();

        assert!(links[0].is_empty());
    }

    #[test]
    fn test_clear_all_categories_single_ack() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &count(1, MavMissionType::MAV_MISSION_TYPE_FENCE, 3),
            )
            .unwrap();
        links[0].drain().for_each(drop);

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &clear_all(MavMissionType::MAV_MISSION_TYPE_ALL),
            )
            .unwrap();

        assert_eq!(
            acks(&mut links[0]),
            vec![(
                MavMissionType::MAV_MISSION_TYPE_ALL,
                MavMissionResult::MAV_MISSION_ACCEPTED
            )]
        );
        assert!(!dispatcher.is_receiving());
    }

    #[test]
    fn test_clear_all_refused_while_mission_locked() {
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0))];
        dispatcher.waypoints_mut().store_mut().set_locked(true);

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &clear_all(MavMissionType::MAV_MISSION_TYPE_ALL),
            )
            .unwrap();

        assert_eq!(
            acks(&mut links[0]),
            vec![(
                MavMissionType::MAV_MISSION_TYPE_ALL,
                MavMissionResult::MAV_MISSION_ERROR
            )]
        );
    }

    #[test]
    #[serial]
    fn test_update_times_out_and_flushes_statustext() {
        status_notifier::reset();
        let time = MockTime::new();
        let mut dispatcher = MissionDispatcher::new(1, 1, &time);
        let mut links = [Link::new(Channel(0)), Link::new(Channel(1))];

        dispatcher
            .dispatch(
                &mut links[..],
                Channel(0),
                &header(),
                &count(1, MavMissionType::MAV_MISSION_TYPE_MISSION, 2),
            )
            .unwrap();
        links[0].drain().for_each(drop);

        time.set_ms(8_001);
        dispatcher.update(&mut links[..]);

        assert!(!dispatcher.is_receiving());
        let on_upload_link: Vec<MavMessage> = links[0].drain().collect();
        assert!(on_upload_link.iter().any(|m| matches!(
            m,
            MavMessage::MISSION_ACK(ack)
                if ack.mavtype == MavMissionResult::MAV_MISSION_OPERATION_CANCELLED
        )));
        // "Mission upload timeout" goes to every link
        assert!(on_upload_link
            .iter()
            .any(|m| matches!(m, MavMessage::STATUSTEXT(_))));
        assert!(links[1]
            .drain()
            .any(|m| matches!(m, MavMessage::STATUSTEXT(_))));
        assert_eq!(status_notifier::pending_count(), 0);
    }

    #[test]
    #[serial]
    fn test_shared_between_packet_and_tick_paths() {
        let time = MockTime::new();
        let state = MockState::new(MissionDispatcher::new(1, 1, &time));
        let mut links = [Link::new(Channel(0))];

        state
            .with_mut(|d| {
                d.dispatch(
                    &mut links[..],
                    Channel(0),
                    &header(),
                    &count(1, MavMissionType::MAV_MISSION_TYPE_RALLY, 1),
                )
            })
            .unwrap();
        links[0].drain().for_each(drop);

        time.set_ms(1_500);
        state.with_mut(|d| d.update(&mut links[..]));

        let resent: Vec<MavMessage> = links[0].drain().collect();
        assert!(matches!(
            resent.as_slice(),
            [MavMessage::MISSION_REQUEST_INT(req)] if req.seq == 0
        ));
        assert_eq!(state.with(|d| d.rally().stats().requests_resent), 1);
    }
}
