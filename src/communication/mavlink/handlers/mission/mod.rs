//! Mission Item Protocol
//!
//! One [`MissionItemProtocol`] session exists per mission category. It runs
//! the item-transfer half of the MAVLink mission protocol on top of an
//! [`ItemStore`] and a set of links.
//!
//! # Upload Flow (GCS → vehicle)
//!
//! 1. GCS sends MISSION_COUNT (or MISSION_WRITE_PARTIAL_LIST for a window)
//! 2. Vehicle responds with MISSION_REQUEST_INT for the first index
//! 3. GCS sends MISSION_ITEM_INT for that index
//! 4. Vehicle requests the next index, until the window is exhausted
//! 5. Vehicle sends MISSION_ACK with the store's verdict
//!
//! Items must arrive strictly in order. A bad item aborts the whole upload.
//! A lost request is resent from [`MissionItemProtocol::update`] once the
//! resend interval passes; an upload with no accepted item for
//! `upload_timeout_ms` is cancelled.
//!
//! # Download Flow (vehicle → GCS)
//!
//! Request-list and item fetches only read the store. They are denied while
//! an upload is in progress.
//!
//! # Ownership
//!
//! One peer (system id + component id) owns an upload. Another peer's
//! MISSION_COUNT is denied; the owner's own MISSION_COUNT restarts it.

pub mod config;
pub mod convert;
pub mod fence;
pub mod rally;
pub mod store;
pub mod waypoints;

use core::fmt::Write;

use heapless::String;
use mavlink::common::{
    MavMessage, MavMissionResult, MavMissionType, MISSION_ACK_DATA, MISSION_CLEAR_ALL_DATA,
    MISSION_COUNT_DATA, MISSION_ITEM_DATA, MISSION_ITEM_INT_DATA, MISSION_REQUEST_DATA,
    MISSION_REQUEST_INT_DATA, MISSION_REQUEST_LIST_DATA, MISSION_WRITE_PARTIAL_LIST_DATA,
};

use crate::communication::mavlink::link::{Channel, LinkSet, MissionLink, Origin, OutboundKind};
use crate::communication::mavlink::status_notifier;
use crate::core::internal_error::{self, InternalError};

pub use config::TransferConfig;
pub use fence::FenceStore;
pub use rally::RallyStore;
pub use store::{mission_type_name, result_name, ItemStore};
pub use waypoints::WaypointStore;

/// Upload counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolStats {
    /// Uploads the store accepted
    pub uploads_completed: u32,
    /// Uploads aborted by a rejected item or a rejected commit
    pub uploads_failed: u32,
    /// Uploads abandoned for inactivity
    pub timeouts: u32,
    /// Item requests resent by the tick
    pub requests_resent: u32,
}

/// Item transfer session for one mission category
pub struct MissionItemProtocol<S: ItemStore> {
    store: S,
    config: TransferConfig,

    receiving: bool,
    /// Next index expected from the uploader
    request_i: u16,
    /// Last index of the upload window (inclusive)
    request_last: u16,
    dest_sysid: u8,
    dest_compid: u8,
    /// Link the upload is bound to; `Some` exactly while `receiving`
    link: Option<Channel>,

    timelast_receive_ms: u64,
    timelast_request_ms: u64,
    /// An item request could not be queued and is owed to the uploader
    request_pending: bool,

    mission_item_warning_sent: bool,
    mission_request_warning_sent: bool,
    mavlink2_warning_sent: bool,

    stats: ProtocolStats,
}

impl<S: ItemStore> MissionItemProtocol<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, TransferConfig::default())
    }

    pub fn with_config(store: S, config: TransferConfig) -> Self {
        Self {
            store,
            config,
            receiving: false,
            request_i: 0,
            request_last: 0,
            dest_sysid: 0,
            dest_compid: 0,
            link: None,
            timelast_receive_ms: 0,
            timelast_request_ms: 0,
            request_pending: false,
            mission_item_warning_sent: false,
            mission_request_warning_sent: false,
            mavlink2_warning_sent: false,
            stats: ProtocolStats::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> TransferConfig {
        self.config
    }

    pub fn mission_type(&self) -> MavMissionType {
        self.store.mission_type()
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    pub fn request_i(&self) -> u16 {
        self.request_i
    }

    pub fn request_last(&self) -> u16 {
        self.request_last
    }

    /// Peer that owns the current upload
    pub fn uploader(&self) -> Option<(u8, u8)> {
        self.receiving.then_some((self.dest_sysid, self.dest_compid))
    }

    pub fn bound_channel(&self) -> Option<Channel> {
        self.link
    }

    pub fn is_request_pending(&self) -> bool {
        self.request_pending
    }

    pub fn stats(&self) -> ProtocolStats {
        self.stats
    }

    /// Give up an upload owned by `origin`'s peer.
    ///
    /// Succeeds when idle. Fails with `MAV_MISSION_DENIED` when another peer
    /// owns the upload, leaving it untouched.
    pub fn cancel_upload(&mut self, origin: &Origin) -> Result<(), MavMissionResult> {
        if self.receiving {
            if !origin.same_peer(self.dest_sysid, self.dest_compid) {
                return Err(MavMissionResult::MAV_MISSION_DENIED);
            }
            // The new count may differ; resources are allocated again
            self.end_upload();
        }
        Ok(())
    }

    /// Categories other than the plain mission need MAVLink 2.
    ///
    /// Rejects with `MAV_MISSION_UNSUPPORTED` and returns false for a
    /// MAVLink 1 peer.
    pub fn mavlink2_requirement_met<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: &Origin,
    ) -> bool {
        if self.store.mission_type() == MavMissionType::MAV_MISSION_TYPE_MISSION {
            return true;
        }
        let mavlink1 = links
            .link_mut(origin.channel)
            .map(|link| link.sending_mavlink1())
            .unwrap_or(false);
        if !mavlink1 {
            return true;
        }
        if !self.mavlink2_warning_sent {
            self.mavlink2_warning_sent = true;
            status_notifier::send_warning("Need mavlink2 for item transfer");
        }
        self.send_ack(links, origin, MavMissionResult::MAV_MISSION_UNSUPPORTED);
        false
    }

    /// MISSION_COUNT: start (or restart) a full upload
    pub fn handle_mission_count<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        packet: &MISSION_COUNT_DATA,
        now_ms: u64,
    ) {
        if !self.mavlink2_requirement_met(links, &origin) {
            return;
        }
        if let Err(result) = self.cancel_upload(&origin) {
            crate::log_warn!(
                "{} upload from {} denied: busy with {}",
                mission_type_name(self.mission_type()),
                origin.system_id,
                self.dest_sysid
            );
            self.send_ack(links, &origin, result);
            return;
        }

        let max_items = self.store.max_items();
        if packet.count > max_items {
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_NO_SPACE);
            let mut text: String<50> = String::new();
            let _ = write!(text, "Only {} items are supported", max_items);
            status_notifier::send_warning(&text);
            return;
        }

        if let Err(result) = self.store.allocate_receive_resources(packet.count) {
            self.send_ack(links, &origin, result);
            return;
        }
        self.store.truncate(packet.count);

        if packet.count == 0 {
            self.transfer_is_complete(links, &origin);
            return;
        }

        self.init_send_requests(links, &origin, 0, packet.count - 1, now_ms);
    }

    /// MISSION_WRITE_PARTIAL_LIST: upload `start_index..=end_index` over the
    /// existing items
    pub fn handle_write_partial_list<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        packet: &MISSION_WRITE_PARTIAL_LIST_DATA,
        now_ms: u64,
    ) {
        if !self.mavlink2_requirement_met(links, &origin) {
            return;
        }
        // Any upload in progress blocks a partial write, whatever its window
        if self.receiving {
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_DENIED);
            return;
        }

        let count = i32::from(self.store.item_count());
        let start = i32::from(packet.start_index);
        let end = i32::from(packet.end_index);
        if start < 0 || end < 0 || start > count || end > count || end < start {
            crate::log_warn!("Partial list {}..{} rejected, have {}", start, end, count);
            status_notifier::send_warning("Flight plan update rejected");
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_ERROR);
            return;
        }

        if let Err(result) = self.store.allocate_update_resources() {
            self.send_ack(links, &origin, result);
            return;
        }

        self.init_send_requests(links, &origin, start as u16, end as u16, now_ms);
    }

    /// MISSION_ITEM_INT: one item of the active upload
    pub fn handle_mission_item_int<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        item: &MISSION_ITEM_INT_DATA,
        now_ms: u64,
    ) {
        if !self.receiving {
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_ERROR);
            return;
        }
        let Some(channel) = self.bound_link().filter(|c| links.link_mut(*c).is_some()) else {
            internal_error::report(InternalError::MissionProtocolLink);
            return;
        };
        // Replies to the uploader go out on the upload's link
        let reply_to = Origin::new(channel, origin.system_id, origin.component_id);

        if item.seq != self.request_i {
            crate::log_debug!("Item {} out of order, want {}", item.seq, self.request_i);
            self.send_ack(links, &reply_to, MavMissionResult::MAV_MISSION_INVALID_SEQUENCE);
            return;
        }
        if !origin.same_peer(self.dest_sysid, self.dest_compid) {
            self.send_ack(links, &reply_to, MavMissionResult::MAV_MISSION_DENIED);
            return;
        }

        let item_count = self.store.item_count();
        let result = if item.seq < item_count {
            self.store.replace_item(item)
        } else if item.seq == item_count {
            self.store.append_item(item)
        } else {
            Err(MavMissionResult::MAV_MISSION_ERROR)
        };

        if let Err(result) = result {
            crate::log_warn!("Item {} rejected: {}", item.seq, result_name(result));
            self.send_ack(links, &reply_to, result);
            self.end_upload();
            self.stats.uploads_failed += 1;
            return;
        }

        self.timelast_receive_ms = now_ms;
        self.request_i += 1;
        if self.request_i > self.request_last {
            self.transfer_is_complete(links, &reply_to);
            return;
        }

        self.queued_request_send(links, now_ms);
    }

    /// MISSION_ITEM: legacy float item, converted then handled as
    /// MISSION_ITEM_INT
    pub fn handle_mission_item<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        item: &MISSION_ITEM_DATA,
        now_ms: u64,
    ) {
        let item_int = match convert::item_to_item_int(item) {
            Ok(item_int) => item_int,
            Err(result) => {
                self.send_ack(links, &origin, result);
                return;
            }
        };
        if !self.mission_item_warning_sent {
            self.mission_item_warning_sent = true;
            status_notifier::send_warning("got MISSION_ITEM; GCS should send MISSION_ITEM_INT");
        }
        self.handle_mission_item_int(links, origin, &item_int, now_ms);
    }

    /// MISSION_REQUEST_LIST: report the item count
    pub fn handle_request_list<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        _packet: &MISSION_REQUEST_LIST_DATA,
    ) {
        if !self.mavlink2_requirement_met(links, &origin) {
            return;
        }
        if self.receiving {
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_DENIED);
            return;
        }
        self.send_count(links, &origin);
    }

    /// MISSION_REQUEST_INT: send one item
    pub fn handle_request_int<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        packet: &MISSION_REQUEST_INT_DATA,
    ) {
        if !self.mavlink2_requirement_met(links, &origin) {
            return;
        }
        if self.receiving {
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_DENIED);
            return;
        }

        let mut item = match self.store.get_item(packet.seq) {
            Ok(item) => item,
            Err(result) => {
                if result == MavMissionResult::MAV_MISSION_INVALID_SEQUENCE {
                    // Tell the GCS how long the list really is
                    self.send_count(links, &origin);
                }
                self.send_ack(links, &origin, result);
                return;
            }
        };
        item.target_system = origin.system_id;
        item.target_component = origin.component_id;
        send_on(links, origin.channel, MavMessage::MISSION_ITEM_INT(item));
    }

    /// MISSION_REQUEST: send one item in the legacy float layout
    pub fn handle_request<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        packet: &MISSION_REQUEST_DATA,
    ) {
        if !self.mavlink2_requirement_met(links, &origin) {
            return;
        }
        if self.receiving {
            self.send_ack(links, &origin, MavMissionResult::MAV_MISSION_DENIED);
            return;
        }

        let mut item_int = match self.store.get_item(packet.seq) {
            Ok(item) => item,
            Err(result) => {
                self.send_ack(links, &origin, result);
                return;
            }
        };
        item_int.target_system = origin.system_id;
        item_int.target_component = origin.component_id;

        let item = match convert::item_int_to_item(&item_int) {
            Ok(item) => item,
            Err(result) => {
                self.send_ack(links, &origin, result);
                return;
            }
        };
        if !self.mission_request_warning_sent {
            self.mission_request_warning_sent = true;
            status_notifier::send_warning("got MISSION_REQUEST; use MISSION_REQUEST_INT!");
        }
        send_on(links, origin.channel, MavMessage::MISSION_ITEM(item));
    }

    /// MISSION_CLEAR_ALL: cancel the peer's upload and empty the store
    pub fn handle_clear_all<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: Origin,
        _packet: &MISSION_CLEAR_ALL_DATA,
    ) {
        let result = if self.clear_all(&origin) {
            MavMissionResult::MAV_MISSION_ACCEPTED
        } else {
            MavMissionResult::MAV_MISSION_ERROR
        };
        self.send_ack(links, &origin, result);
    }

    /// Cancel `origin`'s upload and clear the store, without replying
    pub fn clear_all(&mut self, origin: &Origin) -> bool {
        self.cancel_upload(origin).is_ok() && self.store.clear_all_items()
    }

    /// Periodic tick: upload timeout and request resends
    pub fn update<K: LinkSet + ?Sized>(&mut self, links: &mut K, now_ms: u64) {
        if !self.receiving {
            return;
        }
        let Some(channel) = self.bound_link() else {
            internal_error::report(InternalError::MissionProtocolLink);
            return;
        };

        if now_ms.saturating_sub(self.timelast_receive_ms) > u64::from(self.config.upload_timeout_ms)
        {
            crate::log_warn!(
                "{} upload timed out at item {}",
                mission_type_name(self.mission_type()),
                self.request_i
            );
            self.receiving = false;
            self.store.timeout();
            let dest = Origin::new(channel, self.dest_sysid, self.dest_compid);
            self.send_ack(links, &dest, MavMissionResult::MAV_MISSION_OPERATION_CANCELLED);
            self.end_upload();
            self.stats.timeouts += 1;
            return;
        }

        if self.request_pending {
            self.queued_request_send(links, now_ms);
            return;
        }

        let slowdown_ms = match links.link_mut(channel) {
            Some(link) => link.stream_slowdown_ms(),
            None => {
                internal_error::report(InternalError::MissionProtocolLink);
                return;
            }
        };
        let resend_ms = u64::from(self.config.request_resend_ms) + u64::from(slowdown_ms);
        if now_ms.saturating_sub(self.timelast_request_ms) > resend_ms {
            crate::log_debug!("Resending request for item {}", self.request_i);
            self.timelast_request_ms = now_ms;
            self.stats.requests_resent += 1;
            self.queued_request_send(links, now_ms);
        }
    }

    fn init_send_requests<K: LinkSet + ?Sized>(
        &mut self,
        links: &mut K,
        origin: &Origin,
        request_first: u16,
        request_last: u16,
        now_ms: u64,
    ) {
        crate::log_info!(
            "{} upload from {}: items {}..={}",
            mission_type_name(self.mission_type()),
            origin.system_id,
            request_first,
            request_last
        );
        self.timelast_receive_ms = now_ms;
        self.receiving = true;
        self.request_i = request_first;
        self.request_last = request_last;
        self.dest_sysid = origin.system_id;
        self.dest_compid = origin.component_id;
        self.link = Some(origin.channel);
        self.timelast_request_ms = now_ms;
        self.mission_item_warning_sent = false;
        self.mission_request_warning_sent = false;
        self.queued_request_send(links, now_ms);
    }

    /// Commit the upload and report the store's verdict to `origin`
    fn transfer_is_complete<K: LinkSet + ?Sized>(&mut self, links: &mut K, origin: &Origin) {
        let result = self.store.complete();
        self.send_ack(links, origin, result);
        self.end_upload();

        if result == MavMissionResult::MAV_MISSION_ACCEPTED {
            self.stats.uploads_completed += 1;
            crate::log_info!(
                "{} upload complete: {} items",
                mission_type_name(self.mission_type()),
                self.store.item_count()
            );
        } else {
            self.stats.uploads_failed += 1;
            crate::log_warn!(
                "{} upload rejected: {}",
                mission_type_name(self.mission_type()),
                result_name(result)
            );
        }
    }

    /// Request `request_i` from the uploader, or mark it owed if the link is
    /// full
    fn queued_request_send<K: LinkSet + ?Sized>(&mut self, links: &mut K, now_ms: u64) {
        self.request_pending = false;
        if !self.receiving || self.request_i > self.request_last {
            return;
        }
        let Some(channel) = self.bound_link() else {
            internal_error::report(InternalError::MissionProtocolLink);
            return;
        };
        let Some(link) = links.link_mut(channel) else {
            internal_error::report(InternalError::MissionProtocolLink);
            return;
        };
        if !link.has_space(OutboundKind::MissionRequestInt) {
            self.request_pending = true;
            return;
        }
        crate::log_trace!("Requesting item {}", self.request_i);
        link.send_message(MavMessage::MISSION_REQUEST_INT(MISSION_REQUEST_INT_DATA {
            target_system: self.dest_sysid,
            target_component: self.dest_compid,
            seq: self.request_i,
            mission_type: self.store.mission_type(),
        }));
        self.timelast_request_ms = now_ms;
    }

    fn send_count<K: LinkSet + ?Sized>(&self, links: &mut K, origin: &Origin) {
        send_on(
            links,
            origin.channel,
            MavMessage::MISSION_COUNT(MISSION_COUNT_DATA {
                target_system: origin.system_id,
                target_component: origin.component_id,
                count: self.store.item_count(),
                mission_type: self.store.mission_type(),
                opaque_id: 0,
            }),
        );
    }

    /// Best effort; skipped when the link has no room
    fn send_ack<K: LinkSet + ?Sized>(&self, links: &mut K, to: &Origin, result: MavMissionResult) {
        crate::log_debug!(
            "{} ack to {}: {}",
            mission_type_name(self.mission_type()),
            to.system_id,
            result_name(result)
        );
        send_on(
            links,
            to.channel,
            MavMessage::MISSION_ACK(MISSION_ACK_DATA {
                target_system: to.system_id,
                target_component: to.component_id,
                mavtype: result,
                mission_type: self.store.mission_type(),
                opaque_id: 0,
            }),
        );
    }

    fn bound_link(&self) -> Option<Channel> {
        debug_assert!(self.receiving, "mission link read while idle");
        self.link
    }

    /// Leave Receiving on any exit path
    fn end_upload(&mut self) {
        self.receiving = false;
        self.link = None;
        self.request_pending = false;
        self.store.free_upload_resources();
    }
}

/// Queue `message` on `channel` if it fits
pub(crate) fn send_on<K: LinkSet + ?Sized>(links: &mut K, channel: Channel, message: MavMessage) -> bool {
    let Some(link) = links.link_mut(channel) else {
        crate::log_debug!("No link on channel {}", channel.0);
        return false;
    };
    let fits = OutboundKind::of(&message).map_or(true, |kind| link.has_space(kind));
    if fits {
        link.send_message(message);
    }
    fits
}
