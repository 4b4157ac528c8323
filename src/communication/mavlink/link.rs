//! Link Abstraction
//!
//! What the mission protocol needs from a MAVLink link, and nothing more:
//! send a message, ask whether a message of a given kind fits in the
//! transmit buffer right now, read the stream slowdown hint, and learn
//! whether the peer only speaks MAVLink 1.
//!
//! # Sharing
//!
//! One physical link carries every mission category (waypoints, fence,
//! rally). Sessions never own a link; they remember the [`Channel`] they
//! are bound to and look it up in a [`LinkSet`] on every call.
//!
//! ```text
//!   waypoints ─┐
//!   fence     ─┼── Option<Channel> ──► LinkSet ──► QueueLink (chan 0)
//!   rally     ─┘                                └─► QueueLink (chan 1)
//! ```

use heapless::Deque;
use mavlink::common::MavMessage;
use mavlink::MavHeader;

/// MAVLink frame overhead (v2 header + checksum, unsigned)
const FRAME_OVERHEAD: usize = 12;

/// Largest MAVLink 2 frame, used for messages this module has no size for
const MAX_FRAME_LEN: usize = 280;

/// Default transmit budget for a [`QueueLink`] (bytes)
pub const DEFAULT_TX_BUDGET: usize = 1024;

/// Identifies one physical link (the MAVLink "channel")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel(pub u8);

/// Sender of an inbound packet and the link it arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub channel: Channel,
    pub system_id: u8,
    pub component_id: u8,
}

impl Origin {
    pub fn new(channel: Channel, system_id: u8, component_id: u8) -> Self {
        Self {
            channel,
            system_id,
            component_id,
        }
    }

    /// Build from the header of a decoded packet
    pub fn from_header(channel: Channel, header: &MavHeader) -> Self {
        Self::new(channel, header.system_id, header.component_id)
    }

    /// Whether two origins name the same peer (the link is not compared)
    pub fn same_peer(&self, system_id: u8, component_id: u8) -> bool {
        self.system_id == system_id && self.component_id == component_id
    }
}

/// Outbound message kinds the protocol checks buffer space for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundKind {
    MissionAck,
    MissionCount,
    MissionRequestInt,
    MissionItemInt,
    MissionItem,
    StatusText,
}

impl OutboundKind {
    /// Payload length with all MAVLink 2 extensions
    pub const fn payload_len(self) -> usize {
        match self {
            OutboundKind::MissionAck => 8,
            OutboundKind::MissionCount => 9,
            OutboundKind::MissionRequestInt => 5,
            OutboundKind::MissionItemInt => 38,
            OutboundKind::MissionItem => 38,
            OutboundKind::StatusText => 54,
        }
    }

    /// Bytes the message occupies on the wire
    pub const fn frame_len(self) -> usize {
        self.payload_len() + FRAME_OVERHEAD
    }

    /// Classify an outbound message
    pub fn of(message: &MavMessage) -> Option<Self> {
        match message {
            MavMessage::MISSION_ACK(_) => Some(OutboundKind::MissionAck),
            MavMessage::MISSION_COUNT(_) => Some(OutboundKind::MissionCount),
            MavMessage::MISSION_REQUEST_INT(_) => Some(OutboundKind::MissionRequestInt),
            MavMessage::MISSION_ITEM_INT(_) => Some(OutboundKind::MissionItemInt),
            MavMessage::MISSION_ITEM(_) => Some(OutboundKind::MissionItem),
            MavMessage::STATUSTEXT(_) => Some(OutboundKind::StatusText),
            _ => None,
        }
    }
}

fn frame_len_of(message: &MavMessage) -> usize {
    OutboundKind::of(message)
        .map(OutboundKind::frame_len)
        .unwrap_or(MAX_FRAME_LEN)
}

/// Link operations used by the mission protocol
///
/// Sends are fire-and-forget: callers check [`MissionLink::has_space`]
/// first and skip best-effort messages when it returns false.
pub trait MissionLink {
    /// Channel this link is registered under
    fn channel(&self) -> Channel;

    /// Queue a message for transmission
    fn send_message(&mut self, message: MavMessage);

    /// Whether a message of `kind` fits in the transmit buffer right now
    fn has_space(&self, kind: OutboundKind) -> bool;

    /// Extra delay the stream scheduler is applying (milliseconds)
    fn stream_slowdown_ms(&self) -> u32;

    /// Whether the peer on this link only speaks MAVLink 1
    fn sending_mavlink1(&self) -> bool;
}

/// The set of links a dispatcher multiplexes over
pub trait LinkSet {
    type Link: MissionLink;

    /// Find the link registered under `channel`
    fn link_mut(&mut self, channel: Channel) -> Option<&mut Self::Link>;

    /// Visit every link
    fn for_each_link<F>(&mut self, f: F)
    where
        F: FnMut(&mut Self::Link);
}

impl<L: MissionLink> LinkSet for [L] {
    type Link = L;

    fn link_mut(&mut self, channel: Channel) -> Option<&mut L> {
        self.iter_mut().find(|link| link.channel() == channel)
    }

    fn for_each_link<F>(&mut self, f: F)
    where
        F: FnMut(&mut L),
    {
        self.iter_mut().for_each(f);
    }
}

/// Link statistics for monitoring and diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Messages accepted into the queue
    pub messages_queued: u32,
    /// Messages dropped because the buffer was full
    pub messages_dropped: u32,
}

/// Buffered link: outbound messages wait in a queue until the writer
/// task drains and serializes them.
///
/// Buffer space is accounted in wire bytes against a TX budget, the same
/// way the UART writer accounts its TX buffer.
pub struct QueueLink<const N: usize> {
    channel: Channel,
    queue: Deque<MavMessage, N>,
    queued_bytes: usize,
    tx_budget: usize,
    stream_slowdown_ms: u32,
    mavlink1: bool,
    stats: LinkStats,
}

impl<const N: usize> QueueLink<N> {
    /// Create a MAVLink 2 link with the default TX budget
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            queue: Deque::new(),
            queued_bytes: 0,
            tx_budget: DEFAULT_TX_BUDGET,
            stream_slowdown_ms: 0,
            mavlink1: false,
            stats: LinkStats::default(),
        }
    }

    pub fn set_tx_budget(&mut self, bytes: usize) {
        self.tx_budget = bytes;
    }

    pub fn set_stream_slowdown_ms(&mut self, ms: u32) {
        self.stream_slowdown_ms = ms;
    }

    pub fn set_sending_mavlink1(&mut self, mavlink1: bool) {
        self.mavlink1 = mavlink1;
    }

    /// Messages waiting for the writer
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Bytes waiting for the writer
    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Hand queued messages to the writer, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = MavMessage> + '_ {
        core::iter::from_fn(move || {
            let message = self.queue.pop_front()?;
            self.queued_bytes = self.queued_bytes.saturating_sub(frame_len_of(&message));
            Some(message)
        })
    }

    fn fits(&self, frame_len: usize) -> bool {
        !self.queue.is_full() && self.queued_bytes + frame_len <= self.tx_budget
    }
}

impl<const N: usize> MissionLink for QueueLink<N> {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn send_message(&mut self, message: MavMessage) {
        let frame_len = frame_len_of(&message);
        if !self.fits(frame_len) {
            self.stats.messages_dropped += 1;
            crate::log_debug!("Link {}: TX buffer full, message dropped", self.channel.0);
            return;
        }
        if self.queue.push_back(message).is_ok() {
            self.queued_bytes += frame_len;
            self.stats.messages_queued += 1;
        }
    }

    fn has_space(&self, kind: OutboundKind) -> bool {
        self.fits(kind.frame_len())
    }

    fn stream_slowdown_ms(&self) -> u32 {
        self.stream_slowdown_ms
    }

    fn sending_mavlink1(&self) -> bool {
        self.mavlink1
    }
}
