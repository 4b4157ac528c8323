//! End-to-end mission transfer through the dispatcher
//!
//! A simulated GCS talks to a `MissionDispatcher` over `QueueLink`s, with the
//! clock driven by `MockTime`.

use mavlink::common::{
    MavCmd, MavFrame, MavMessage, MavMissionResult, MavMissionType, MISSION_COUNT_DATA,
    MISSION_ITEM_INT_DATA, MISSION_REQUEST_DATA, MISSION_REQUEST_INT_DATA,
    MISSION_REQUEST_LIST_DATA, MISSION_WRITE_PARTIAL_LIST_DATA,
};
use mavlink::MavHeader;
use mavmission::communication::mavlink::dispatcher::MissionDispatcher;
use mavmission::communication::mavlink::handlers::ItemStore;
use mavmission::communication::mavlink::link::{Channel, QueueLink};
use mavmission::communication::mavlink::status_notifier;
use mavmission::core::traits::MockTime;
use serial_test::serial;

const VEHICLE_SYSID: u8 = 1;

type Link = QueueLink<64>;

struct Gcs {
    header: MavHeader,
}

impl Gcs {
    fn new(system_id: u8) -> Self {
        Self {
            header: MavHeader {
                system_id,
                component_id: 190,
                sequence: 0,
            },
        }
    }

    fn count(&self, mission_type: MavMissionType, count: u16) -> MavMessage {
        MavMessage::MISSION_COUNT(MISSION_COUNT_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            count,
            mission_type,
            opaque_id: 0,
        })
    }

    fn waypoint(&self, seq: u16, alt: f32) -> MavMessage {
        MavMessage::MISSION_ITEM_INT(MISSION_ITEM_INT_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            seq,
            frame: MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT,
            command: MavCmd::MAV_CMD_NAV_WAYPOINT,
            current: 0,
            autocontinue: 1,
            param1: 0.0,
            param2: 2.0,
            param3: 0.0,
            param4: 0.0,
            x: 357_000_000 + i32::from(seq) * 10_000,
            y: 1_397_000_000,
            z: alt,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        })
    }

    fn fence_circle(&self, seq: u16, radius_m: f32) -> MavMessage {
        MavMessage::MISSION_ITEM_INT(MISSION_ITEM_INT_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            seq,
            frame: MavFrame::MAV_FRAME_GLOBAL_INT,
            command: MavCmd::MAV_CMD_NAV_FENCE_CIRCLE_INCLUSION,
            current: 0,
            autocontinue: 0,
            param1: radius_m,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            x: 357_000_000,
            y: 1_397_000_000,
            z: 0.0,
            mission_type: MavMissionType::MAV_MISSION_TYPE_FENCE,
        })
    }

    fn request_list(&self) -> MavMessage {
        MavMessage::MISSION_REQUEST_LIST(MISSION_REQUEST_LIST_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        })
    }

    fn request_int(&self, seq: u16) -> MavMessage {
        MavMessage::MISSION_REQUEST_INT(MISSION_REQUEST_INT_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            seq,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        })
    }

    fn partial(&self, start_index: i16, end_index: i16) -> MavMessage {
        MavMessage::MISSION_WRITE_PARTIAL_LIST(MISSION_WRITE_PARTIAL_LIST_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            start_index,
            end_index,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        })
    }
}

struct Vehicle<'a> {
    dispatcher: MissionDispatcher<&'a MockTime>,
    links: [Link; 2],
}

impl<'a> Vehicle<'a> {
    fn new(time: &'a MockTime) -> Self {
        Self {
            dispatcher: MissionDispatcher::new(VEHICLE_SYSID, 1, time),
            links: [Link::new(Channel(0)), Link::new(Channel(1))],
        }
    }

    fn receive(&mut self, channel: u8, gcs: &Gcs, message: MavMessage) {
        self.dispatcher
            .dispatch(&mut self.links[..], Channel(channel), &gcs.header, &message)
            .expect("mission message must be handled");
    }

    fn tick(&mut self) {
        self.dispatcher.update(&mut self.links[..]);
    }

    fn sent(&mut self, channel: usize) -> Vec<MavMessage> {
        self.links[channel].drain().collect()
    }
}

fn acks(messages: &[MavMessage]) -> Vec<MavMissionResult> {
    messages
        .iter()
        .filter_map(|m| match m {
            MavMessage::MISSION_ACK(ack) => Some(ack.mavtype),
            _ => None,
        })
        .collect()
}

fn requests(messages: &[MavMessage]) -> Vec<u16> {
    messages
        .iter()
        .filter_map(|m| match m {
            MavMessage::MISSION_REQUEST_INT(req) => Some(req.seq),
            _ => None,
        })
        .collect()
}

#[test]
#[serial]
fn upload_survives_out_of_order_item_then_downloads() {
    status_notifier::reset();
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let gcs = Gcs::new(255);

    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 3));
    assert_eq!(requests(&vehicle.sent(0)), vec![0]);

    time.advance_ms(100);
    vehicle.receive(0, &gcs, gcs.waypoint(0, 10.0));
    assert_eq!(requests(&vehicle.sent(0)), vec![1]);

    vehicle.receive(0, &gcs, gcs.waypoint(2, 30.0));
    assert_eq!(
        acks(&vehicle.sent(0)),
        vec![MavMissionResult::MAV_MISSION_INVALID_SEQUENCE]
    );
    assert_eq!(vehicle.dispatcher.waypoints().request_i(), 1);

    vehicle.receive(0, &gcs, gcs.waypoint(1, 20.0));
    vehicle.receive(0, &gcs, gcs.waypoint(2, 30.0));
    let out = vehicle.sent(0);
    assert_eq!(requests(&out), vec![2]);
    assert_eq!(acks(&out), vec![MavMissionResult::MAV_MISSION_ACCEPTED]);

    // Download what was uploaded
    vehicle.receive(0, &gcs, gcs.request_list());
    match vehicle.sent(0).as_slice() {
        [MavMessage::MISSION_COUNT(count)] => assert_eq!(count.count, 3),
        other => panic!("expected MISSION_COUNT, got {:?}", other),
    }
    vehicle.receive(0, &gcs, gcs.request_int(2));
    match vehicle.sent(0).as_slice() {
        [MavMessage::MISSION_ITEM_INT(item)] => {
            assert_eq!(item.seq, 2);
            assert_eq!(item.z, 30.0);
            assert_eq!(item.target_system, 255);
        }
        other => panic!("expected MISSION_ITEM_INT, got {:?}", other),
    }

    // "Flight plan received" reaches both links on the next tick
    vehicle.tick();
    assert!(vehicle
        .sent(1)
        .iter()
        .any(|m| matches!(m, MavMessage::STATUSTEXT(_))));
    status_notifier::reset();
}

#[test]
#[serial]
fn fetch_past_end_reports_real_count() {
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let gcs = Gcs::new(255);

    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 3));
    for seq in 0..3 {
        vehicle.receive(0, &gcs, gcs.waypoint(seq, 10.0));
    }
    vehicle.sent(0);

    vehicle.receive(0, &gcs, gcs.request_int(5));
    let out = vehicle.sent(0);
    assert!(matches!(&out[0], MavMessage::MISSION_COUNT(count) if count.count == 3));
    assert_eq!(acks(&out), vec![MavMissionResult::MAV_MISSION_INVALID_SEQUENCE]);
}

#[test]
#[serial]
fn competing_gcs_is_denied_until_upload_ends() {
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let first = Gcs::new(255);
    let second = Gcs::new(200);

    vehicle.receive(0, &first, first.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 2));
    vehicle.sent(0);

    vehicle.receive(1, &second, second.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 5));
    assert_eq!(acks(&vehicle.sent(1)), vec![MavMissionResult::MAV_MISSION_DENIED]);
    vehicle.receive(1, &second, second.request_list());
    assert_eq!(acks(&vehicle.sent(1)), vec![MavMissionResult::MAV_MISSION_DENIED]);

    vehicle.receive(0, &first, first.waypoint(0, 5.0));
    vehicle.receive(0, &first, first.waypoint(1, 5.0));
    assert_eq!(acks(&vehicle.sent(0)), vec![MavMissionResult::MAV_MISSION_ACCEPTED]);

    // Free again
    vehicle.receive(1, &second, second.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 1));
    assert_eq!(requests(&vehicle.sent(1)), vec![0]);
}

#[test]
#[serial]
fn silent_gcs_times_out() {
    status_notifier::reset();
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let gcs = Gcs::new(255);

    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 4));
    vehicle.sent(0);

    // Lost requests are resent while waiting
    time.set_ms(1_001);
    vehicle.tick();
    assert_eq!(requests(&vehicle.sent(0)), vec![0]);

    time.set_ms(8_001);
    vehicle.tick();
    let out = vehicle.sent(0);
    assert_eq!(
        acks(&out),
        vec![MavMissionResult::MAV_MISSION_OPERATION_CANCELLED]
    );
    assert!(!vehicle.dispatcher.is_receiving());
    assert_eq!(vehicle.dispatcher.waypoints().stats().timeouts, 1);
    status_notifier::reset();
}

#[test]
#[serial]
fn partial_update_rewrites_window_only() {
    status_notifier::reset();
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let gcs = Gcs::new(255);

    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 3));
    for seq in 0..3 {
        vehicle.receive(0, &gcs, gcs.waypoint(seq, 10.0));
    }
    vehicle.sent(0);

    vehicle.receive(0, &gcs, gcs.partial(2, 1));
    assert_eq!(acks(&vehicle.sent(0)), vec![MavMissionResult::MAV_MISSION_ERROR]);

    vehicle.receive(0, &gcs, gcs.partial(1, 1));
    assert_eq!(requests(&vehicle.sent(0)), vec![1]);
    vehicle.receive(0, &gcs, gcs.waypoint(1, 99.0));
    assert_eq!(acks(&vehicle.sent(0)), vec![MavMissionResult::MAV_MISSION_ACCEPTED]);

    let store = vehicle.dispatcher.waypoints().store();
    assert_eq!(store.item_count(), 3);
    assert_eq!(store.get_item(0).unwrap().z, 10.0);
    assert_eq!(store.get_item(1).unwrap().z, 99.0);
    status_notifier::reset();
}

#[test]
#[serial]
fn fence_needs_mavlink2_and_commits_atomically() {
    status_notifier::reset();
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let gcs = Gcs::new(255);

    vehicle.links[1].set_sending_mavlink1(true);
    vehicle.receive(1, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_FENCE, 1));
    let out = vehicle.sent(1);
    assert_eq!(acks(&out), vec![MavMissionResult::MAV_MISSION_UNSUPPORTED]);
    assert!(!vehicle.dispatcher.fence().is_receiving());

    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_FENCE, 1));
    vehicle.receive(0, &gcs, gcs.fence_circle(0, 200.0));
    assert_eq!(acks(&vehicle.sent(0)), vec![MavMissionResult::MAV_MISSION_ACCEPTED]);
    assert_eq!(vehicle.dispatcher.fence().store().committed().count(), 1);

    // A circle without a radius is refused and the old fence stays
    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_FENCE, 1));
    vehicle.receive(0, &gcs, gcs.fence_circle(0, 0.0));
    assert_eq!(
        acks(&vehicle.sent(0)),
        vec![MavMissionResult::MAV_MISSION_INVALID_PARAM1]
    );
    let fence = vehicle.dispatcher.fence().store();
    assert_eq!(fence.committed().count(), 1);
    assert_eq!(fence.get_item(0).unwrap().param1, 200.0);
    status_notifier::reset();
}

#[test]
#[serial]
fn legacy_gcs_download() {
    status_notifier::reset();
    let time = MockTime::new();
    let mut vehicle = Vehicle::new(&time);
    let gcs = Gcs::new(255);

    vehicle.receive(0, &gcs, gcs.count(MavMissionType::MAV_MISSION_TYPE_MISSION, 1));
    vehicle.receive(0, &gcs, gcs.waypoint(0, 12.5));
    vehicle.sent(0);

    vehicle.receive(
        0,
        &gcs,
        MavMessage::MISSION_REQUEST(MISSION_REQUEST_DATA {
            target_system: VEHICLE_SYSID,
            target_component: 1,
            seq: 0,
            mission_type: MavMissionType::MAV_MISSION_TYPE_MISSION,
        }),
    );
    match vehicle.sent(0).as_slice() {
        [MavMessage::MISSION_ITEM(item)] => {
            assert!((item.x - 35.7).abs() < 1e-4);
            assert!((item.y - 139.7).abs() < 1e-4);
            assert_eq!(item.z, 12.5);
        }
        other => panic!("expected MISSION_ITEM, got {:?}", other),
    }
    status_notifier::reset();
}
