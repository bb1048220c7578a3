//! Black-box integration tests reproducing the concrete multi-node
//! scenarios from the protocol specification: a two-node line, a
//! three-node line, a diamond topology under each policy, and parent
//! aging — driven entirely through [`convergecast::node::Node`]'s public
//! receive/poll API, with a small in-process recording radio standing in
//! for the real link layer (same role `radio::mock::MockRadio` plays in
//! the crate's own unit tests, but here we care about actually relaying
//! the captured bytes between nodes rather than asserting exact
//! transactions).

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use convergecast::config::Config;
use convergecast::node::Node;
use convergecast::policy::Policy;
use convergecast::radio_link::Link;
use convergecast::sensor::{Indicator, NullIndicator, SensorSource};
use convergecast::timer::Timer;
use convergecast::SINK_ID;

#[derive(Clone, Default)]
struct TestClock(Rc<Cell<u32>>);

impl TestClock {
    fn set(&self, ms: u32) {
        self.0.set(ms);
    }
}

impl Timer for TestClock {
    fn ticks_ms(&self) -> u32 {
        self.0.get()
    }
}

#[derive(Clone, Copy)]
struct FixedSensor(u16);

impl SensorSource for FixedSensor {
    fn sample(&mut self) -> u16 {
        self.0
    }
}

#[derive(Clone, Default)]
struct RecordingRadio(Rc<RefCell<Option<(u16, Vec<u8>)>>>);

impl RecordingRadio {
    fn take(&self) -> Option<(u16, Vec<u8>)> {
        self.0.borrow_mut().take()
    }
}

impl radio::Transmit for RecordingRadio {
    type Error = Infallible;

    fn start_transmit(&mut self, data: &[u8]) -> Result<(), Infallible> {
        let dest = self.0.borrow().as_ref().map(|(d, _)| *d).unwrap_or(0);
        *self.0.borrow_mut() = Some((dest, data.to_vec()));
        Ok(())
    }

    fn check_transmit(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }
}

impl Link<Infallible> for RecordingRadio {
    fn set_destination(&mut self, dest: u16) {
        let payload = self.0.borrow().as_ref().map(|(_, p)| p.clone());
        *self.0.borrow_mut() = Some((dest, payload.unwrap_or_default()));
    }
}

type TestNode = Node<RecordingRadio, Infallible, TestClock, FixedSensor, NullIndicator, 4>;

struct Rig {
    node: TestNode,
    beacon: RecordingRadio,
    data: RecordingRadio,
    ack: RecordingRadio,
}

fn rig(id: u16, clock: TestClock, cfg: Config) -> Rig {
    let beacon = RecordingRadio::default();
    let data = RecordingRadio::default();
    let ack = RecordingRadio::default();
    let node = Node::new(id, cfg, clock, FixedSensor(6000), NullIndicator, beacon.clone(), data.clone(), ack.clone());
    Rig { node, beacon, data, ack }
}

/// Deliver `rig`'s pending beacon (if any) to every listener in `to`.
fn flood_beacon(rig: &mut Rig, to: &mut [&mut Rig]) {
    if let Some((_, payload)) = rig.beacon.take() {
        for peer in to.iter_mut() {
            peer.node.on_beacon(-40, &payload).unwrap();
        }
    }
}

fn deliver_data(from: &mut Rig, to: &mut Rig) {
    if let Some((_, payload)) = from.data.take() {
        to.node.on_data(from.node.id(), &payload).unwrap();
    }
}

fn deliver_ack(from: &mut Rig, to: &mut Rig) {
    if let Some((_, payload)) = from.ack.take() {
        to.node.on_ack(&payload).unwrap();
    }
}

#[test]
fn two_node_line_delivers_after_startup_and_one_beacon() {
    let clock = TestClock::default();
    let mut sink = rig(SINK_ID, clock.clone(), Config::default());
    let mut node2 = rig(2, clock.clone(), Config::default());

    clock.set(0);
    sink.node.poll().unwrap();
    node2.node.poll().unwrap();
    assert_eq!(node2.node.parent(), None);

    clock.set(5_000);
    sink.node.poll().unwrap();
    flood_beacon(&mut sink, &mut [&mut node2]);

    assert_eq!(node2.node.parent(), Some(SINK_ID));
    let slot_idx = node2.node.neighbors().find(SINK_ID).unwrap();
    assert_eq!(node2.node.neighbors().get(slot_idx).hops_via, 1);

    node2.node.poll().unwrap();
    deliver_data(&mut node2, &mut sink);
    deliver_ack(&mut sink, &mut node2);

    assert_eq!(sink.node.hop_histogram()[1], 1);
}

#[test]
fn three_node_line_delivers_with_two_hops() {
    let clock = TestClock::default();
    let mut sink = rig(SINK_ID, clock.clone(), Config::default());
    let mut mid = rig(2, clock.clone(), Config::default());
    let mut leaf = rig(3, clock.clone(), Config::default());

    clock.set(5_000);
    sink.node.poll().unwrap();
    flood_beacon(&mut sink, &mut [&mut mid]);
    assert_eq!(mid.node.parent(), Some(SINK_ID));

    mid.node.poll().unwrap();
    flood_beacon(&mut mid, &mut [&mut leaf]);

    let slot_idx = leaf.node.neighbors().find(2).unwrap();
    assert_eq!(leaf.node.neighbors().get(slot_idx).hops_via, 2);
    assert_eq!(leaf.node.parent(), Some(2));

    leaf.node.poll().unwrap();
    deliver_data(&mut leaf, &mut mid);
    deliver_data(&mut mid, &mut sink);

    assert_eq!(sink.node.hop_histogram()[2], 1);
}

#[test]
fn diamond_under_hop_policy_prefers_fewer_hops() {
    let clock = TestClock::default();
    let mut sink = rig(SINK_ID, clock.clone(), Config { policy: Policy::Hop, ..Config::default() });
    let mut a = rig(2, clock.clone(), Config { policy: Policy::Hop, ..Config::default() });
    let mut b = rig(3, clock.clone(), Config { policy: Policy::Hop, ..Config::default() });
    let mut leaf = rig(4, clock.clone(), Config { policy: Policy::Hop, ..Config::default() });

    clock.set(5_000);
    sink.node.poll().unwrap();
    flood_beacon(&mut sink, &mut [&mut a, &mut b]);
    assert_eq!(a.node.parent(), Some(SINK_ID));
    assert_eq!(b.node.parent(), Some(SINK_ID));

    flood_beacon(&mut a, &mut [&mut leaf]);
    flood_beacon(&mut b, &mut [&mut leaf]);

    // Both 2 and 3 are now in leaf's table with hops_via == 2; force a
    // reselect pass (rather than relying on whichever beacon happened to
    // bootstrap the parent pointer first) so the policy's own scoring and
    // tie-break actually run.
    clock.set(9_000);
    leaf.node.poll().unwrap();

    // Tied on hops_via (2) and rssi (both delivered at -40 by
    // `flood_beacon`): the lower id wins.
    assert_eq!(leaf.node.parent(), Some(2));
}

#[test]
fn diamond_under_rssi_policy_prefers_stronger_signal() {
    let clock = TestClock::default();
    let mut sink = rig(SINK_ID, clock.clone(), Config { policy: Policy::Rssi, ..Config::default() });
    let mut a = rig(2, clock.clone(), Config { policy: Policy::Rssi, ..Config::default() });
    let mut b = rig(3, clock.clone(), Config { policy: Policy::Rssi, ..Config::default() });
    let mut leaf = rig(4, clock.clone(), Config { policy: Policy::Rssi, ..Config::default() });

    clock.set(5_000);
    sink.node.poll().unwrap();
    flood_beacon(&mut sink, &mut [&mut a, &mut b]);

    if let Some((_, payload)) = a.beacon.take() {
        leaf.node.on_beacon(-70, &payload).unwrap();
    }
    if let Some((_, payload)) = b.beacon.take() {
        leaf.node.on_beacon(-30, &payload).unwrap();
    }

    // Force a reselect pass so the actual rssi scoring runs instead of
    // whichever beacon happened to bootstrap the parent pointer first.
    clock.set(9_000);
    leaf.node.poll().unwrap();

    assert_eq!(leaf.node.parent(), Some(3));
}

#[test]
fn parent_ages_out_after_ttl_elapses_with_no_refresh() {
    let clock = TestClock::default();
    let cfg = Config { nbr_ttl_ms: 180_000, t_reselect_ms: 9_000, ..Config::default() };
    let mut sink = rig(SINK_ID, clock.clone(), cfg.clone());
    let mut node2 = rig(2, clock.clone(), cfg);

    clock.set(5_000);
    sink.node.poll().unwrap();
    flood_beacon(&mut sink, &mut [&mut node2]);
    assert_eq!(node2.node.parent(), Some(SINK_ID));

    // No further beacons arrive; once the TTL elapses, the next reselect
    // pass must clear the parent pointer.
    clock.set(5_000 + 180_000 + 9_000);
    node2.node.poll().unwrap();

    assert_eq!(node2.node.parent(), None);
    assert!(node2.node.neighbors().find(SINK_ID).is_none());
}
