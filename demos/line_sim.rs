//! Runnable demonstration of the convergecast kernel: a line topology of
//! simulated nodes, driven by a host-owned tick loop with an in-memory
//! radio medium (no real hardware required).
//!
//! Mirrors the shape of the teacher crate's own `examples/lpwan-sx128x.rs`:
//! `structopt` for CLI options, `simplelog` for logging, `ctrlc` for a
//! clean shutdown, and a plain `loop { ... tick() ... }` main loop — but
//! in place of an SPI radio driver, three in-process `SimRadio` handles
//! per node stand in for the beacon/data/ACK channels, and an explicit
//! `deliver` step plays postal service between them once per tick.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use structopt::StructOpt;

use convergecast::diag::HopHistLine;
use convergecast::prelude::*;
use convergecast::radio_link::Link;

/// Spacing between adjacent nodes in the simulated line, in abstract
/// distance units.
const RANGE_STEP: f32 = 50.0;
/// Maximum distance at which a transmission is heard at all. Chosen so a
/// node hears its immediate neighbors on the line but not a two-hop node.
const RANGE: f32 = 60.0;

#[derive(Debug, Clone, Copy)]
struct PolicyArg(Policy);

impl std::str::FromStr for PolicyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hop" => Ok(PolicyArg(Policy::Hop)),
            "rssi" => Ok(PolicyArg(Policy::Rssi)),
            "prr" => Ok(PolicyArg(Policy::Prr)),
            other => Err(format!("unknown policy '{}' (expected hop, rssi, or prr)", other)),
        }
    }
}

#[derive(Debug, StructOpt)]
struct Options {
    /// Number of non-sink nodes in the simulated line (sink is node 1).
    #[structopt(long, default_value = "4")]
    nodes: usize,

    /// Parent-selection policy to run the whole network under.
    #[structopt(long, default_value = "prr")]
    policy: PolicyArg,

    /// Simulated wall-clock duration to run for.
    #[structopt(long, default_value = "10m")]
    duration: humantime::Duration,

    /// Simulated time advanced per scheduler tick.
    #[structopt(long, default_value = "1s")]
    tick: humantime::Duration,

    /// Per-transmission loss probability, in percent.
    #[structopt(long, default_value = "0")]
    loss_pct: f32,

    /// PRNG seed for RSSI jitter, sensor noise, and simulated loss.
    #[structopt(long, default_value = "1")]
    seed: u64,

    #[structopt(long, default_value = "info")]
    log_level: simplelog::LevelFilter,
}

/// Shared monotonic clock driving every node's [`Timer`] in lockstep.
#[derive(Clone, Default)]
struct SimClock(Rc<Cell<u32>>);

impl SimClock {
    fn advance(&self, delta_ms: u32) {
        self.0.set(self.0.get() + delta_ms);
    }
}

impl Timer for SimClock {
    fn ticks_ms(&self) -> u32 {
        self.0.get()
    }
}

/// Produces a temperature-like raw code jittering around a per-node
/// baseline, standing in for the real sensor driver.
struct SimSensor {
    baseline: i32,
    rng: StdRng,
}

impl SensorSource for SimSensor {
    fn sample(&mut self) -> u16 {
        let jitter = self.rng.gen_range(-50..=50);
        (self.baseline + jitter).clamp(0, u16::MAX as i32) as u16
    }
}

/// Logs a line instead of driving a physical LED.
struct SimIndicator {
    id: u16,
}

impl Indicator for SimIndicator {
    fn blink(&mut self) {
        debug!("node {} beacon indicator blink", self.id);
    }
}

/// A radio endpoint backing one logical channel of one simulated node.
///
/// `start_transmit` does not deliver anything itself — it just records the
/// most recent payload (and, for unicast channels, the destination bound
/// by `set_destination`) so the simulation's `deliver` step can play
/// medium and pick it up once per tick, mirroring how the real protocol
/// treats a send as synchronous-but-not-actually-received-yet.
#[derive(Clone, Default)]
struct SimRadio(Rc<RefCell<SimRadioState>>);

#[derive(Default)]
struct SimRadioState {
    dest: u16,
    pending: Option<(u16, Vec<u8>)>,
}

impl SimRadio {
    fn take(&self) -> Option<(u16, Vec<u8>)> {
        self.0.borrow_mut().pending.take()
    }
}

impl radio::Transmit for SimRadio {
    type Error = Infallible;

    fn start_transmit(&mut self, data: &[u8]) -> Result<(), Infallible> {
        let mut state = self.0.borrow_mut();
        let dest = state.dest;
        state.pending = Some((dest, data.to_vec()));
        Ok(())
    }

    fn check_transmit(&mut self) -> Result<bool, Infallible> {
        Ok(true)
    }
}

impl Link<Infallible> for SimRadio {
    fn set_destination(&mut self, dest: u16) {
        self.0.borrow_mut().dest = dest;
    }
}

/// Neighbor table capacity used by every simulated node; matches the
/// library's own [`convergecast::NBR_CAP`] default.
const SIM_NBR_CAP: usize = 10;

struct SimNode {
    id: u16,
    pos: f32,
    node: Node<SimRadio, Infallible, SimClock, SimSensor, SimIndicator, SIM_NBR_CAP>,
    beacon_radio: SimRadio,
    data_radio: SimRadio,
    ack_radio: SimRadio,
}

fn make_node(id: u16, pos: f32, cfg: Config, clock: SimClock, seed: u64) -> SimNode {
    let beacon_radio = SimRadio::default();
    let data_radio = SimRadio::default();
    let ack_radio = SimRadio::default();

    let node = Node::new(
        id,
        cfg,
        clock,
        SimSensor { baseline: 6000, rng: StdRng::seed_from_u64(seed.wrapping_add(id as u64)) },
        SimIndicator { id },
        beacon_radio.clone(),
        data_radio.clone(),
        ack_radio.clone(),
    );

    SimNode { id, pos, node, beacon_radio, data_radio, ack_radio }
}

fn build_line_topology(non_sink_count: usize, policy: Policy, clock: SimClock, seed: u64) -> Vec<SimNode> {
    let cfg = Config {
        // Scale the production cadence down so a demo run converges and
        // delivers data within a human-scale wall-clock duration.
        t_bc_ms: 5_000,
        t_data_ms: 8_000,
        t_reselect_ms: 2_000,
        t_print_ms: 10_000,
        t_startup_wait_ms: 1_000,
        policy,
        ..Config::default()
    };

    let mut nodes = Vec::with_capacity(non_sink_count + 1);
    nodes.push(make_node(SINK_ID, 0.0, cfg.clone(), clock.clone(), seed));
    for i in 0..non_sink_count {
        let id = SINK_ID + 1 + i as u16;
        let pos = RANGE_STEP * (i as f32 + 1.0);
        nodes.push(make_node(id, pos, cfg.clone(), clock.clone(), seed));
    }
    nodes
}

/// RSSI for a link of the given distance: a simple linear path-loss model
/// plus per-transmission noise, clamped to a plausible signed-dBm range.
fn rssi_for(distance: f32, rng: &mut StdRng) -> i8 {
    let noise: f32 = rng.gen_range(-4.0..=4.0);
    let raw = -30.0 - distance * 0.6 - noise;
    raw.clamp(-120.0, -20.0) as i8
}

fn lost(rng: &mut StdRng, loss_pct: f32) -> bool {
    loss_pct > 0.0 && rng.gen_range(0.0..100.0) < loss_pct
}

/// Play postal service for one tick: drain every node's three outboxes and
/// hand each payload to whichever node(s) the simulated medium says should
/// receive it.
fn deliver(nodes: &mut [SimNode], rng: &mut StdRng, loss_pct: f32) {
    let positions: Vec<(u16, f32)> = nodes.iter().map(|n| (n.id, n.pos)).collect();

    let mut beacons = Vec::new();
    let mut datas = Vec::new();
    let mut acks = Vec::new();
    for sn in nodes.iter() {
        if let Some((_, payload)) = sn.beacon_radio.take() {
            beacons.push((sn.id, payload));
        }
        if let Some((dest, payload)) = sn.data_radio.take() {
            datas.push((sn.id, dest, payload));
        }
        if let Some((dest, payload)) = sn.ack_radio.take() {
            acks.push((sn.id, dest, payload));
        }
    }

    for (src_id, payload) in beacons {
        let src_pos = positions.iter().find(|(id, _)| *id == src_id).map(|(_, p)| *p).unwrap();
        for sn in nodes.iter_mut() {
            if sn.id == src_id {
                continue;
            }
            let distance = (sn.pos - src_pos).abs();
            if distance > RANGE || lost(rng, loss_pct) {
                continue;
            }
            let rssi = rssi_for(distance, rng);
            sn.node.on_beacon(rssi, &payload).expect("simulated beacon frame always decodes");
        }
    }

    for (src_id, dest, payload) in datas {
        if lost(rng, loss_pct) {
            continue;
        }
        if let Some(sn) = nodes.iter_mut().find(|sn| sn.id == dest) {
            sn.node.on_data(src_id, &payload).expect("simulated data frame always decodes");
        }
    }

    for (_src_id, dest, payload) in acks {
        if lost(rng, loss_pct) {
            continue;
        }
        if let Some(sn) = nodes.iter_mut().find(|sn| sn.id == dest) {
            sn.node.on_ack(&payload).expect("simulated ack frame always decodes");
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Options::from_args();

    let _ = simplelog::SimpleLogger::init(opts.log_level, simplelog::Config::default());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    info!(
        "starting line-sim: {} non-sink nodes, policy={:?}, duration={}, tick={}",
        opts.nodes, opts.policy.0, opts.duration, opts.tick
    );

    let clock = SimClock::default();
    let mut medium_rng = StdRng::seed_from_u64(opts.seed ^ 0xC0FFEE);
    let mut nodes = build_line_topology(opts.nodes, opts.policy.0, clock.clone(), opts.seed);

    let tick_ms = opts.tick.as_millis() as u32;
    let total_ms = opts.duration.as_millis() as u32;
    let mut elapsed_ms = 0u32;

    while running.load(Ordering::SeqCst) && elapsed_ms < total_ms {
        for sn in nodes.iter_mut() {
            sn.node.poll().expect("simulated radio link never fails to send");
            if let Some(event) = sn.node.take_event() {
                info!("node {}: {:?}", sn.id, event);
            }
        }

        deliver(&mut nodes, &mut medium_rng, opts.loss_pct);

        clock.advance(tick_ms);
        elapsed_ms += tick_ms;
    }

    info!("simulation complete after {} ms", elapsed_ms);
    for sn in &nodes {
        if sn.node.is_sink() {
            info!("sink hop histogram: {}", HopHistLine(sn.node.hop_histogram()));
        } else {
            info!("node {} parent={:?} neighbors={}", sn.id, sn.node.parent(), sn.node.neighbors().iter().count());
        }
    }

    Ok(())
}
