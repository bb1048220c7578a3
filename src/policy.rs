//! Parent-selection scoring policies and the reselection algorithm.
//!
//! The three policies are a closed set, represented as a tagged `enum`
//! rather than `dyn Trait` — there is no need for open-ended dynamic
//! dispatch here, and a plain enum keeps `Node` free of vtables, matching
//! the teacher crate's preference for tagged state-machine enums
//! (`RadioState`, `BasicMacState`, `CoreState`) over trait objects
//! throughout.

use crate::neighbor::{NeighborSlot, NeighborTable};
use crate::HOPS_UNKNOWN;

/// Active parent-selection scoring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Prefer the neighbor advertising the lowest hop count to the sink.
    Hop,
    /// Prefer the neighbor with the strongest received signal.
    Rssi,
    /// Prefer the neighbor with the best observed packet reception ratio.
    Prr,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: u16,
    score: f32,
    hops_via: u16,
    rssi: i8,
}

impl Policy {
    /// `(eligible, score)` for `slot` under this policy.
    ///
    /// A score of `-1.0` is the spec's sentinel for "not a candidate"
    /// (unknown hop distance under `Hop`, insufficient samples under
    /// `Prr`); `Rssi` has no such sentinel since a negative dBm reading is
    /// a perfectly ordinary score, so every present neighbor is eligible.
    fn score(&self, slot: &NeighborSlot, prr_min_samples: u32) -> (bool, f32) {
        match self {
            Policy::Hop => {
                if slot.hops_via < HOPS_UNKNOWN {
                    (true, 1.0 / (1.0 + slot.hops_via as f32))
                } else {
                    (false, -1.0)
                }
            }
            Policy::Rssi => (true, slot.rssi as f32),
            Policy::Prr => {
                if slot.tx >= prr_min_samples {
                    (true, slot.prr)
                } else {
                    (false, -1.0)
                }
            }
        }
    }
}

/// Scan `table` and return the best candidate under `policy`, breaking
/// ties by (1) lower `hops_via`, (2) higher `rssi`, (3) lower `id`.
fn best_candidate<const N: usize>(
    table: &NeighborTable<N>,
    policy: Policy,
    prr_min_samples: u32,
) -> Option<u16> {
    let mut best: Option<Candidate> = None;

    for slot in table.iter() {
        let (eligible, score) = policy.score(slot, prr_min_samples);
        if !eligible {
            continue;
        }
        let candidate = Candidate { id: slot.id, score, hops_via: slot.hops_via, rssi: slot.rssi };
        best = Some(match best {
            None => candidate,
            Some(current) => if is_better(&candidate, &current) { candidate } else { current },
        });
    }

    best.map(|c| c.id)
}

fn is_better(a: &Candidate, b: &Candidate) -> bool {
    if a.score != b.score {
        return a.score > b.score;
    }
    if a.hops_via != b.hops_via {
        return a.hops_via < b.hops_via;
    }
    if a.rssi != b.rssi {
        return a.rssi > b.rssi;
    }
    a.id < b.id
}

/// The fallback pass run when `Policy::Prr` finds no neighbor with enough
/// samples: score by hop distance with a reduced (hops_via, then rssi)
/// tie-break. Ties that survive both levels resolve to whichever
/// candidate was scanned first, which is itself deterministic given a
/// fixed table layout.
fn fallback_hop_candidate<const N: usize>(table: &NeighborTable<N>) -> Option<u16> {
    let mut best: Option<Candidate> = None;

    for slot in table.iter() {
        let (eligible, score) = Policy::Hop.score(slot, 0);
        if !eligible {
            continue;
        }
        let candidate = Candidate { id: slot.id, score, hops_via: slot.hops_via, rssi: slot.rssi };
        best = Some(match best {
            None => candidate,
            Some(current) => {
                let better = if candidate.score != current.score {
                    candidate.score > current.score
                } else {
                    candidate.rssi > current.rssi
                };
                if better {
                    candidate
                } else {
                    current
                }
            }
        });
    }

    best.map(|c| c.id)
}

/// Run one parent-reselection pass: pick the best candidate under
/// `policy`, falling back to a reduced-tie-break `Hop` pass if `policy`
/// is `Prr` and no neighbor has accumulated `prr_min_samples` yet.
///
/// Returns `None` if no candidate exists at all, in which case the caller
/// must leave the existing parent pointer untouched.
pub fn select_parent<const N: usize>(
    table: &NeighborTable<N>,
    policy: Policy,
    prr_min_samples: u32,
) -> Option<u16> {
    if let Some(id) = best_candidate(table, policy, prr_min_samples) {
        return Some(id);
    }
    if policy == Policy::Prr {
        return fallback_hop_candidate(table);
    }
    None
}
