//! Fixed-capacity neighbor table with link-quality estimation and aging.
//!
//! This is the core shared data structure of the routing kernel: a
//! fixed-size array of [`NeighborSlot`]s (no growable container, no heap
//! allocation — freeing a slot is just clearing its `used` flag), following
//! the teacher crate's explicit preference for arrays with a `used` bit
//! over `Vec`/`heapless::Vec` for capacity-bounded tables.

use core::fmt::Write as _;

use heapless::String;

use crate::HOPS_UNKNOWN;

/// One neighbor's link-quality and routing state.
///
/// Invariants maintained by this module: at most one slot per `id`;
/// `rx_ack <= tx`; `prr == rx_ack / tx` whenever `tx > 0` (and `0.0`
/// otherwise); if `hops_via < HOPS_UNKNOWN` the neighbor has advertised
/// itself via a beacon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborSlot {
    pub id: u16,
    pub rssi: i8,
    pub hops_via: u16,
    pub tx: u32,
    pub rx_ack: u32,
    pub prr: f32,
    pub seen_at: u32,
    pub used: bool,
}

impl Default for NeighborSlot {
    fn default() -> Self {
        Self {
            id: 0,
            rssi: 0,
            hops_via: HOPS_UNKNOWN,
            tx: 0,
            rx_ack: 0,
            prr: 0.0,
            seen_at: 0,
            used: false,
        }
    }
}

/// Fixed-capacity table of one-hop neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborTable<const N: usize> {
    slots: [NeighborSlot; N],
}

impl<const N: usize> Default for NeighborTable<N> {
    fn default() -> Self {
        Self { slots: [NeighborSlot::default(); N] }
    }
}

impl<const N: usize> NeighborTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = &NeighborSlot> {
        self.slots.iter().filter(|s| s.used)
    }

    /// Find the slot index for `id`, scanning only occupied slots.
    pub fn find(&self, id: u16) -> Option<usize> {
        self.slots.iter().position(|s| s.used && s.id == id)
    }

    pub fn get(&self, idx: usize) -> &NeighborSlot {
        &self.slots[idx]
    }

    /// Record a sighting of `id` (from a beacon). If `id` is already
    /// present, `rssi`/`hops_via`/`seen_at` are overwritten in place and
    /// the PRR counters are preserved. If absent, a free slot is used, or
    /// (when the table is full) the slot with the oldest `seen_at` is
    /// evicted, ties broken by the lowest index.
    ///
    /// Returns the index of the slot used.
    pub fn upsert(&mut self, id: u16, rssi: i8, hops_via: u16, now: u32) -> usize {
        if let Some(idx) = self.find(id) {
            let slot = &mut self.slots[idx];
            slot.rssi = rssi;
            slot.hops_via = hops_via;
            slot.seen_at = now;
            return idx;
        }

        if let Some(idx) = self.slots.iter().position(|s| !s.used) {
            self.slots[idx] = NeighborSlot {
                id,
                rssi,
                hops_via,
                tx: 0,
                rx_ack: 0,
                prr: 0.0,
                seen_at: now,
                used: true,
            };
            return idx;
        }

        let evict = self.oldest_index();
        self.slots[evict] = NeighborSlot {
            id,
            rssi,
            hops_via,
            tx: 0,
            rx_ack: 0,
            prr: 0.0,
            seen_at: now,
            used: true,
        };
        evict
    }

    /// Index of the occupied slot with the smallest `seen_at`, ties broken
    /// by lowest index. Panics if the table is empty, which only happens
    /// if `N == 0`.
    fn oldest_index(&self) -> usize {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.used)
            .min_by_key(|(idx, s)| (s.seen_at, *idx))
            .map(|(idx, _)| idx)
            .expect("neighbor table has zero capacity")
    }

    /// Refresh the `seen_at` timestamp of an occupied slot (e.g. after
    /// forwarding data from it, or receiving its ACK).
    pub fn touch(&mut self, idx: usize, now: u32) {
        self.slots[idx].seen_at = now;
        self.slots[idx].used = true;
    }

    /// Remove every slot whose `seen_at` is older than `ttl_ms`.
    ///
    /// Returns `true` if `parent`'s slot (if `Some`) was among those
    /// removed, so the caller can reset its parent pointer and emit the
    /// aging diagnostic.
    pub fn expire(&mut self, now: u32, ttl_ms: u32, parent: Option<u16>) -> bool {
        let mut parent_expired = false;
        for slot in self.slots.iter_mut() {
            if !slot.used {
                continue;
            }
            if now.saturating_sub(slot.seen_at) > ttl_ms {
                if parent == Some(slot.id) {
                    parent_expired = true;
                }
                *slot = NeighborSlot::default();
            }
        }
        parent_expired
    }

    /// Account for a unicast transmission attempt (`got_ack = false`, at
    /// send time) or a received ACK (`got_ack = true`). A no-op if `id` is
    /// not in the table.
    ///
    /// Each transmission attempt is charged exactly once, at send time;
    /// the ACK-receipt call only credits `rx_ack`, so `rx_ack` never
    /// exceeds `tx` and a lost ACK simply leaves `rx_ack` behind `tx`.
    pub fn prr_bump(&mut self, id: u16, got_ack: bool) {
        let idx = match self.find(id) {
            Some(idx) => idx,
            None => return,
        };
        let slot = &mut self.slots[idx];
        if got_ack {
            slot.rx_ack += 1;
        } else {
            slot.tx += 1;
        }
        slot.prr = if slot.tx == 0 { 0.0 } else { slot.rx_ack as f32 / slot.tx as f32 };
    }

    /// Render the fixed-width neighbor dump table for the stats task.
    pub fn fmt_dump(&self) -> String<512> {
        let mut s = String::new();
        let _ = write!(s, "id   hop  rssi  tx   ack  prr%");
        for slot in self.iter() {
            let _ = write!(
                s,
                "\n{:<4} {:<4} {:<5} {:<4} {:<4} {:<4}",
                slot.id,
                slot.hops_via,
                slot.rssi,
                slot.tx,
                slot.rx_ack,
                (slot.prr * 100.0) as u32
            );
        }
        s
    }
}
