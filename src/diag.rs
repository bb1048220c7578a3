//! Diagnostic events and the human-readable lines specified for the
//! serial console.
//!
//! Every event that §6 of the protocol specification says must produce a
//! diagnostic line is also logged through the `log` facade at the point it
//! occurs (see `beacon.rs`, `data.rs`, `neighbor.rs`). `RoutingEvent` is
//! additive instrumentation: a machine-readable record of the same
//! transition, returned from the calls that can produce one so tests and
//! richer host supervisors don't need to scrape log text.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::HOPS_MAX;

/// A state transition worth surfacing to a caller beyond the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingEvent {
    /// The parent pointer changed from whatever it was to `new_parent`.
    ParentChanged { new_parent: u16 },
    /// The current parent aged out of the neighbor table and was cleared.
    ParentAged { expired_parent: u16 },
}

/// Formats the `[route] parent=<id> (hop=<h> rssi=<r> prr=<p>%)` line.
pub fn format_parent_change(id: u16, hops_via: u16, rssi: i8, prr: f32) -> String<64> {
    let mut s = String::new();
    let _ = write!(
        s,
        "[route] parent={} (hop={} rssi={} prr={}%)",
        id,
        hops_via,
        rssi,
        (prr * 100.0) as u32
    );
    s
}

/// Formats the `[aging] parent <id> expired; reset` line.
pub fn format_parent_aged(id: u16) -> String<48> {
    let mut s = String::new();
    let _ = write!(s, "[aging] parent {} expired; reset", id);
    s
}

/// Formats the `[sink] recv src=<id> hops=<n> temp=<d.d>` line.
pub fn format_sink_recv(src: u16, hops: u16, temp_whole: i32, temp_frac: i32) -> String<48> {
    let mut s = String::new();
    let _ = write!(s, "[sink] recv src={} hops={} temp={}.{}", src, hops, temp_whole, temp_frac);
    s
}

/// Formats the `[hops] <c0> <c1> ... <c19>` histogram line.
pub struct HopHistLine<'a>(pub &'a [u32; HOPS_MAX]);

impl<'a> fmt::Display for HopHistLine<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[hops]")?;
        for count in self.0.iter() {
            write!(f, " {}", count)?;
        }
        Ok(())
    }
}
