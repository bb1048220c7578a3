//! Error taxonomy for the convergecast kernel.
//!
//! Per the protocol's error-handling design, almost nothing here is fatal:
//! a missing parent, a lost ACK, an unknown sender, or a full neighbor
//! table are all handled inline and never surface as an `Err`. `CoreError`
//! exists for the one genuine failure source left: the underlying radio.

use crate::packet::DecodeError;

/// Errors that can occur while driving a [`crate::node::Node`].
///
/// Generic over `E`, the error type of the underlying radio link.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError<E> {
    /// The underlying radio link returned an error on send or receive.
    ///
    /// Send failures are charged against the neighbor's `tx` counter the
    /// same as a successful send (see [`crate::neighbor::NeighborTable::prr_bump`]);
    /// a lost ACK and a send failure are statistically indistinguishable by
    /// design, so callers should log and continue rather than treat this as
    /// fatal.
    Radio(E),

    /// A received frame could not be decoded.
    Decode(DecodeError),

    /// A payload exceeded the fixed buffer supplied to `encode`.
    PayloadTooLarge,
}

impl<E> From<DecodeError> for CoreError<E> {
    fn from(e: DecodeError) -> Self {
        CoreError::Decode(e)
    }
}

