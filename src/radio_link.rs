//! Radio send primitives consumed by the routing kernel.
//!
//! The protocol only ever originates sends (broadcast beacons, unicast data
//! and ACKs); incoming frames arrive through callbacks owned by the host's
//! network stack and are handed to [`crate::node::Node`] already decoded
//! (see `node::Node::on_beacon`/`on_data`/`on_ack`), so no receive-side
//! trait is needed here.
//!
//! `Link` is a thin supertrait over [`radio::Transmit`] so that any radio
//! driver implementing the `radio` crate's core traits — including
//! `radio::mock::MockRadio` in tests — can back a channel directly. A
//! send is synchronous with respect to the calling task: `start_transmit`
//! is treated as completing the send rather than polled to completion,
//! since the cooperative scheduler this kernel targets never waits on a
//! half-finished radio operation.
//!
//! None of the three wire frames carry a destination address, so unicast
//! addressing is modeled as a capability of the link rather than a
//! parameter of `radio::Transmit`: `set_destination` binds the recipient
//! immediately before a unicast send. A link backing the broadcast beacon
//! channel can make this a no-op.

/// A radio endpoint capable of originating a send on one logical channel.
pub trait Link<E>: radio::Transmit<Error = E> {
    /// Bind the destination for the next unicast send. A no-op on links
    /// that only ever broadcast.
    fn set_destination(&mut self, dest: u16);
}

/// Broadcast a single frame over a [`Link`], mapping the radio's error
/// into [`crate::error::CoreError`].
pub fn broadcast<L: Link<E>, E>(link: &mut L, payload: &[u8]) -> Result<(), crate::error::CoreError<E>> {
    link.start_transmit(payload).map_err(crate::error::CoreError::Radio)
}

/// Unicast a single frame to `dest` over a [`Link`], mapping the radio's
/// error into [`crate::error::CoreError`].
pub fn unicast<L: Link<E>, E>(
    link: &mut L,
    dest: u16,
    payload: &[u8],
) -> Result<(), crate::error::CoreError<E>> {
    link.set_destination(dest);
    link.start_transmit(payload).map_err(crate::error::CoreError::Radio)
}

#[cfg(any(test, feature = "mocks"))]
impl<'a> Link<<radio::mock::MockRadio<'a> as radio::Transmit>::Error> for radio::mock::MockRadio<'a> {
    fn set_destination(&mut self, _dest: u16) {}
}
