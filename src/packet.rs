//! Wire formats for the three frame kinds exchanged by the protocol.
//!
//! All integers are little-endian, packed, with no padding, per the
//! protocol's external interface definition. Channel separation (beacon
//! vs. data vs. ACK) is what distinguishes a frame's type on the wire;
//! there is no embedded type tag.

use byteorder::{ByteOrder, LittleEndian};

/// A frame failed to decode because the buffer was too short for its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    pub need: usize,
    pub got: usize,
}

/// Beacon advertisement broadcast by the sink and rebroadcast by forwarders.
///
/// 6 bytes on the wire: `adv_parent`, `adv_hops`, `adv_seq`, each `u16` LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beacon {
    /// Identifier of the node advertising this beacon (the sink on the
    /// first hop, or the forwarder that rebroadcast it).
    pub adv_parent: u16,
    /// Hop distance from the advertiser to the sink.
    pub adv_hops: u16,
    /// Sink-originated sequence number, used by the controlled flood filter.
    pub adv_seq: u16,
}

impl Beacon {
    pub const WIRE_LEN: usize = 6;

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(DecodeError { need: Self::WIRE_LEN, got: buf.len() });
        }
        LittleEndian::write_u16(&mut buf[0..2], self.adv_parent);
        LittleEndian::write_u16(&mut buf[2..4], self.adv_hops);
        LittleEndian::write_u16(&mut buf[4..6], self.adv_seq);
        Ok(Self::WIRE_LEN)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(DecodeError { need: Self::WIRE_LEN, got: buf.len() });
        }
        Ok(Self {
            adv_parent: LittleEndian::read_u16(&buf[0..2]),
            adv_hops: LittleEndian::read_u16(&buf[2..4]),
            adv_seq: LittleEndian::read_u16(&buf[4..6]),
        })
    }
}

/// Unicast data frame carrying one sensor sample, hop by hop toward the sink.
///
/// 8 bytes on the wire: `src`, `hops`, `temp_raw`, `data_id`, each `u16` LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Data {
    /// Identifier of the node that originally sampled this reading.
    pub src: u16,
    /// Number of wireless hops traversed so far (starts at 1 at the source).
    pub hops: u16,
    /// Raw 16-bit sensor code.
    pub temp_raw: u16,
    /// Monotone per-source sequence number.
    pub data_id: u16,
}

impl Data {
    pub const WIRE_LEN: usize = 8;

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(DecodeError { need: Self::WIRE_LEN, got: buf.len() });
        }
        LittleEndian::write_u16(&mut buf[0..2], self.src);
        LittleEndian::write_u16(&mut buf[2..4], self.hops);
        LittleEndian::write_u16(&mut buf[4..6], self.temp_raw);
        LittleEndian::write_u16(&mut buf[6..8], self.data_id);
        Ok(Self::WIRE_LEN)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(DecodeError { need: Self::WIRE_LEN, got: buf.len() });
        }
        Ok(Self {
            src: LittleEndian::read_u16(&buf[0..2]),
            hops: LittleEndian::read_u16(&buf[2..4]),
            temp_raw: LittleEndian::read_u16(&buf[4..6]),
            data_id: LittleEndian::read_u16(&buf[6..8]),
        })
    }
}

/// Acknowledgement for a single data frame, unicast back to the sender.
///
/// 5 bytes on the wire: `ack_from` (u16 LE), `data_id` (u16 LE), `ok` (u8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Identifier of the node sending the ACK.
    pub ack_from: u16,
    /// `data_id` of the frame being acknowledged (informational only).
    pub data_id: u16,
    /// Always 1; not otherwise interpreted by this layer.
    pub ok: u8,
}

impl Ack {
    pub const WIRE_LEN: usize = 5;

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, DecodeError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(DecodeError { need: Self::WIRE_LEN, got: buf.len() });
        }
        LittleEndian::write_u16(&mut buf[0..2], self.ack_from);
        LittleEndian::write_u16(&mut buf[2..4], self.data_id);
        buf[4] = self.ok;
        Ok(Self::WIRE_LEN)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < Self::WIRE_LEN {
            return Err(DecodeError { need: Self::WIRE_LEN, got: buf.len() });
        }
        Ok(Self {
            ack_from: LittleEndian::read_u16(&buf[0..2]),
            data_id: LittleEndian::read_u16(&buf[2..4]),
            ok: buf[4],
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn beacon_roundtrip() {
        let b = Beacon { adv_parent: 7, adv_hops: 3, adv_seq: 1002 };
        let mut buf = [0u8; Beacon::WIRE_LEN];
        let n = b.encode(&mut buf).unwrap();
        assert_eq!(n, Beacon::WIRE_LEN);
        assert_eq!(Beacon::decode(&buf).unwrap(), b);
    }

    #[test]
    fn data_roundtrip() {
        let d = Data { src: 3, hops: 2, temp_raw: 6000, data_id: 42 };
        let mut buf = [0u8; Data::WIRE_LEN];
        d.encode(&mut buf).unwrap();
        assert_eq!(Data::decode(&buf).unwrap(), d);
    }

    #[test]
    fn ack_roundtrip() {
        let a = Ack { ack_from: 2, data_id: 42, ok: 1 };
        let mut buf = [0u8; Ack::WIRE_LEN];
        a.encode(&mut buf).unwrap();
        assert_eq!(Ack::decode(&buf).unwrap(), a);
    }

    #[test]
    fn decode_short_buffer_errors() {
        let buf = [0u8; 2];
        assert!(Beacon::decode(&buf).is_err());
        assert!(Data::decode(&buf).is_err());
        assert!(Ack::decode(&buf).is_err());
    }
}
