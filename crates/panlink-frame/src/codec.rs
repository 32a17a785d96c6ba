use bytes::{BufMut, Bytes, BytesMut};
use panlink_transport::{PacketKind, RawPacket};

use crate::error::{FrameError, Result};

/// Discriminator header: local pan pair (2) + port (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Local pan bytes: every panlink frame leads with this pair.
pub const LOCAL_PAN: [u8; 2] = [0x7F, 0x69];

/// Port used when the caller does not pick one.
pub const DEFAULT_PORT: u8 = 110;

/// Largest framed packet a single radio transmission carries.
pub const MAX_FRAME: usize = 100;

/// Largest application payload that fits alongside the header.
pub const MAX_PAYLOAD: usize = MAX_FRAME - HEADER_SIZE;

/// The 3-byte discriminator at the front of every framed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    bytes: [u8; HEADER_SIZE],
}

impl FrameHeader {
    /// Header for outbound traffic on `port`.
    pub fn for_port(port: u8) -> Self {
        Self {
            bytes: [LOCAL_PAN[0], LOCAL_PAN[1], port],
        }
    }

    /// Reinterpret 3 received bytes as a header.
    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self { bytes }
    }

    /// The port byte.
    pub fn port(&self) -> u8 {
        self.bytes[2]
    }

    /// True when the pan pair identifies panlink traffic.
    pub fn is_local_pan(&self) -> bool {
        self.bytes[0] == LOCAL_PAN[0] && self.bytes[1] == LOCAL_PAN[1]
    }

    /// True iff the header equals `(LP1, LP2, port)`.
    pub fn matches(&self, port: u8) -> bool {
        self.is_local_pan() && self.port() == port
    }

    /// True iff the header equals the compiled-in default discriminator.
    pub fn matches_default(&self) -> bool {
        self.matches(DEFAULT_PORT)
    }

    /// Raw header bytes in wire order.
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.bytes
    }
}

/// A framed message with port routing.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The logical port this message belongs to.
    pub port: u8,
    /// The application payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(port: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            port,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a framed payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────┬────────────────────┐
/// │ LP1 LP2    │ Port     │ Payload            │
/// │ 0x7F 0x69  │ (1B)     │ (0..=97 bytes)     │
/// └────────────┴──────────┴────────────────────┘
/// ```
///
/// The source payload is only read; it stays usable for a subsequent call
/// with a different port.
pub fn encode_frame(port: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&LOCAL_PAN);
    dst.put_u8(port);
    dst.put_slice(payload);
    Ok(())
}

/// Encode into a fresh buffer.
pub fn wrap(payload: &[u8], port: u8) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(port, payload, &mut buf)?;
    Ok(buf.freeze())
}

/// Strip the discriminator header off a framed payload.
///
/// The length guard runs before the subtraction so a short frame reports
/// [`FrameError::Underflow`] instead of wrapping into a huge length.
pub fn strip_header(framed: &Bytes) -> Result<Bytes> {
    if framed.len() < HEADER_SIZE {
        return Err(FrameError::Underflow { len: framed.len() });
    }
    Ok(framed.slice(HEADER_SIZE..))
}

/// Typed decode of a received radio packet.
#[derive(Debug, Clone)]
pub enum Decoded {
    /// Framed length shorter than the discriminator header.
    Malformed { len: usize },
    /// Not a 16-bit-addressed data frame; header bytes were never looked at.
    NotAddressedKind { kind: PacketKind },
    /// A framed packet with its header split off.
    Addressed {
        header: FrameHeader,
        payload: Bytes,
        rssi: u8,
        source: u16,
    },
}

/// Decode a received packet into a tagged result.
///
/// Kind is checked first: only 16-bit-addressed data frames carry a
/// discriminator, so everything else is classified without touching the
/// payload. Whether the header belongs to a given port is the caller's
/// question, answered by [`FrameHeader::matches`].
pub fn decode_frame(packet: &RawPacket) -> Decoded {
    if !packet.kind.is_data16() {
        return Decoded::NotAddressedKind { kind: packet.kind };
    }

    let payload = match strip_header(&packet.payload) {
        Ok(payload) => payload,
        Err(_) => {
            return Decoded::Malformed {
                len: packet.payload.len(),
            }
        }
    };

    let header = FrameHeader::from_bytes([
        packet.payload[0],
        packet.payload[1],
        packet.payload[2],
    ]);

    Decoded::Addressed {
        header,
        payload,
        rssi: packet.rssi,
        source: packet.source,
    }
}
