use bytes::Bytes;

/// Radio API frame identifiers.
///
/// The framing layer only ever accepts [`PacketKind::Data16`]; the other
/// variants exist so received traffic can be classified and discarded with
/// a reason instead of being misparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// 16-bit-addressed data frame.
    Data16,
    /// 64-bit-addressed data frame.
    Data64,
    /// Response to an AT-register configuration command.
    AtResponse,
    /// Transmit status report.
    TxStatus,
    /// Modem status report.
    ModemStatus,
    /// Any other API identifier the radio may emit.
    Unknown(u8),
}

impl PacketKind {
    /// Classify a raw API identifier byte.
    pub fn from_u8(id: u8) -> Self {
        match id {
            0x81 => PacketKind::Data16,
            0x80 => PacketKind::Data64,
            0x88 => PacketKind::AtResponse,
            0x89 => PacketKind::TxStatus,
            0x8A => PacketKind::ModemStatus,
            other => PacketKind::Unknown(other),
        }
    }

    /// The wire API identifier byte.
    pub fn as_u8(self) -> u8 {
        match self {
            PacketKind::Data16 => 0x81,
            PacketKind::Data64 => 0x80,
            PacketKind::AtResponse => 0x88,
            PacketKind::TxStatus => 0x89,
            PacketKind::ModemStatus => 0x8A,
            PacketKind::Unknown(id) => id,
        }
    }

    /// True for the 16-bit-addressed data kind the framing layer accepts.
    pub fn is_data16(self) -> bool {
        matches!(self, PacketKind::Data16)
    }
}

/// One packet received from the radio.
///
/// `rssi` is signal-strength metadata the radio reports at a fixed offset
/// of its own frame; it is independent of anything inside `payload`.
#[derive(Debug, Clone)]
pub struct RawPacket {
    /// API kind tag of the frame.
    pub kind: PacketKind,
    /// 16-bit network address of the sender.
    pub source: u16,
    /// Received signal strength indicator.
    pub rssi: u8,
    /// Frame payload, including any framing header embedded by the sender.
    pub payload: Bytes,
}

impl RawPacket {
    /// Length of the payload in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Status and echoed value of one configuration exchange.
#[derive(Debug, Clone)]
pub struct ConfigResult {
    /// Whether the radio acknowledged the command with OK status.
    pub ok: bool,
    /// Value echoed back by the radio (register contents for reads).
    pub value: Bytes,
}
