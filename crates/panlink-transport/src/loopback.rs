use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::packet::{ConfigResult, PacketKind, RawPacket};
use crate::traits::RadioTransport;

/// In-memory radio endpoint pair.
///
/// Two [`Loopback`] endpoints form a point-to-point link: whatever one
/// side transmits arrives at the other, stamped as a 16-bit-addressed data
/// packet with a synthetic RSSI. Configuration exchanges are answered like
/// a stub modem: register writes are stored, reads echo the stored value,
/// and `SL` returns the endpoint's factory serial word.
///
/// Exists so the layers above are exercisable end-to-end without hardware.
pub struct Loopback {
    serial: [u8; 4],
    registers: HashMap<[u8; 2], Bytes>,
    tx: Sender<RawPacket>,
    rx: Receiver<RawPacket>,
    rssi: u8,
}

impl Loopback {
    /// RSSI stamped on delivered packets unless overridden.
    pub const DEFAULT_RSSI: u8 = 0x28;

    /// Source address reported before a `MY` register write is applied.
    pub const UNCONFIGURED_SOURCE: u16 = 0xFFFE;

    /// Create a connected endpoint pair with default factory serials.
    pub fn pair() -> (Self, Self) {
        Self::pair_with_serials([0x13, 0xA2, 0x00, 0x01], [0x13, 0xA2, 0x00, 0x02])
    }

    /// Create a connected endpoint pair with explicit 4-byte serial words.
    pub fn pair_with_serials(left: [u8; 4], right: [u8; 4]) -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();
        (
            Self::new(left, tx_a, rx_a),
            Self::new(right, tx_b, rx_b),
        )
    }

    fn new(serial: [u8; 4], tx: Sender<RawPacket>, rx: Receiver<RawPacket>) -> Self {
        Self {
            serial,
            registers: HashMap::new(),
            tx,
            rx,
            rssi: Self::DEFAULT_RSSI,
        }
    }

    /// Override the RSSI stamped on subsequently transmitted packets.
    pub fn set_rssi(&mut self, rssi: u8) {
        self.rssi = rssi;
    }

    /// Value last written to a configuration register, if any.
    pub fn applied(&self, command: [u8; 2]) -> Option<&[u8]> {
        self.registers.get(&command).map(|value| value.as_ref())
    }

    /// Deliver a pre-built packet to the peer endpoint.
    ///
    /// Lets tests and simulations put non-data kinds or hand-crafted
    /// frames on the link.
    pub fn send_packet(&mut self, packet: RawPacket) -> Result<()> {
        self.tx.send(packet).map_err(|_| TransportError::Closed)
    }

    /// The 16-bit source address the peer will observe on our packets:
    /// the applied `MY` register in wire order, or the unconfigured value.
    fn source_address(&self) -> u16 {
        match self.registers.get(b"MY").map(|value| value.as_ref()) {
            Some([high, low, ..]) => u16::from_be_bytes([*high, *low]),
            _ => Self::UNCONFIGURED_SOURCE,
        }
    }
}

impl RadioTransport for Loopback {
    fn send_raw(&mut self, destination: u16, payload: &[u8]) -> Result<()> {
        let packet = RawPacket {
            kind: PacketKind::Data16,
            source: self.source_address(),
            rssi: self.rssi,
            payload: Bytes::copy_from_slice(payload),
        };
        debug!(destination, len = payload.len(), "loopback transmit");
        self.tx.send(packet).map_err(|_| TransportError::Closed)
    }

    fn receive_raw(&mut self, timeout: Duration) -> Result<Option<RawPacket>> {
        match self.rx.recv_timeout(timeout) {
            Ok(packet) => Ok(Some(packet)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn config_write(
        &mut self,
        command: [u8; 2],
        value: &[u8],
        _timeout: Duration,
    ) -> Result<ConfigResult> {
        let echoed = if command == *b"SL" {
            Bytes::copy_from_slice(&self.serial)
        } else if value.is_empty() {
            self.registers.get(&command).cloned().unwrap_or_default()
        } else {
            let stored = Bytes::copy_from_slice(value);
            self.registers.insert(command, stored.clone());
            stored
        };

        debug!(
            command = %String::from_utf8_lossy(&command),
            len = value.len(),
            "loopback config exchange"
        );

        Ok(ConfigResult {
            ok: true,
            value: echoed,
        })
    }
}

impl std::fmt::Debug for Loopback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loopback")
            .field("serial", &self.serial)
            .field("registers", &self.registers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[test]
    fn pair_roundtrip() {
        let (mut left, mut right) = Loopback::pair();

        left.send_raw(0xFFFF, b"hello").unwrap();
        let packet = right.receive_raw(SHORT).unwrap().unwrap();

        assert_eq!(packet.kind, PacketKind::Data16);
        assert_eq!(packet.payload.as_ref(), b"hello");
        assert_eq!(packet.rssi, Loopback::DEFAULT_RSSI);
        assert_eq!(packet.source, Loopback::UNCONFIGURED_SOURCE);
    }

    #[test]
    fn receive_times_out_empty() {
        let (_left, mut right) = Loopback::pair();
        let got = right.receive_raw(Duration::from_millis(10)).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn send_after_peer_drop_is_closed() {
        let (mut left, right) = Loopback::pair();
        drop(right);

        let err = left.send_raw(0x0001, b"x").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn receive_after_peer_drop_is_closed() {
        let (left, mut right) = Loopback::pair();
        drop(left);

        let err = right.receive_raw(SHORT).unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[test]
    fn sl_read_returns_serial() {
        let (mut left, _right) =
            Loopback::pair_with_serials([0xAA, 0xBB, 0xCC, 0xDD], [0x13, 0xA2, 0x00, 0x02]);

        let result = left.config_write(*b"SL", &[], SHORT).unwrap();
        assert!(result.ok);
        assert_eq!(result.value.as_ref(), &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn register_write_then_read() {
        let (mut left, _right) = Loopback::pair();

        let written = left.config_write(*b"CH", &[0x0C], SHORT).unwrap();
        assert!(written.ok);
        assert_eq!(left.applied(*b"CH"), Some(&[0x0C][..]));

        let read = left.config_write(*b"CH", &[], SHORT).unwrap();
        assert_eq!(read.value.as_ref(), &[0x0C]);
    }

    #[test]
    fn source_address_follows_my_register() {
        let (mut left, mut right) = Loopback::pair();
        left.config_write(*b"MY", &[0x12, 0x34], SHORT).unwrap();

        left.send_raw(0xFFFF, b"tagged").unwrap();
        let packet = right.receive_raw(SHORT).unwrap().unwrap();
        assert_eq!(packet.source, 0x1234);
    }

    #[test]
    fn send_packet_delivers_other_kinds() {
        let (mut left, mut right) = Loopback::pair();
        left.send_packet(RawPacket {
            kind: PacketKind::ModemStatus,
            source: 0,
            rssi: 0,
            payload: Bytes::from_static(&[0x00]),
        })
        .unwrap();

        let packet = right.receive_raw(SHORT).unwrap().unwrap();
        assert_eq!(packet.kind, PacketKind::ModemStatus);
    }

    #[test]
    fn rssi_override_applies() {
        let (mut left, mut right) = Loopback::pair();
        left.set_rssi(0x50);

        left.send_raw(0xFFFF, b"weak").unwrap();
        let packet = right.receive_raw(SHORT).unwrap().unwrap();
        assert_eq!(packet.rssi, 0x50);
    }
}
