use std::time::Duration;

use crate::error::Result;
use crate::packet::{ConfigResult, RawPacket};

/// A connected radio link.
///
/// All operations block the calling thread for at most their stated
/// timeout; the model is single-threaded and cooperative. Implementations
/// are the hardware serial drivers (out of tree) and [`crate::Loopback`].
pub trait RadioTransport {
    /// Transmit one raw packet to a 16-bit destination address.
    ///
    /// The payload is sent as-is; framing is the caller's concern.
    fn send_raw(&mut self, destination: u16, payload: &[u8]) -> Result<()>;

    /// Wait up to `timeout` for the next packet.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. Packets of every
    /// API kind are surfaced; filtering belongs to the layer above.
    fn receive_raw(&mut self, timeout: Duration) -> Result<Option<RawPacket>>;

    /// Execute one blocking configuration exchange.
    ///
    /// `command` is the 2-byte ASCII register name; an empty `value` reads
    /// the register, a non-empty one writes it. Blocks up to `timeout` for
    /// the acknowledging response.
    fn config_write(
        &mut self,
        command: [u8; 2],
        value: &[u8],
        timeout: Duration,
    ) -> Result<ConfigResult>;
}
