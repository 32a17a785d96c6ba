use std::time::Duration;

/// Broadcast destination address.
pub const BROADCAST: u16 = 0xFFFF;

/// Low-address word assumed when the serial query fails.
///
/// Wire order; yields local address 0x0B00 after the derivation swap.
pub const FALLBACK_ADDRESS_WORD: [u8; 2] = [0x00, 0x0B];

/// Deployment parameters applied during [`initialize`] and used by every
/// subsequent send.
///
/// The defaults are the fixed wire-level constants the network is deployed
/// with; all nodes on one logical network must agree on channel and pan id.
///
/// [`initialize`]: crate::RadioSession::initialize
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 802.15.4 channel id written to the `CH` register.
    pub channel: u8,
    /// Network (pan) id written to the `ID` register.
    pub pan_id: u8,
    /// Addressing/API mode written to the `AP` register.
    pub api_mode: u8,
    /// Multicast/MAC mode written to the `MM` register.
    pub mac_mode: u8,
    /// Destination address used by sends without an explicit destination.
    pub destination: u16,
    /// Per-step bound on blocking configuration exchanges.
    pub config_timeout: Duration,
    /// Quiescent pause after every transmit.
    ///
    /// A hardware turnaround contract: the radio drops the next command
    /// when poked too soon after a transmit. Not a logical necessity.
    pub post_send_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            channel: 0x0C,
            pan_id: 0x01,
            api_mode: 0x02,
            mac_mode: 0x02,
            destination: BROADCAST,
            config_timeout: Duration::from_secs(5),
            post_send_delay: Duration::from_millis(10),
        }
    }
}
