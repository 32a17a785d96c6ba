use std::time::Duration;

use bytes::Bytes;
use panlink_frame::{decode_frame, wrap, Decoded, DEFAULT_PORT};
use panlink_transport::{RadioTransport, TransportError};
use tracing::{debug, info, warn};

use crate::config::{SessionConfig, FALLBACK_ADDRESS_WORD};
use crate::delay::{Delay, StdDelay};
use crate::error::{Result, SessionError};

/// Overall session health after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Every configuration step was applied.
    Ready,
    /// At least one configuration step failed; the device may be running
    /// on a partial configuration.
    Degraded,
}

/// One parameter applied during session initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStep {
    /// Read of the factory serial-low word.
    SerialLow,
    /// 16-bit network address (`MY`).
    NetworkAddress,
    /// Channel id (`CH`).
    Channel,
    /// Network/pan id (`ID`).
    PanId,
    /// Addressing/API mode (`AP`).
    ApiMode,
    /// Multicast/MAC mode (`MM`).
    MacMode,
}

impl ConfigStep {
    /// The 2-byte ASCII register name this step exchanges.
    pub fn command(self) -> [u8; 2] {
        match self {
            ConfigStep::SerialLow => *b"SL",
            ConfigStep::NetworkAddress => *b"MY",
            ConfigStep::Channel => *b"CH",
            ConfigStep::PanId => *b"ID",
            ConfigStep::ApiMode => *b"AP",
            ConfigStep::MacMode => *b"MM",
        }
    }
}

/// How one configuration step ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The radio acknowledged the exchange with OK status.
    Applied,
    /// No response within the configuration timeout.
    TimedOut,
    /// The radio answered with a failure status or an unusable value.
    Rejected,
}

/// Per-step record of one initialization run.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: ConfigStep,
    pub status: StepStatus,
}

impl StepOutcome {
    /// True when the step was applied.
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Applied
    }
}

/// Structured result of [`RadioSession::initialize`].
///
/// The sequence deliberately continues past failed steps, so the report
/// carries every step's outcome rather than just the first failure.
#[derive(Debug, Clone)]
pub struct InitReport {
    /// Address derived from the serial-low word (fallback word if the
    /// query failed).
    pub local_address: u16,
    /// One outcome per configuration step, in execution order.
    pub steps: Vec<StepOutcome>,
}

impl InitReport {
    /// Fold the per-step outcomes into the overall session state.
    pub fn state(&self) -> SessionState {
        if self.steps.iter().all(StepOutcome::succeeded) {
            SessionState::Ready
        } else {
            SessionState::Degraded
        }
    }

    /// The steps that were not applied.
    pub fn failed_steps(&self) -> Vec<&StepOutcome> {
        self.steps
            .iter()
            .filter(|outcome| !outcome.succeeded())
            .collect()
    }
}

/// Outcome of one receive attempt.
///
/// Everything except `Payload` is a routine "not for me" condition on a
/// shared medium, not an error.
#[derive(Debug, Clone)]
pub enum Received {
    /// A valid frame for the requested port.
    Payload {
        payload: Bytes,
        rssi: u8,
        source: u16,
    },
    /// Nothing arrived within the timeout (or the frame was truncated).
    NoPacket,
    /// A packet of some other API kind.
    WrongKind,
    /// A framed packet for a different pan or port.
    PortMismatch,
}

impl Received {
    /// True when a payload was delivered.
    pub fn is_payload(&self) -> bool {
        matches!(self, Received::Payload { .. })
    }
}

/// A radio session: owns the transport, performs one-time network
/// configuration, and provides the framed send/receive API.
///
/// Single-threaded, cooperative, blocking. The transport is exclusively
/// owned for the session's lifetime.
pub struct RadioSession<T, D = StdDelay> {
    pub(crate) transport: T,
    delay: D,
    config: SessionConfig,
    local_address: Option<u16>,
}

impl<T: RadioTransport> RadioSession<T> {
    /// Create a session with deployment-default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        Self::with_delay(transport, config, StdDelay)
    }
}

impl<T: RadioTransport, D: Delay> RadioSession<T, D> {
    /// Create a session with an explicit post-send delay implementation.
    pub fn with_delay(transport: T, config: SessionConfig, delay: D) -> Self {
        Self {
            transport,
            delay,
            config,
            local_address: None,
        }
    }

    /// Configure the radio for this network.
    ///
    /// Queries the factory serial-low word, derives the local 16-bit
    /// address from it, then applies the fixed parameter sequence
    /// (`MY`, `CH`, `ID`, `AP`, `MM`). Each exchange blocks up to
    /// [`SessionConfig::config_timeout`]; a timed-out or rejected step is
    /// recorded and the sequence continues, so a partially configured
    /// device still gets every remaining parameter. Hard transport
    /// failures (link gone) abort instead.
    ///
    /// May be called again to retry a degraded configuration.
    pub fn initialize(&mut self) -> Result<InitReport> {
        let mut steps = Vec::with_capacity(6);

        let mut word = FALLBACK_ADDRESS_WORD;
        let status = match self
            .transport
            .config_write(ConfigStep::SerialLow.command(), &[], self.config.config_timeout)
        {
            Ok(result) if result.ok && result.value.len() >= 4 => {
                // The serial-low register echoes 4 bytes; the low word is
                // the trailing pair, in wire order.
                word = [result.value[2], result.value[3]];
                StepStatus::Applied
            }
            Ok(_) => StepStatus::Rejected,
            Err(TransportError::Timeout(_)) => StepStatus::TimedOut,
            Err(TransportError::Nack { .. }) => StepStatus::Rejected,
            Err(err) => return Err(err.into()),
        };
        steps.push(StepOutcome {
            step: ConfigStep::SerialLow,
            status,
        });

        // Swapped relative to wire order: the first wire byte lands in the
        // low byte of the address. Matches how the device reports the
        // value; interoperability depends on keeping it.
        let local_address = u16::from_le_bytes(word);
        self.local_address = Some(local_address);

        let writes: [(ConfigStep, Vec<u8>); 5] = [
            (ConfigStep::NetworkAddress, word.to_vec()),
            (ConfigStep::Channel, vec![self.config.channel]),
            (ConfigStep::PanId, vec![self.config.pan_id]),
            (ConfigStep::ApiMode, vec![self.config.api_mode]),
            (ConfigStep::MacMode, vec![self.config.mac_mode]),
        ];

        for (step, value) in writes {
            let status = self.exchange(step, &value)?;
            if status != StepStatus::Applied {
                warn!(?step, ?status, "configuration step failed; continuing");
            }
            steps.push(StepOutcome { step, status });
        }

        let report = InitReport {
            local_address,
            steps,
        };
        info!(local_address, state = ?report.state(), "session initialized");
        Ok(report)
    }

    /// Send on the default port to the configured destination.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.send_on(DEFAULT_PORT, payload)
    }

    /// Send on an explicit port to the configured destination.
    pub fn send_on(&mut self, port: u8, payload: &[u8]) -> Result<()> {
        self.send_to(self.config.destination, port, payload)
    }

    /// Send on an explicit port to an explicit destination.
    ///
    /// The payload is framed into a fresh buffer; the caller's slice is
    /// never touched and stays usable for further sends.
    pub fn send_to(&mut self, destination: u16, port: u8, payload: &[u8]) -> Result<()> {
        let framed = wrap(payload, port)?;
        self.transport.send_raw(destination, &framed)?;
        debug!(destination, port, len = payload.len(), "frame sent");
        // Turnaround contract: the radio drops the next command when
        // poked too soon after a transmit.
        self.delay.sleep(self.config.post_send_delay);
        Ok(())
    }

    /// Receive on the default port.
    pub fn receive(&mut self, timeout: Duration) -> Result<Received> {
        self.receive_on(DEFAULT_PORT, timeout)
    }

    /// Wait up to `timeout` for a frame addressed to `port`.
    ///
    /// Traffic that is not for this port (other kinds, other pans, other
    /// ports, truncated frames) is discarded silently and surfaced only
    /// as the corresponding non-payload outcome.
    pub fn receive_on(&mut self, port: u8, timeout: Duration) -> Result<Received> {
        let packet = match self.transport.receive_raw(timeout) {
            Ok(Some(packet)) => packet,
            Ok(None) => return Ok(Received::NoPacket),
            Err(TransportError::Timeout(_)) => return Ok(Received::NoPacket),
            Err(err) => return Err(err.into()),
        };

        Ok(match decode_frame(&packet) {
            Decoded::Malformed { len } => {
                debug!(len, "discarding truncated frame");
                Received::NoPacket
            }
            Decoded::NotAddressedKind { kind } => {
                debug!(?kind, "discarding non-data packet");
                Received::WrongKind
            }
            Decoded::Addressed {
                header,
                payload,
                rssi,
                source,
            } => {
                if header.matches(port) {
                    Received::Payload {
                        payload,
                        rssi,
                        source,
                    }
                } else {
                    debug!(
                        got = header.port(),
                        expected = port,
                        "discarding frame for another port"
                    );
                    Received::PortMismatch
                }
            }
        })
    }

    /// The 16-bit network address derived during initialization.
    ///
    /// `None` until [`initialize`](Self::initialize) has run; stable
    /// afterwards regardless of later step outcomes.
    pub fn local_address(&self) -> Option<u16> {
        self.local_address
    }

    /// The channel the session believes is applied.
    pub fn channel(&self) -> u8 {
        self.config.channel
    }

    /// The pan id the session believes is applied.
    pub fn pan_id(&self) -> u8 {
        self.config.pan_id
    }

    /// Move the device to another channel at runtime.
    ///
    /// The cached value only changes once the radio acknowledges the
    /// write.
    pub fn set_channel(&mut self, channel: u8) -> Result<()> {
        match self.exchange(ConfigStep::Channel, &[channel])? {
            StepStatus::Applied => {
                self.config.channel = channel;
                Ok(())
            }
            status => Err(SessionError::StepFailed {
                step: ConfigStep::Channel,
                status,
            }),
        }
    }

    /// Move the device to another pan id at runtime.
    pub fn set_pan_id(&mut self, pan_id: u8) -> Result<()> {
        match self.exchange(ConfigStep::PanId, &[pan_id])? {
            StepStatus::Applied => {
                self.config.pan_id = pan_id;
                Ok(())
            }
            status => Err(SessionError::StepFailed {
                step: ConfigStep::PanId,
                status,
            }),
        }
    }

    /// The active session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Consume the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// One blocking configuration exchange, folded to a step status.
    /// Timeouts and nacks become statuses; hard failures stay errors.
    fn exchange(&mut self, step: ConfigStep, value: &[u8]) -> Result<StepStatus> {
        match self
            .transport
            .config_write(step.command(), value, self.config.config_timeout)
        {
            Ok(result) if result.ok => Ok(StepStatus::Applied),
            Ok(_) => Ok(StepStatus::Rejected),
            Err(TransportError::Timeout(_)) => Ok(StepStatus::TimedOut),
            Err(TransportError::Nack { .. }) => Ok(StepStatus::Rejected),
            Err(err) => Err(err.into()),
        }
    }
}

impl<T, D> std::fmt::Debug for RadioSession<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioSession")
            .field("local_address", &self.local_address)
            .field("channel", &self.config.channel)
            .field("pan_id", &self.config.pan_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use panlink_transport::{ConfigResult, PacketKind, RawPacket};

    use super::*;

    const SHORT: Duration = Duration::from_millis(20);

    /// Scripted transport double: records raw sends and config writes,
    /// answers config exchanges from a table, and replays queued packets.
    struct FakeRadio {
        serial: [u8; 4],
        sent: Vec<(u16, Vec<u8>)>,
        config_writes: Vec<([u8; 2], Vec<u8>)>,
        inbound: VecDeque<RawPacket>,
        fail_command: Option<([u8; 2], FailMode)>,
    }

    #[derive(Clone, Copy)]
    enum FailMode {
        Timeout,
        Reject,
    }

    impl FakeRadio {
        fn new() -> Self {
            Self {
                serial: [0x00, 0x13, 0xCC, 0xDD],
                sent: Vec::new(),
                config_writes: Vec::new(),
                inbound: VecDeque::new(),
                fail_command: None,
            }
        }

        fn failing(command: [u8; 2], mode: FailMode) -> Self {
            let mut radio = Self::new();
            radio.fail_command = Some((command, mode));
            radio
        }

        fn queue(&mut self, packet: RawPacket) {
            self.inbound.push_back(packet);
        }
    }

    impl RadioTransport for FakeRadio {
        fn send_raw(&mut self, destination: u16, payload: &[u8]) -> panlink_transport::Result<()> {
            self.sent.push((destination, payload.to_vec()));
            Ok(())
        }

        fn receive_raw(
            &mut self,
            timeout: Duration,
        ) -> panlink_transport::Result<Option<RawPacket>> {
            let _ = timeout;
            Ok(self.inbound.pop_front())
        }

        fn config_write(
            &mut self,
            command: [u8; 2],
            value: &[u8],
            timeout: Duration,
        ) -> panlink_transport::Result<ConfigResult> {
            self.config_writes.push((command, value.to_vec()));
            if let Some((fail, mode)) = self.fail_command {
                if fail == command {
                    return match mode {
                        FailMode::Timeout => Err(TransportError::Timeout(timeout)),
                        FailMode::Reject => Ok(ConfigResult {
                            ok: false,
                            value: Bytes::new(),
                        }),
                    };
                }
            }
            let value = if command == *b"SL" {
                Bytes::copy_from_slice(&self.serial)
            } else {
                Bytes::copy_from_slice(value)
            };
            Ok(ConfigResult { ok: true, value })
        }
    }

    /// Delay double that records calls instead of sleeping.
    #[derive(Clone, Default)]
    struct RecordingDelay {
        calls: Arc<Mutex<Vec<Duration>>>,
    }

    impl Delay for RecordingDelay {
        fn sleep(&mut self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    fn harness(radio: FakeRadio) -> (RadioSession<FakeRadio, RecordingDelay>, RecordingDelay) {
        let delay = RecordingDelay::default();
        (
            RadioSession::with_delay(radio, SessionConfig::default(), delay.clone()),
            delay,
        )
    }

    fn data16(payload: &[u8]) -> RawPacket {
        RawPacket {
            kind: PacketKind::Data16,
            source: 0x0001,
            rssi: 0x33,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    #[test]
    fn initialize_applies_fixed_sequence() {
        let (mut session, _delay) = harness(FakeRadio::new());
        let report = session.initialize().unwrap();

        assert_eq!(report.state(), SessionState::Ready);
        assert!(report.failed_steps().is_empty());

        let writes = &session.transport.config_writes;
        let commands: Vec<[u8; 2]> = writes.iter().map(|(command, _)| *command).collect();
        assert_eq!(
            commands,
            vec![*b"SL", *b"MY", *b"CH", *b"ID", *b"AP", *b"MM"]
        );

        // MY gets the low word of the serial in wire order.
        assert_eq!(writes[1].1, vec![0xCC, 0xDD]);
        assert_eq!(writes[2].1, vec![0x0C]);
        assert_eq!(writes[3].1, vec![0x01]);
        assert_eq!(writes[4].1, vec![0x02]);
        assert_eq!(writes[5].1, vec![0x02]);
    }

    #[test]
    fn address_derivation_swaps_wire_order() {
        let (mut session, _delay) = harness(FakeRadio::new());
        let report = session.initialize().unwrap();

        // Wire word [0xCC, 0xDD] -> address 0xDDCC.
        assert_eq!(report.local_address, 0xDDCC);
        assert_eq!(session.local_address(), Some(0xDDCC));
    }

    #[test]
    fn failed_channel_step_degrades_but_continues() {
        let (mut session, _delay) =
            harness(FakeRadio::failing(*b"CH", FailMode::Timeout));
        let report = session.initialize().unwrap();

        assert_eq!(report.state(), SessionState::Degraded);

        let failed = report.failed_steps();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].step, ConfigStep::Channel);
        assert_eq!(failed[0].status, StepStatus::TimedOut);

        // Later steps still ran.
        let commands: Vec<[u8; 2]> = session
            .transport
            .config_writes
            .iter()
            .map(|(command, _)| *command)
            .collect();
        assert!(commands.ends_with(&[*b"ID", *b"AP", *b"MM"]));

        // Address derivation is independent of later step outcomes.
        assert_eq!(session.local_address(), Some(0xDDCC));
    }

    #[test]
    fn serial_query_failure_uses_fallback_word() {
        let (mut session, _delay) = harness(FakeRadio::failing(*b"SL", FailMode::Reject));
        let report = session.initialize().unwrap();

        assert_eq!(report.state(), SessionState::Degraded);
        assert_eq!(report.local_address, 0x0B00);

        // MY still written, with the fallback word.
        let my = session
            .transport
            .config_writes
            .iter()
            .find(|(command, _)| command == b"MY")
            .unwrap();
        assert_eq!(my.1, FALLBACK_ADDRESS_WORD.to_vec());
    }

    #[test]
    fn send_wraps_and_observes_turnaround_delay() {
        let (mut session, delay) = harness(FakeRadio::new());

        session.send(&[0x01, 0x02, 0x03]).unwrap();

        let sent = &session.transport.sent;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, crate::config::BROADCAST);
        assert_eq!(sent[0].1, vec![0x7F, 0x69, 0x6E, 0x01, 0x02, 0x03]);

        let calls = delay.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[Duration::from_millis(10)]);
    }

    #[test]
    fn send_to_overrides_destination_and_port() {
        let (mut session, _delay) = harness(FakeRadio::new());

        session.send_to(0x1234, 7, b"x").unwrap();

        let sent = &session.transport.sent;
        assert_eq!(sent[0].0, 0x1234);
        assert_eq!(sent[0].1, vec![0x7F, 0x69, 0x07, b'x']);
    }

    #[test]
    fn oversized_send_fails_without_transmitting() {
        let (mut session, delay) = harness(FakeRadio::new());
        let payload = vec![0u8; 1000];

        let err = session.send(&payload).unwrap_err();
        assert!(matches!(err, SessionError::Frame(_)));
        assert!(session.transport.sent.is_empty());
        assert!(delay.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn receive_maps_all_outcomes() {
        let mut radio = FakeRadio::new();
        radio.queue(data16(&[0x7F, 0x69, 0x6E, 0xAA]));
        let mut wrong_kind = data16(&[0x7F, 0x69, 0x6E, 0xAA]);
        wrong_kind.kind = PacketKind::TxStatus;
        radio.queue(wrong_kind);
        radio.queue(data16(&[0x7F, 0x69, 0x6F, 0xAA]));
        radio.queue(data16(&[0x7F, 0x69]));

        let (mut session, _delay) = harness(radio);

        match session.receive(SHORT).unwrap() {
            Received::Payload { payload, rssi, .. } => {
                assert_eq!(payload.as_ref(), &[0xAA]);
                assert_eq!(rssi, 0x33);
            }
            other => panic!("expected payload, got {other:?}"),
        }
        assert!(matches!(session.receive(SHORT).unwrap(), Received::WrongKind));
        assert!(matches!(
            session.receive(SHORT).unwrap(),
            Received::PortMismatch
        ));
        // Truncated frame is treated as no packet, not a crash.
        assert!(matches!(session.receive(SHORT).unwrap(), Received::NoPacket));
        assert!(matches!(session.receive(SHORT).unwrap(), Received::NoPacket));
    }

    #[test]
    fn receive_on_explicit_port() {
        let mut radio = FakeRadio::new();
        radio.queue(data16(&[0x7F, 0x69, 0x6F, 0xBB]));
        let (mut session, _delay) = harness(radio);

        match session.receive_on(111, SHORT).unwrap() {
            Received::Payload { payload, .. } => assert_eq!(payload.as_ref(), &[0xBB]),
            other => panic!("expected payload, got {other:?}"),
        }
    }

    #[test]
    fn set_channel_updates_cache_only_on_ack() {
        let (mut session, _delay) = harness(FakeRadio::new());
        session.set_channel(0x0E).unwrap();
        assert_eq!(session.channel(), 0x0E);

        let (mut session, _delay) = harness(FakeRadio::failing(*b"CH", FailMode::Reject));
        let err = session.set_channel(0x0F).unwrap_err();
        assert!(matches!(
            err,
            SessionError::StepFailed {
                step: ConfigStep::Channel,
                status: StepStatus::Rejected,
            }
        ));
        assert_eq!(session.channel(), 0x0C);
    }

    #[test]
    fn set_pan_id_round_trips() {
        let (mut session, _delay) = harness(FakeRadio::new());
        session.set_pan_id(0x42).unwrap();
        assert_eq!(session.pan_id(), 0x42);

        let write = session
            .transport
            .config_writes
            .iter()
            .find(|(command, _)| command == b"ID")
            .unwrap();
        assert_eq!(write.1, vec![0x42]);
    }

    #[test]
    fn accessors_and_into_transport() {
        let (mut session, _delay) = harness(FakeRadio::new());
        assert_eq!(session.local_address(), None);
        assert_eq!(session.config().channel, 0x0C);

        session.initialize().unwrap();
        session.send(b"x").unwrap();

        let outcome = session.receive(SHORT).unwrap();
        assert!(!outcome.is_payload());

        let radio = session.into_transport();
        assert_eq!(radio.sent.len(), 1);
    }

    #[test]
    fn hard_transport_failure_aborts_initialize() {
        struct DeadRadio;

        impl RadioTransport for DeadRadio {
            fn send_raw(&mut self, _: u16, _: &[u8]) -> panlink_transport::Result<()> {
                Err(TransportError::Closed)
            }

            fn receive_raw(
                &mut self,
                _: Duration,
            ) -> panlink_transport::Result<Option<RawPacket>> {
                Err(TransportError::Closed)
            }

            fn config_write(
                &mut self,
                _: [u8; 2],
                _: &[u8],
                _: Duration,
            ) -> panlink_transport::Result<ConfigResult> {
                Err(TransportError::Closed)
            }
        }

        let mut session = RadioSession::new(DeadRadio);
        let err = session.initialize().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Transport(TransportError::Closed)
        ));
    }
}
