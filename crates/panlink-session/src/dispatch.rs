use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use panlink_frame::{decode_frame, Decoded};
use panlink_transport::{RadioTransport, TransportError};
use tracing::debug;

use crate::delay::{Delay, StdDelay};
use crate::error::Result;
use crate::session::RadioSession;

/// One frame handed to a registered port handler.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub port: u8,
    pub payload: Bytes,
    pub rssi: u8,
    pub source: u16,
}

/// Poll-driven routing of inbound frames to per-port handlers.
///
/// Register a handler per logical port, then call [`poll`](Self::poll)
/// from the application loop. Frames for unregistered ports or foreign
/// pans are discarded; there is no background thread, in keeping with the
/// layer's cooperative blocking model.
pub struct PortDispatcher<T, D = StdDelay> {
    session: RadioSession<T, D>,
    handlers: HashMap<u8, Box<dyn FnMut(Delivery)>>,
}

impl<T: RadioTransport, D: Delay> PortDispatcher<T, D> {
    /// Wrap a session for port-based dispatch.
    pub fn new(session: RadioSession<T, D>) -> Self {
        Self {
            session,
            handlers: HashMap::new(),
        }
    }

    /// Register the handler for one port, replacing any previous one.
    pub fn on_port(&mut self, port: u8, handler: impl FnMut(Delivery) + 'static) {
        self.handlers.insert(port, Box::new(handler));
    }

    /// Wait up to `timeout` for one packet and route it.
    ///
    /// Returns `Ok(true)` when a handler ran, `Ok(false)` when nothing
    /// arrived or the packet was not for any registered port.
    pub fn poll(&mut self, timeout: Duration) -> Result<bool> {
        let packet = match self.session.transport.receive_raw(timeout) {
            Ok(Some(packet)) => packet,
            Ok(None) => return Ok(false),
            Err(TransportError::Timeout(_)) => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        match decode_frame(&packet) {
            Decoded::Addressed {
                header,
                payload,
                rssi,
                source,
            } if header.is_local_pan() => {
                let port = header.port();
                if let Some(handler) = self.handlers.get_mut(&port) {
                    handler(Delivery {
                        port,
                        payload,
                        rssi,
                        source,
                    });
                    return Ok(true);
                }
                debug!(port, "no handler registered; discarding frame");
            }
            Decoded::Addressed { header, .. } => {
                debug!(header = ?header.as_bytes(), "discarding foreign-pan frame");
            }
            Decoded::NotAddressedKind { kind } => {
                debug!(?kind, "discarding non-data packet");
            }
            Decoded::Malformed { len } => {
                debug!(len, "discarding truncated frame");
            }
        }
        Ok(false)
    }

    /// Borrow the wrapped session (for sends between polls).
    pub fn session(&self) -> &RadioSession<T, D> {
        &self.session
    }

    /// Mutably borrow the wrapped session.
    pub fn session_mut(&mut self) -> &mut RadioSession<T, D> {
        &mut self.session
    }

    /// Consume the dispatcher and return the session.
    pub fn into_session(self) -> RadioSession<T, D> {
        self.session
    }
}

impl<T, D> std::fmt::Debug for PortDispatcher<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ports: Vec<u8> = self.handlers.keys().copied().collect();
        ports.sort_unstable();
        f.debug_struct("PortDispatcher")
            .field("ports", &ports)
            .finish()
    }
}
