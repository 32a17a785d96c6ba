//! Radio transport abstraction for panlink.
//!
//! Provides a unified interface over the underlying 802.15.4 radio link:
//! raw 16-bit-addressed packet send/receive and the blocking AT-register
//! configuration exchange the session layer drives during initialization.
//!
//! This is the lowest layer of panlink. Everything else builds on top of
//! the [`RadioTransport`] trait defined here. The in-tree implementation is
//! [`Loopback`], an in-memory endpoint pair used by tests, examples, and
//! simulations; hardware serial drivers live out of tree.

pub mod error;
pub mod loopback;
pub mod packet;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::Loopback;
pub use packet::{ConfigResult, PacketKind, RawPacket};
pub use traits::RadioTransport;
