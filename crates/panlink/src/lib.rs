//! Port-multiplexed framing over 16-bit-addressed 802.15.4 radio networks.
//!
//! panlink lets many independent logical "ports" (applications) share one
//! physical radio network: every outbound payload is tagged with a 3-byte
//! discriminator (local pan pair + port) and inbound packets are filtered
//! so only matching traffic reaches the application.
//!
//! # Crate Structure
//!
//! - [`transport`] — Radio transport abstraction (trait, raw packets,
//!   in-memory loopback)
//! - [`frame`] — 3-byte discriminator framing with port multiplexing
//! - [`session`] — Device configuration and framed send/receive

/// Re-export transport types.
pub mod transport {
    pub use panlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use panlink_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use panlink_session::*;
}
