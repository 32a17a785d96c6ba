//! High-level radio session management for panlink.
//!
//! This is the "just works" layer. Initialize the device once, then send
//! and receive framed messages on logical ports, with inbound traffic
//! filtered down to the packets that belong to this protocol layer.

pub mod config;
pub mod delay;
pub mod dispatch;
pub mod error;
pub mod session;

pub use config::{SessionConfig, BROADCAST, FALLBACK_ADDRESS_WORD};
pub use delay::{Delay, StdDelay};
pub use dispatch::{Delivery, PortDispatcher};
pub use error::{Result, SessionError};
pub use session::{
    ConfigStep, InitReport, RadioSession, Received, SessionState, StepOutcome, StepStatus,
};
