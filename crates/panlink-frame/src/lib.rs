//! 3-byte discriminator framing with port multiplexing for shared radios.
//!
//! This is the core value-add layer of panlink. Every payload is framed
//! with:
//! - A 2-byte local pan pair (0x7F 0x69) distinguishing panlink traffic
//!   from unrelated payloads on the same physical network
//! - A 1-byte port selecting the logical channel within the pan
//!
//! Validation is an O(1) equality check on the fixed-width, front-loaded
//! header, which is what the severely constrained target hardware affords.

pub mod codec;
pub mod error;

pub use codec::{
    decode_frame, encode_frame, strip_header, wrap, Decoded, Frame, FrameHeader, DEFAULT_PORT,
    HEADER_SIZE, LOCAL_PAN, MAX_FRAME, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
