/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit a single radio packet alongside the
    /// 3-byte header (fragmentation is out of scope).
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The framed length is shorter than the discriminator header.
    ///
    /// Checked before any length subtraction so an unsigned length can
    /// never wrap around into a huge spurious value.
    #[error("framed packet too short ({len} bytes, header needs 3)")]
    Underflow { len: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
