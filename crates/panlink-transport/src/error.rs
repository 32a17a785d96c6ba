use std::time::Duration;

/// Errors that can occur in radio transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The radio did not respond within the allowed time.
    #[error("no response from radio within {0:?}")]
    Timeout(Duration),

    /// The radio reported a failure status for the request.
    #[error("radio reported failure status 0x{status:02X}")]
    Nack { status: u8 },

    /// The radio link is gone (peer endpoint dropped, serial line closed).
    #[error("radio link closed")]
    Closed,

    /// An I/O error occurred on the underlying link.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
