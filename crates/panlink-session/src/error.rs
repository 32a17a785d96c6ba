use crate::session::{ConfigStep, StepStatus};

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] panlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] panlink_frame::FrameError),

    /// A requested configuration change was not applied by the radio.
    #[error("configuration step {step:?} failed: {status:?}")]
    StepFailed { step: ConfigStep, status: StepStatus },
}

pub type Result<T> = std::result::Result<T, SessionError>;
