use std::time::Duration;

/// Post-transmit quiescence hook.
///
/// Kept as a seam so tests can assert that the turnaround pause happens
/// instead of actually sleeping through it.
pub trait Delay {
    /// Pause the calling thread for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Delay backed by the OS clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
