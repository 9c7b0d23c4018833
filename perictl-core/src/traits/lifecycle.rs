//! Driver teardown trait

/// Driver that holds a device handle and can give it back
///
/// `cleanup` must be idempotent: after the first call it returns `Ok(())`
/// without touching the hardware again.
pub trait Cleanup {
    /// Error from releasing the underlying handle
    type Error;

    /// Put the device in its safe state and release the handle
    fn cleanup(&mut self) -> Result<(), Self::Error>;

    /// Check if the handle has already been released
    fn is_released(&self) -> bool;
}
