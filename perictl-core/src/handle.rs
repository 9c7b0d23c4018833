//! Device handle ownership and guaranteed release
//!
//! Every driver owns exactly one [`DeviceHandle`]: the bus address of the
//! line or device it drives. The handle hands its address out for release
//! only once, which makes `cleanup()` idempotent without the driver having
//! to track anything else.
//!
//! [`Scoped`] wraps a driver so its cleanup runs on every exit path of the
//! enclosing scope: normal return, `?`, early return, or an unwinding
//! panic.

use core::ops::{Deref, DerefMut};

use crate::traits::Cleanup;

/// Bus address owned by one driver, released at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceHandle<A> {
    address: A,
    released: bool,
}

impl<A: Copy> DeviceHandle<A> {
    /// Bind a handle to an address
    pub const fn new(address: A) -> Self {
        Self {
            address,
            released: false,
        }
    }

    /// The address, or `None` once released
    pub fn address(&self) -> Option<A> {
        if self.released {
            None
        } else {
            Some(self.address)
        }
    }

    /// Check if the handle has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Mark the handle released and return the address to release
    ///
    /// Returns `Some` exactly once. The handle counts as released even if
    /// the platform then fails to release the address: a failed release is
    /// not attempted again.
    pub fn take_for_release(&mut self) -> Option<A> {
        if self.released {
            return None;
        }
        self.released = true;
        Some(self.address)
    }
}

/// Driver that is cleaned up when it goes out of scope
///
/// Dereferences to the driver. Use [`Scoped::finish`] to observe the
/// cleanup result; a plain drop can only log it.
pub struct Scoped<D: Cleanup> {
    inner: D,
}

impl<D: Cleanup> Scoped<D> {
    /// Take ownership of a driver
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Clean up now and report the result
    pub fn finish(mut self) -> Result<(), D::Error> {
        self.inner.cleanup()
        // Drop then sees a released driver and does nothing
    }
}

impl<D: Cleanup> Deref for Scoped<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.inner
    }
}

impl<D: Cleanup> DerefMut for Scoped<D> {
    fn deref_mut(&mut self) -> &mut D {
        &mut self.inner
    }
}

impl<D: Cleanup> Drop for Scoped<D> {
    fn drop(&mut self) {
        if self.inner.is_released() {
            return;
        }
        if self.inner.cleanup().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("cleanup on scope exit failed");
        }
    }
}
