//! Errors from the sysfs buses

use std::io;
use std::path::PathBuf;

use perictl_hal::{BusError, BusErrorKind};
use thiserror::Error;

/// Result type for sysfs bus operations
pub type SysfsResult<T> = Result<T, SysfsError>;

/// Errors from a sysfs-backed bus
#[derive(Debug, Error)]
pub enum SysfsError {
    /// Device or line does not exist
    #[error("no device at {0}")]
    NotFound(PathBuf),

    /// Address was not handed out by this bus
    #[error("unknown bus address {0}")]
    UnknownAddress(usize),

    /// Kernel did not answer in time
    #[error("timed out accessing {0}")]
    Timeout(PathBuf),

    /// Operation the bus cannot perform (e.g. writing to a thermometer)
    #[error("{0} is not supported on this bus")]
    Unsupported(&'static str),

    /// Any other I/O failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl SysfsError {
    /// Classify an I/O error on `path`
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => SysfsError::NotFound(path),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => SysfsError::Timeout(path),
            _ => SysfsError::Io { path, source },
        }
    }
}

impl BusError for SysfsError {
    fn kind(&self) -> BusErrorKind {
        match self {
            SysfsError::NotFound(_) | SysfsError::UnknownAddress(_) => BusErrorKind::NotFound,
            SysfsError::Timeout(_) => BusErrorKind::Timeout,
            SysfsError::Unsupported(_) | SysfsError::Io { .. } => BusErrorKind::Other,
        }
    }
}
