//! GPIO lines through the legacy sysfs interface
//!
//! Each line is exported on first use, its direction set from the first
//! operation (write → `out`, read → `in`), and unexported on release.
//! Writing to a line that was read from switches it to output.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use perictl_hal::BusChannel;

use crate::error::{SysfsError, SysfsResult};

/// Where the kernel exposes GPIO lines
pub const DEFAULT_ROOT: &str = "/sys/class/gpio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Sysfs GPIO bus addressed by line number (BCM numbering on a Pi)
pub struct SysfsGpio {
    root: PathBuf,
    lines: HashMap<u8, Direction>,
}

impl SysfsGpio {
    /// Bus at the standard sysfs location
    pub fn new() -> Self {
        Self::with_root(DEFAULT_ROOT)
    }

    /// Bus rooted somewhere else (tests, chroots)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lines: HashMap::new(),
        }
    }

    /// Sysfs directory this bus writes to
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if a line is currently exported by this bus
    pub fn is_exported(&self, line: u8) -> bool {
        self.lines.contains_key(&line)
    }

    fn line_dir(&self, line: u8) -> PathBuf {
        self.root.join(format!("gpio{}", line))
    }

    fn write_file(path: &Path, contents: &str) -> SysfsResult<()> {
        fs::write(path, contents).map_err(|e| SysfsError::from_io(path, e))
    }

    /// Export the line if needed and make sure it points the right way
    fn claim(&mut self, line: u8, direction: Direction) -> SysfsResult<PathBuf> {
        let dir = self.line_dir(line);

        match self.lines.get(&line) {
            Some(&current) if current == direction || current == Direction::Out => {
                return Ok(dir);
            }
            Some(_) => {}
            None => {
                if !dir.exists() {
                    Self::write_file(&self.root.join("export"), &line.to_string())?;
                }
                if !dir.exists() {
                    return Err(SysfsError::NotFound(dir));
                }

                #[cfg(feature = "defmt")]
                defmt::debug!("gpio: exported line {}", line);
            }
        }

        Self::write_file(&dir.join("direction"), direction.as_str())?;
        self.lines.insert(line, direction);
        Ok(dir)
    }
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl BusChannel for SysfsGpio {
    type Address = u8;
    type Error = SysfsError;

    /// Drives the line high for any non-zero value
    fn write(&mut self, line: u8, value: u32) -> SysfsResult<()> {
        let dir = self.claim(line, Direction::Out)?;
        let level = if value != 0 { "1" } else { "0" };
        Self::write_file(&dir.join("value"), level)
    }

    /// Reads the line level as one byte (0 or 1)
    fn read(&mut self, line: u8, buf: &mut [u8]) -> SysfsResult<usize> {
        let dir = self.claim(line, Direction::In)?;
        let path = dir.join("value");
        let text = fs::read_to_string(&path).map_err(|e| SysfsError::from_io(&path, e))?;

        let Some(slot) = buf.first_mut() else {
            return Ok(0);
        };
        *slot = u8::from(text.trim() != "0");
        Ok(1)
    }

    /// Unexports the line
    fn release(&mut self, line: u8) -> SysfsResult<()> {
        if self.lines.remove(&line).is_none() {
            return Ok(());
        }
        Self::write_file(&self.root.join("unexport"), &line.to_string())?;

        #[cfg(feature = "defmt")]
        defmt::debug!("gpio: unexported line {}", line);

        Ok(())
    }
}
