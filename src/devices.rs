//! Device vector table and I/O delay table.
//!
//! Both tables are indexed by device number. The vector table holds the
//! ISR entry label for each device; the delay table holds the device's
//! I/O completion delay in milliseconds. Files use one entry per line.
//! The tables are loaded fully formed before simulation and are read-only
//! afterwards.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Per-device ISR labels and I/O delays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTable {
    vectors: Vec<String>,
    delays: Vec<u64>,
}

/// Failure loading a device or vector table file.
#[derive(Debug)]
pub enum DeviceTableError {
    Io { path: PathBuf, source: io::Error },
    InvalidDelay { path: PathBuf, line_no: usize, text: String },
}

impl fmt::Display for DeviceTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::InvalidDelay { path, line_no, text } => {
                write!(
                    f,
                    "{} line {line_no}: invalid delay {text:?}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for DeviceTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidDelay { .. } => None,
        }
    }
}

impl DeviceTable {
    pub fn new(vectors: Vec<String>, delays: Vec<u64>) -> Self {
        Self { vectors, delays }
    }

    /// Load the vector table and delay table from their files.
    ///
    /// Vector file: one ISR entry label per line. Delay file: one
    /// non-negative integer (ms) per line. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns a [`DeviceTableError`] on I/O failure or a malformed delay.
    pub fn from_files(vector_path: &Path, delay_path: &Path) -> Result<Self, DeviceTableError> {
        let read = |path: &Path| -> Result<String, DeviceTableError> {
            fs::read_to_string(path).map_err(|source| DeviceTableError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        let vectors = read(vector_path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        let mut delays = Vec::new();
        for (idx, line) in read(delay_path)?.lines().enumerate() {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            let delay = text.parse::<u64>().map_err(|_| DeviceTableError::InvalidDelay {
                path: delay_path.to_path_buf(),
                line_no: idx + 1,
                text: text.to_string(),
            })?;
            delays.push(delay);
        }

        Ok(Self { vectors, delays })
    }

    /// Whether `device` indexes into both tables.
    #[inline(always)]
    pub fn has_device(&self, device: usize) -> bool {
        device < self.vectors.len() && device < self.delays.len()
    }

    /// I/O completion delay for a device. Caller validates with [`Self::has_device`].
    #[inline(always)]
    pub fn delay(&self, device: usize) -> u64 {
        self.delays[device]
    }

    /// Vector labels, index = device number.
    #[inline(always)]
    pub fn vectors(&self) -> &[String] {
        &self.vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DeviceTable {
        DeviceTable::new(
            vec!["0x01A0".into(), "0x02C4".into(), "0x0424".into(), "0x0506".into()],
            vec![100, 110, 120, 130],
        )
    }

    #[test]
    fn indexes_by_device_number() {
        let t = table();
        assert!(t.has_device(3));
        assert!(!t.has_device(4));
        assert_eq!(t.vectors()[1], "0x02C4");
        assert_eq!(t.delay(2), 120);
    }

    #[test]
    fn device_valid_only_when_in_both_tables() {
        let t = DeviceTable::new(vec!["0x01A0".into(), "0x02C4".into()], vec![100]);
        assert!(t.has_device(0));
        assert!(!t.has_device(1));
    }
}
