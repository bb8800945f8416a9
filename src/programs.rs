//! External program directory and on-demand program trace loading.
//!
//! The program directory maps a program name to its declared memory size,
//! loaded from a manifest of `name, size` lines before simulation starts
//! and read-only afterwards.
//!
//! Program traces for exec targets are loaded lazily through the
//! [`TraceSource`] seam: production runs read `<name>.txt` from a
//! directory, tests supply traces from an in-memory map so runs stay
//! deterministic and avoid OS interaction.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::activity::{parse_trace, ParseError, TraceLine};

/// Name → declared size (Mb) for every program an exec may load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramDirectory {
    sizes: BTreeMap<String, u32>,
}

/// Failure loading the program manifest.
#[derive(Debug)]
pub enum ManifestError {
    Io { path: PathBuf, source: io::Error },
    Malformed { path: PathBuf, line_no: usize, text: String },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::Malformed { path, line_no, text } => {
                write!(
                    f,
                    "{} line {line_no}: expected \"name, size\", got {text:?}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { .. } => None,
        }
    }
}

impl ProgramDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest of `name, size` lines. Blank lines are skipped.
    ///
    /// # Errors
    /// Returns a [`ManifestError`] on I/O failure or a malformed line.
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut dir = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let malformed = || ManifestError::Malformed {
                path: path.to_path_buf(),
                line_no: idx + 1,
                text: trimmed.to_string(),
            };
            let (name, size) = trimmed.split_once(',').ok_or_else(malformed)?;
            let name = name.trim();
            let size = size.trim().parse::<u32>().map_err(|_| malformed())?;
            if name.is_empty() {
                return Err(malformed());
            }
            dir.insert(name, size);
        }
        Ok(dir)
    }

    pub fn insert(&mut self, name: &str, size_mb: u32) {
        self.sizes.insert(name.to_string(), size_mb);
    }

    /// Declared size for a program, if the manifest listed it.
    pub fn size_of(&self, name: &str) -> Option<u32> {
        self.sizes.get(name).copied()
    }
}

/// Failure loading an exec target's trace.
///
/// These are reported as diagnostics and skipped; they never abort the
/// simulation.
#[derive(Debug)]
pub enum TraceSourceError {
    NotFound { program: String },
    Io { program: String, source: io::Error },
    Parse { program: String, source: ParseError },
}

impl fmt::Display for TraceSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { program } => write!(f, "no trace for program {program}"),
            Self::Io { program, source } => {
                write!(f, "cannot read trace for program {program}: {source}")
            }
            Self::Parse { program, source } => {
                write!(f, "malformed trace for program {program}: {source}")
            }
        }
    }
}

impl std::error::Error for TraceSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Supplies the trace for an exec target, loaded on demand.
pub trait TraceSource {
    fn load(&self, program: &str) -> Result<Vec<TraceLine>, TraceSourceError>;
}

/// Loads `<dir>/<name>.txt` from the filesystem.
#[derive(Clone, Debug)]
pub struct DirTraceSource {
    dir: PathBuf,
}

impl DirTraceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TraceSource for DirTraceSource {
    fn load(&self, program: &str) -> Result<Vec<TraceLine>, TraceSourceError> {
        let path = self.dir.join(format!("{program}.txt"));
        let text = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                TraceSourceError::NotFound {
                    program: program.to_string(),
                }
            } else {
                TraceSourceError::Io {
                    program: program.to_string(),
                    source,
                }
            }
        })?;
        parse_trace(&text).map_err(|source| TraceSourceError::Parse {
            program: program.to_string(),
            source,
        })
    }
}

/// In-memory trace source for tests and scenario replay.
#[derive(Clone, Debug, Default)]
pub struct MapTraceSource {
    traces: BTreeMap<String, Vec<TraceLine>>,
}

impl MapTraceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program's trace from its textual form.
    ///
    /// # Errors
    /// Returns the tokenizer error for malformed text.
    pub fn insert(&mut self, program: &str, text: &str) -> Result<(), ParseError> {
        self.traces.insert(program.to_string(), parse_trace(text)?);
        Ok(())
    }
}

impl TraceSource for MapTraceSource {
    fn load(&self, program: &str) -> Result<Vec<TraceLine>, TraceSourceError> {
        self.traces
            .get(program)
            .cloned()
            .ok_or_else(|| TraceSourceError::NotFound {
                program: program.to_string(),
            })
    }
}
