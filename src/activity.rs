//! Trace activities and the trace-line tokenizer.
//!
//! A trace is a sequence of lines of the form `KIND[, ARG][, PROGRAM]`.
//! Each line parses into exactly one [`Activity`]; unknown kinds are kept
//! as [`Activity::Unknown`] so the interpreter can echo them instead of
//! failing. Activities are immutable once parsed.
//!
//! Invariants:
//! - Numeric fields are validated here; the interpreter never sees a
//!   malformed argument.
//! - [`TraceLine`] retains the trimmed raw text for status-log headers and
//!   unrecognized-input echo.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One parsed trace activity.
///
/// The numeric argument is a duration in milliseconds or a device number,
/// depending on the kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    /// User-mode CPU burst of the given duration.
    Cpu { duration: u64 },
    /// System call raising the interrupt for `device`.
    Syscall { device: usize },
    /// I/O completion interrupt from `device`.
    EndIo { device: usize },
    /// Process creation. The argument costs the scheduler-call marker.
    Fork { duration: u64 },
    /// Image replacement by the named program. The argument costs the
    /// program-size lookup step.
    Exec { duration: u64, program: String },
    /// Start of the child's conditional block after a fork.
    IfChild,
    /// Start of the parent's conditional block; closes the child block.
    IfParent,
    /// End of a fork conditional; structural no-op.
    EndIf,
    /// Anything else. Echoed to the execution log, costs nothing.
    Unknown { token: String },
}

/// A parsed line paired with its trimmed raw text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLine {
    pub raw: String,
    pub activity: Activity,
}

/// Tokenizer failure for a single trace line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A kind that requires a numeric argument had none.
    MissingArgument { line_no: usize, kind: String },
    /// The numeric argument did not parse as a non-negative integer.
    InvalidNumber { line_no: usize, text: String },
    /// `EXEC` without a program name.
    MissingProgramName { line_no: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { line_no, kind } => {
                write!(f, "line {line_no}: {kind} requires a numeric argument")
            }
            Self::InvalidNumber { line_no, text } => {
                write!(f, "line {line_no}: invalid numeric argument {text:?}")
            }
            Self::MissingProgramName { line_no } => {
                write!(f, "line {line_no}: EXEC requires a program name")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses a whole trace, skipping blank lines.
///
/// Line numbers in errors are 1-based over the original text.
///
/// # Errors
/// Returns the first [`ParseError`] encountered.
pub fn parse_trace(text: &str) -> Result<Vec<TraceLine>, ParseError> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if let Some(line) = parse_line(raw, idx + 1)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Parses a single trace line. Returns `None` for blank lines.
///
/// # Errors
/// Returns a [`ParseError`] when a recognized kind has a malformed or
/// missing argument. Unknown kinds never fail.
pub fn parse_line(raw: &str, line_no: usize) -> Result<Option<TraceLine>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let mut fields = trimmed.splitn(3, ',').map(str::trim);
    let kind = fields.next().unwrap_or("");
    let arg = fields.next();
    let rest = fields.next();

    let number = |field: Option<&str>| -> Result<u64, ParseError> {
        let text = field.filter(|s| !s.is_empty()).ok_or(ParseError::MissingArgument {
            line_no,
            kind: kind.to_string(),
        })?;
        text.parse::<u64>().map_err(|_| ParseError::InvalidNumber {
            line_no,
            text: text.to_string(),
        })
    };

    let activity = match kind {
        "CPU" => Activity::Cpu { duration: number(arg)? },
        "SYSCALL" => Activity::Syscall {
            device: number(arg)? as usize,
        },
        "END_IO" => Activity::EndIo {
            device: number(arg)? as usize,
        },
        "FORK" => Activity::Fork { duration: number(arg)? },
        "EXEC" => {
            let duration = number(arg)?;
            let program = rest
                .filter(|s| !s.is_empty())
                .ok_or(ParseError::MissingProgramName { line_no })?;
            Activity::Exec {
                duration,
                program: program.to_string(),
            }
        }
        "IF_CHILD" => Activity::IfChild,
        "IF_PARENT" => Activity::IfParent,
        "ENDIF" => Activity::EndIf,
        other => Activity::Unknown {
            token: other.to_string(),
        },
    };

    Ok(Some(TraceLine {
        raw: trimmed.to_string(),
        activity,
    }))
}
