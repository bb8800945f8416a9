//! Execution and status log accumulators.
//!
//! Both logs are accumulated as verbatim text during the run; the binary
//! writes them unchanged to their flat destination files. Execution-log
//! entries are `"<time>, <cost>, <description>"` lines with a blank line
//! between top-level activity groups; the status log is a sequence of
//! snapshot blocks separated by blank lines.

/// Accumulates the timed execution log.
#[derive(Clone, Debug, Default)]
pub struct ExecutionLog {
    buf: String,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one timed step.
    pub fn step(&mut self, time: u64, cost: u64, description: &str) {
        self.buf.push_str(&format!("{time}, {cost}, {description}\n"));
    }

    /// Append a verbatim line (no time/cost column).
    pub fn line(&mut self, text: &str) {
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Append pre-rendered step text (dispatch output).
    pub fn append(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    /// Close the current activity group with a blank line.
    pub fn end_group(&mut self) {
        self.buf.push('\n');
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

/// Accumulates process-table snapshot blocks.
#[derive(Clone, Debug, Default)]
pub struct StatusLog {
    buf: String,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rendered snapshot block.
    pub fn block(&mut self, rendered: String) {
        self.buf.push_str(&rendered);
        self.buf.push('\n');
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}
