//! Serialized post-run summary artifact.
//!
//! The report captures the run configuration and final machine state so a
//! run can be inspected (or diffed against a later run of the same trace)
//! without re-parsing the flat logs. The schema is versioned for
//! forward-compatible evolution.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::interpreter::SimOutput;
use crate::memory::Partition;
use crate::process::Pcb;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Post-run summary, serialized as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    /// Configuration the run used, verbatim.
    pub config: SimConfig,
    /// Final clock value in milliseconds.
    pub end_time_ms: u64,
    /// Process table at end of run, in wait-queue order.
    pub processes: Vec<Pcb>,
    /// Partition table at end of run.
    pub partitions: Vec<Partition>,
    /// Non-fatal problems encountered during the run.
    pub diagnostics: Vec<String>,
}

impl RunReport {
    pub fn new(cfg: &SimConfig, out: &SimOutput) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            config: cfg.clone(),
            end_time_ms: out.end_time,
            processes: out.directory.entries().to_vec(),
            partitions: out.memory.partitions().to_vec(),
            diagnostics: out.diagnostics.clone(),
        }
    }

    /// Pretty-printed JSON form.
    ///
    /// # Errors
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
