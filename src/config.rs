//! Run configuration: fixed kernel step costs and the CPU speed multiplier.
//!
//! The cost table pins every fixed-duration kernel step so that a given
//! trace always produces byte-identical logs. The configuration is
//! serde-derived and captured verbatim in [`crate::report::RunReport`].

use serde::{Deserialize, Serialize};

/// Fixed costs (ms) for the kernel steps the interpreter emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Costs {
    /// Switch to kernel mode at interrupt entry.
    pub switch_mode: u64,
    /// Find the device's vector table entry.
    pub vector_lookup: u64,
    /// Load the ISR address into the PC.
    pub load_isr: u64,
    /// Save (full) context at interrupt entry.
    pub context_save: u64,
    /// Return from interrupt.
    pub iret: u64,
    /// Copy the parent PCB into the child on fork.
    pub clone_pcb: u64,
    /// Per-Mb cost of loading a program image on exec.
    pub load_per_mb: u64,
    /// Mark the target partition occupied on exec.
    pub mark_partition: u64,
    /// Rewrite the PCB identity fields on exec.
    pub update_pcb: u64,
}

impl Default for Costs {
    fn default() -> Self {
        Self {
            switch_mode: 1,
            vector_lookup: 1,
            load_isr: 1,
            context_save: 10,
            iret: 1,
            clone_pcb: 2,
            load_per_mb: 15,
            mark_partition: 1,
            update_pcb: 1,
        }
    }
}

/// Complete configuration for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub costs: Costs,
    /// CPU burst durations are divided by this before logging.
    ///
    /// Sanitized at construction: non-positive or non-finite values fall
    /// back to 1.0.
    pub cpu_speed: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            costs: Costs::default(),
            cpu_speed: 1.0,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default costs with an explicit CPU speed multiplier.
    pub fn with_cpu_speed(speed: f64) -> Self {
        Self {
            costs: Costs::default(),
            cpu_speed: sanitize_speed(speed),
        }
    }

    /// Scale a CPU burst by the speed multiplier, rounding half away from
    /// zero (the behavior of `llround`).
    pub fn scale_cpu(&self, duration_ms: u64) -> u64 {
        let speed = sanitize_speed(self.cpu_speed);
        (duration_ms as f64 / speed).round() as u64
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    }
}
