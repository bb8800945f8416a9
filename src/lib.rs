//! Deterministic single-CPU kernel trace simulator.
//!
//! ## Scope
//! This crate replays a textual trace of kernel-visible activities (CPU
//! bursts, system calls, I/O completions, and fork/exec directives) and
//! produces a timestamped execution log plus process-table snapshots at
//! fork/exec transition points. It is a deterministic replay engine, not a
//! scheduler: the scheduler invocation is a no-op log marker.
//!
//! ## Key invariants
//! - The simulation clock is monotonic and advances only by the declared
//!   cost of each logged step.
//! - The process directory never holds two entries with the same pid;
//!   entries are replaced, not appended, on exec.
//! - Partition occupancy is exclusive: an occupied partition has exactly
//!   one owner, and that owner's PCB points back at it.
//! - In-simulation failures (allocation denial, missing exec trace,
//!   unrecognized activity) are logged and skipped, never fatal.
//!
//! ## Replay flow (single trace)
//! 1) Tokenize trace lines into [`activity::Activity`] values.
//! 2) Boot the root process (`init`, 1 Mb) into the partition table.
//! 3) Interpret activities in order, entering the kernel through the
//!    [`dispatch`] timing model for every interrupt-like activity.
//! 4) `FORK` splits the remaining trace into a child slice and recurses;
//!    the child runs to completion before the parent resumes.
//! 5) `EXEC` replaces the process image and tail-recurses into the named
//!    program's own trace.
//!
//! ## Notable entry points
//! - [`interpreter::Simulation`]: engine owning the clock, directory, and
//!   partition table for one run.
//! - [`activity::parse_trace`]: trace tokenizer.
//! - [`programs::TraceSource`]: seam supplying per-exec program traces
//!   (filesystem in production, in-memory map in tests).
//! - [`report::RunReport`]: serialized post-run summary artifact.

pub mod activity;
pub mod clock;
pub mod config;
pub mod devices;
pub mod dispatch;
pub mod interpreter;
pub mod logbuf;
pub mod memory;
pub mod process;
pub mod programs;
pub mod report;

pub use activity::{parse_trace, Activity, ParseError, TraceLine};
pub use clock::SimClock;
pub use config::{Costs, SimConfig};
pub use devices::DeviceTable;
pub use interpreter::{BootError, SimOutput, Simulation};
pub use memory::{Partition, PartitionTable};
pub use process::{Pcb, ProcessDirectory};
pub use programs::{DirTraceSource, MapTraceSource, ProgramDirectory, TraceSource};
pub use report::RunReport;
