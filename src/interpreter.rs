//! Recursive trace interpreter: the simulation engine.
//!
//! The engine walks a trace one activity at a time and models running a
//! forked child (or an exec'd replacement image) as a recursive
//! sub-interpretation: the child's slice runs to completion before the
//! parent resumes, which is exactly the no-preemption assumption of the
//! model. One engine instance owns the clock, the process directory, the
//! partition table, and both logs, so every recursive frame mutates the
//! same state and a child's effects are visible to the parent's
//! continuation without any copy-back.
//!
//! Invariants:
//! - Time advances only through [`Simulation::step`] and the dispatch
//!   model, always by the logged cost.
//! - A successful FORK or EXEC renders a directory snapshot; failed ones
//!   log and continue without side effects on the process table.
//! - A successful EXEC ends the enclosing scan when its sub-run returns:
//!   image replacement discards the caller's remaining instruction stream.

use std::fmt;

use crate::activity::{Activity, TraceLine};
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::devices::DeviceTable;
use crate::dispatch::dispatch;
use crate::logbuf::{ExecutionLog, StatusLog};
use crate::memory::PartitionTable;
use crate::process::{replace_image, spawn_child, Pcb, ProcessDirectory};
use crate::programs::{ProgramDirectory, TraceSource};

/// Synthetic vector raised by a FORK activity.
pub const FORK_VECTOR: usize = 2;
/// Synthetic vector raised by an EXEC activity.
pub const EXEC_VECTOR: usize = 3;

/// Program name and size of the root process.
pub const ROOT_PROGRAM: &str = "init";
pub const ROOT_SIZE_MB: u32 = 1;

/// The simulation cannot start: the root process has no partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootError {
    RootAllocation { size_mb: u32 },
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootAllocation { size_mb } => {
                write!(f, "no partition fits the {size_mb} Mb root process")
            }
        }
    }
}

impl std::error::Error for BootError {}

/// Everything a finished run produced.
#[derive(Clone, Debug)]
pub struct SimOutput {
    /// Execution log text, written verbatim to the execution file.
    pub execution: String,
    /// Status log text, written verbatim to the status file.
    pub status: String,
    /// Final clock value reached by the deepest completed branch.
    pub end_time: u64,
    /// Process table at end of run, in wait-queue order.
    pub directory: ProcessDirectory,
    /// Partition table at end of run.
    pub memory: PartitionTable,
    /// Non-fatal problems encountered (skipped activities, missing traces).
    pub diagnostics: Vec<String>,
}

/// One simulation run over a main trace.
pub struct Simulation<'a, S: TraceSource> {
    cfg: &'a SimConfig,
    devices: &'a DeviceTable,
    programs: &'a ProgramDirectory,
    traces: &'a S,
    clock: SimClock,
    memory: PartitionTable,
    directory: ProcessDirectory,
    /// Next pid to hand out; never decremented, even for failed forks.
    pid_counter: u32,
    execution: ExecutionLog,
    status: StatusLog,
    diagnostics: Vec<String>,
}

impl<'a, S: TraceSource> Simulation<'a, S> {
    /// Engine over the default partition layout.
    pub fn new(
        cfg: &'a SimConfig,
        devices: &'a DeviceTable,
        programs: &'a ProgramDirectory,
        traces: &'a S,
    ) -> Self {
        Self::with_partitions(cfg, devices, programs, traces, PartitionTable::default())
    }

    /// Engine over an explicit partition layout.
    pub fn with_partitions(
        cfg: &'a SimConfig,
        devices: &'a DeviceTable,
        programs: &'a ProgramDirectory,
        traces: &'a S,
        memory: PartitionTable,
    ) -> Self {
        Self {
            cfg,
            devices,
            programs,
            traces,
            clock: SimClock::new(),
            memory,
            directory: ProcessDirectory::new(),
            pid_counter: 1,
            execution: ExecutionLog::new(),
            status: StatusLog::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Boot the root process and replay the whole trace.
    ///
    /// # Errors
    /// Returns [`BootError`] when the root process cannot be allocated;
    /// everything after boot is log-and-continue.
    pub fn run(mut self, trace: &[TraceLine]) -> Result<SimOutput, BootError> {
        let mut root = Pcb::root(ROOT_PROGRAM, ROOT_SIZE_MB);
        if !self.memory.allocate(&mut root) {
            return Err(BootError::RootAllocation {
                size_mb: root.size_mb,
            });
        }
        self.directory.upsert(root.clone());

        self.run_slice(trace, &mut root);

        Ok(SimOutput {
            execution: self.execution.as_str().to_string(),
            status: self.status.as_str().to_string(),
            end_time: self.clock.now(),
            directory: self.directory,
            memory: self.memory,
            diagnostics: self.diagnostics,
        })
    }

    /// Interpret one trace slice for one process.
    ///
    /// The cursor moves linearly except at FORK (jumps to the parent's
    /// resume point after the child's recursive run) and at a successful
    /// EXEC (the scan ends once the replacement image's run returns).
    fn run_slice(&mut self, trace: &[TraceLine], process: &mut Pcb) {
        let mut i = 0;
        while i < trace.len() {
            let line = &trace[i];
            match &line.activity {
                Activity::Cpu { duration } => self.cpu_burst(*duration),
                Activity::Syscall { device } => self.device_interrupt(*device, "SYSCALL"),
                Activity::EndIo { device } => self.device_interrupt(*device, "END_IO"),
                Activity::Fork { duration } => {
                    i = self.handle_fork(trace, i, *duration, process);
                    continue;
                }
                Activity::Exec { duration, program } => {
                    if self.handle_exec(&line.raw, *duration, program, process) {
                        return;
                    }
                }
                // Structural markers are consumed by the FORK lookahead
                // and are no-ops when scanned directly.
                Activity::IfChild | Activity::IfParent | Activity::EndIf => {}
                Activity::Unknown { token } => {
                    self.execution
                        .line(&format!("{token} is not recognized as a valid input"));
                    self.execution.end_group();
                }
            }
            i += 1;
        }
    }

    fn cpu_burst(&mut self, duration: u64) {
        let cost = self.cfg.scale_cpu(duration);
        self.step(cost, "CPU execution");
        self.execution.end_group();
    }

    /// SYSCALL and END_IO share the dispatch model; only the service-step
    /// label differs. The device delay is the whole ISR service cost.
    fn device_interrupt(&mut self, device: usize, label: &str) {
        if !self.devices.has_device(device) {
            self.diagnostics.push(format!(
                "{label}: device {device} not in device tables, activity skipped"
            ));
            return;
        }
        self.enter_kernel(device);
        self.step(
            self.devices.delay(device),
            &format!("{label}: run the ISR (device driver)"),
        );
        self.step(self.cfg.costs.iret, "IRET");
        self.execution.end_group();
    }

    /// Returns the cursor position where the parent resumes.
    fn handle_fork(
        &mut self,
        trace: &[TraceLine],
        at: usize,
        sched_cost: u64,
        parent: &mut Pcb,
    ) -> usize {
        if !self.vector_available(FORK_VECTOR, "FORK") {
            return at + 1;
        }
        self.enter_kernel(FORK_VECTOR);
        let costs = self.cfg.costs;
        self.step(costs.clone_pcb, "FORK: copy parent PCB to child PCB");

        let pid = self.next_pid();
        let mut child = spawn_child(parent, pid);
        if !self.memory.allocate(&mut child) {
            self.step(
                0,
                &format!(
                    "FORK: no free partition fits {} Mb, child not created",
                    child.size_mb
                ),
            );
            self.execution.end_group();
            return at + 1;
        }

        // Child ahead of the re-enqueued parent: child runs first, no
        // preemption.
        self.directory.upsert(child.clone());
        self.directory.upsert(parent.clone());
        self.step(sched_cost, "scheduler called");
        self.step(costs.iret, "IRET");
        self.execution.end_group();
        self.status
            .block(self.directory.render_snapshot(self.clock.now(), &trace[at].raw));

        let (child_slice, resume_at) = split_child_block(trace, at);
        self.run_slice(&child_slice, &mut child);
        resume_at
    }

    /// Returns `true` when a successful exec's sub-run ended the scan.
    fn handle_exec(
        &mut self,
        raw: &str,
        lookup_cost: u64,
        program: &str,
        process: &mut Pcb,
    ) -> bool {
        if !self.vector_available(EXEC_VECTOR, "EXEC") {
            return false;
        }
        let Some(size) = self.programs.size_of(program) else {
            self.diagnostics.push(format!(
                "EXEC: program {program} not in program directory, activity skipped"
            ));
            return false;
        };

        self.enter_kernel(EXEC_VECTOR);
        let costs = self.cfg.costs;
        self.step(lookup_cost, &format!("Program is {size} Mb large"));

        let mut image = Pcb {
            pid: process.pid,
            parent: process.parent,
            program: program.to_string(),
            size_mb: size,
            partition: None,
        };
        if !self.memory.allocate(&mut image) {
            self.step(
                0,
                &format!("EXEC: no free partition fits {size} Mb, image not replaced"),
            );
            self.execution.end_group();
            // The old image keeps running; its directory entry and queue
            // position are untouched.
            return false;
        }
        let new_partition = match image.partition {
            Some(p) => p,
            None => return false, // unreachable: allocate() just succeeded
        };

        // The old image's partition is still occupied by this pid, so the
        // first-fit pass above cannot have picked it again.
        self.memory.free(process);
        self.step(
            u64::from(size) * costs.load_per_mb,
            &format!("loading program {program} into partition {new_partition}"),
        );
        self.step(
            costs.mark_partition,
            &format!("marking partition {new_partition} as occupied"),
        );
        self.step(costs.update_pcb, "updating PCB with new information");

        replace_image(process, program, size, Some(new_partition));
        self.directory.upsert(process.clone());
        self.execution.end_group();
        self.status
            .block(self.directory.render_snapshot(self.clock.now(), raw));

        match self.traces.load(program) {
            Ok(sub_trace) => {
                self.run_slice(&sub_trace, process);
                true
            }
            Err(err) => {
                self.diagnostics
                    .push(format!("EXEC: {err}; continuing with current trace"));
                false
            }
        }
    }

    /// Run the dispatch model and fold its text and end time back in.
    fn enter_kernel(&mut self, vector: usize) {
        let (text, end) = dispatch(
            self.clock.now(),
            vector,
            self.cfg.costs.context_save,
            self.devices.vectors(),
            &self.cfg.costs,
        );
        self.execution.append(&text);
        self.clock.advance_to(end);
    }

    /// Append one timed step and advance the clock by its cost.
    fn step(&mut self, cost: u64, description: &str) {
        self.execution.step(self.clock.now(), cost, description);
        self.clock.advance(cost);
    }

    fn vector_available(&mut self, vector: usize, what: &str) -> bool {
        if vector < self.devices.vectors().len() {
            true
        } else {
            self.diagnostics.push(format!(
                "{what}: vector {vector} not in vector table, activity skipped"
            ));
            false
        }
    }

    fn next_pid(&mut self) -> u32 {
        let pid = self.pid_counter;
        self.pid_counter += 1;
        pid
    }
}

/// Extract the child's conditional block after a FORK.
///
/// Scans forward from the fork for the first `IF_CHILD`, then collects
/// lines with a nesting depth counter until the `IF_PARENT` that closes
/// the block. Nested `IF_CHILD`/`IF_PARENT` pairs are retained in the
/// slice so a nested FORK can re-split them; `ENDIF` lines are retained
/// as no-ops. An `EXEC` at depth 0 ends the block (inclusive), since it
/// permanently replaces the child's instruction stream.
///
/// Returns the child slice and the cursor position where the parent
/// resumes.
fn split_child_block(trace: &[TraceLine], fork_at: usize) -> (Vec<TraceLine>, usize) {
    let mut j = fork_at + 1;
    while j < trace.len() && !matches!(trace[j].activity, Activity::IfChild) {
        j += 1;
    }
    if j == trace.len() {
        // No conditional block: the child runs nothing and the parent
        // continues with the line after the fork.
        return (Vec::new(), fork_at + 1);
    }

    let mut block = Vec::new();
    let mut depth = 0usize;
    let mut k = j + 1;
    while k < trace.len() {
        match &trace[k].activity {
            Activity::IfChild => {
                depth += 1;
                block.push(trace[k].clone());
            }
            Activity::IfParent if depth == 0 => {
                return (block, k + 1);
            }
            Activity::IfParent => {
                depth -= 1;
                block.push(trace[k].clone());
            }
            Activity::Exec { .. } if depth == 0 => {
                block.push(trace[k].clone());
                return (block, resume_after_if_parent(trace, k + 1));
            }
            _ => block.push(trace[k].clone()),
        }
        k += 1;
    }
    (block, trace.len())
}

/// Position just past the next depth-0 `IF_PARENT`, or end of trace.
fn resume_after_if_parent(trace: &[TraceLine], from: usize) -> usize {
    let mut depth = 0usize;
    let mut m = from;
    while m < trace.len() {
        match &trace[m].activity {
            Activity::IfChild => depth += 1,
            Activity::IfParent if depth == 0 => return m + 1,
            Activity::IfParent => depth -= 1,
            _ => {}
        }
        m += 1;
    }
    trace.len()
}
