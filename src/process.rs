//! Process control blocks and the ordered process directory.
//!
//! The directory doubles as the wait queue: entry order records who waits
//! behind whom (a forked child is inserted ahead of its re-enqueued
//! parent), and the same collection is rendered into status snapshots.
//! It is never consulted for control decisions.
//!
//! Invariants:
//! - No two entries share a pid after any mutation completes; exec and
//!   fork replace entries via [`ProcessDirectory::upsert`], never append
//!   duplicates.
//! - Pids are assigned monotonically and never reused, including pids
//!   consumed by a fork whose allocation was denied.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Process control block.
///
/// `parent` is `None` for the root process and `partition` is `None` while
/// no memory is assigned; both render as `-1` in snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pcb {
    pub pid: u32,
    pub parent: Option<u32>,
    pub program: String,
    /// Declared memory requirement in Mb.
    pub size_mb: u32,
    /// Index into the partition table, once allocated.
    pub partition: Option<usize>,
}

impl Pcb {
    /// The root process booted before the first trace line.
    pub fn root(program: &str, size_mb: u32) -> Self {
        Self {
            pid: 0,
            parent: None,
            program: program.to_string(),
            size_mb,
            partition: None,
        }
    }
}

/// Build a child PCB for a fork.
///
/// The child inherits the parent's program name and size. The partition is
/// always unassigned: the child must allocate before it can run, and
/// inheriting the parent's index would alias an occupied partition.
pub fn spawn_child(parent: &Pcb, pid: u32) -> Pcb {
    Pcb {
        pid,
        parent: Some(parent.pid),
        program: parent.program.clone(),
        size_mb: parent.size_mb,
        partition: None,
    }
}

/// Rewrite a PCB's identity fields for exec. The pid never changes.
pub fn replace_image(pcb: &mut Pcb, program: &str, size_mb: u32, partition: Option<usize>) {
    pcb.program = program.to_string();
    pcb.size_mb = size_mb;
    pcb.partition = partition;
}

/// Ordered directory of all processes known to the simulator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDirectory {
    entries: Vec<Pcb>,
}

impl ProcessDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the back, removing any prior entry with the same pid.
    pub fn upsert(&mut self, pcb: Pcb) {
        self.entries.retain(|e| e.pid != pcb.pid);
        self.entries.push(pcb);
    }

    #[inline(always)]
    pub fn entries(&self) -> &[Pcb] {
        &self.entries
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render a status block: a header naming the time and the raw trace
    /// line that triggered the snapshot, then one line per entry in queue
    /// order.
    pub fn render_snapshot(&self, at_time: u64, trigger: &str) -> String {
        let mut block = format!("time: {at_time}; current trace: {trigger}\n");
        for e in &self.entries {
            let parent = e.parent.map_or(-1, |p| p as i64);
            let partition = e.partition.map_or(-1, |p| p as i64);
            let _ = writeln!(
                block,
                "PID: {}, Program: {}, Parent: {}, Size: {} Mb, Partition: {}",
                e.pid, e.program, parent, e.size_mb, partition
            );
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_child_inherits_image_but_not_partition() {
        let mut parent = Pcb::root("init", 1);
        parent.partition = Some(0);
        let child = spawn_child(&parent, 1);
        assert_eq!(child.pid, 1);
        assert_eq!(child.parent, Some(0));
        assert_eq!(child.program, "init");
        assert_eq!(child.size_mb, 1);
        assert_eq!(child.partition, None);
    }

    #[test]
    fn replace_image_keeps_pid() {
        let mut pcb = Pcb::root("init", 1);
        replace_image(&mut pcb, "progB", 8, Some(3));
        assert_eq!(pcb.pid, 0);
        assert_eq!(pcb.program, "progB");
        assert_eq!(pcb.size_mb, 8);
        assert_eq!(pcb.partition, Some(3));
    }

    #[test]
    fn upsert_replaces_same_pid() {
        let mut dir = ProcessDirectory::new();
        dir.upsert(Pcb::root("init", 1));
        dir.upsert(spawn_child(&Pcb::root("init", 1), 1));
        let mut replaced = Pcb::root("progA", 3);
        replaced.partition = Some(1);
        dir.upsert(replaced);
        assert_eq!(dir.len(), 2);
        // pid 0 moved to the back, image replaced.
        assert_eq!(dir.entries()[1].pid, 0);
        assert_eq!(dir.entries()[1].program, "progA");
        let pids: Vec<_> = dir.entries().iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![1, 0]);
    }

    #[test]
    fn snapshot_renders_minus_one_sentinels() {
        let mut dir = ProcessDirectory::new();
        dir.upsert(Pcb::root("init", 1));
        let block = dir.render_snapshot(141, "FORK, 5");
        assert_eq!(
            block,
            "time: 141; current trace: FORK, 5\n\
             PID: 0, Program: init, Parent: -1, Size: 1 Mb, Partition: -1\n"
        );
    }
}
