//! Fixed-partition memory table and first-fit allocator.
//!
//! The table is a fixed, ordered sequence of partitions created before the
//! simulation starts. Allocation is first-fit by table order: the lowest
//! indexed free partition whose capacity covers the request wins. This
//! policy is part of the deterministic output contract and must not be
//! replaced with best-fit.
//!
//! Invariants:
//! - Occupancy is exclusive: a partition holds at most one pid.
//! - A PCB's partition index, once set, names a partition occupied by that
//!   same pid; [`PartitionTable::free`] clears both sides together.

use serde::{Deserialize, Serialize};

use crate::process::Pcb;

/// Default partition layout in Mb.
pub const DEFAULT_PARTITIONS: [u32; 6] = [40, 25, 15, 10, 8, 2];

/// One fixed-capacity memory partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Capacity in Mb.
    pub capacity: u32,
    /// Occupying pid, or `None` when free.
    pub occupant: Option<u32>,
}

/// Ordered table of fixed partitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTable {
    partitions: Vec<Partition>,
}

impl Default for PartitionTable {
    fn default() -> Self {
        Self::new(&DEFAULT_PARTITIONS)
    }
}

impl PartitionTable {
    pub fn new(capacities: &[u32]) -> Self {
        Self {
            partitions: capacities
                .iter()
                .map(|&capacity| Partition {
                    capacity,
                    occupant: None,
                })
                .collect(),
        }
    }

    /// First-fit allocation for `pcb.size_mb`.
    ///
    /// On success the partition records the pid, the PCB records the
    /// partition index, and `true` is returned. On denial the PCB is left
    /// unassigned and `false` is returned; denial is not fatal, callers
    /// log and skip the dependent activity.
    pub fn allocate(&mut self, pcb: &mut Pcb) -> bool {
        let slot = self
            .partitions
            .iter()
            .position(|p| p.occupant.is_none() && p.capacity >= pcb.size_mb);
        match slot {
            Some(idx) => {
                self.partitions[idx].occupant = Some(pcb.pid);
                pcb.partition = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Release the PCB's partition. Idempotent when already unassigned.
    pub fn free(&mut self, pcb: &mut Pcb) {
        if let Some(idx) = pcb.partition.take() {
            self.release(idx);
        }
    }

    /// Mark a partition free by index. Out-of-range indices are ignored.
    fn release(&mut self, idx: usize) {
        if let Some(partition) = self.partitions.get_mut(idx) {
            partition.occupant = None;
        }
    }

    /// Partition states in table order.
    #[inline(always)]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcb(pid: u32, size_mb: u32) -> Pcb {
        Pcb {
            pid,
            parent: None,
            program: "test".to_string(),
            size_mb,
            partition: None,
        }
    }

    #[test]
    fn first_fit_prefers_lowest_index() {
        let mut table = PartitionTable::default();
        let mut small = pcb(7, 1);
        assert!(table.allocate(&mut small));
        // Size 1 fits everywhere; first-fit lands in partition 0, not the
        // snug 2 Mb partition a best-fit policy would pick.
        assert_eq!(small.partition, Some(0));
        assert_eq!(table.partitions()[0].occupant, Some(7));
    }

    #[test]
    fn skips_occupied_and_undersized_partitions() {
        let mut table = PartitionTable::default();
        let mut a = pcb(1, 30);
        let mut b = pcb(2, 30);
        assert!(table.allocate(&mut a));
        assert_eq!(a.partition, Some(0));
        // 30 Mb no longer fits anywhere once partition 0 is taken.
        assert!(!table.allocate(&mut b));
        assert_eq!(b.partition, None);
    }

    #[test]
    fn denial_leaves_pcb_unassigned() {
        let mut table = PartitionTable::new(&[8, 2]);
        let mut big = pcb(1, 99);
        assert!(!table.allocate(&mut big));
        assert_eq!(big.partition, None);
        assert!(table.partitions().iter().all(|p| p.occupant.is_none()));
    }

    #[test]
    fn free_is_idempotent() {
        let mut table = PartitionTable::default();
        let mut p = pcb(3, 10);
        assert!(table.allocate(&mut p));
        table.free(&mut p);
        assert_eq!(p.partition, None);
        table.free(&mut p); // no-op
        assert!(table.partitions().iter().all(|part| part.occupant.is_none()));
    }

    #[test]
    fn occupancy_is_exclusive() {
        let mut table = PartitionTable::new(&[10, 10]);
        let mut a = pcb(1, 10);
        let mut b = pcb(2, 10);
        assert!(table.allocate(&mut a));
        assert!(table.allocate(&mut b));
        assert_ne!(a.partition, b.partition);
        let occupants: Vec<_> = table.partitions().iter().map(|p| p.occupant).collect();
        assert_eq!(occupants, vec![Some(1), Some(2)]);
    }
}
