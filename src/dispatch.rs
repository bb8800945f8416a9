//! Interrupt dispatch timing model.
//!
//! Every interrupt-like activity (SYSCALL, END_IO, and the synthetic fork
//! and exec vectors) enters the kernel through the same fixed sequence of
//! timed steps: switch to kernel mode, find the device's vector table
//! entry, load the ISR address into the PC, save context. The model is a
//! pure function of its inputs; all shared state stays with the caller.

use crate::config::Costs;

/// Width in bytes of one vector table entry; the entry for device `n`
/// lives at memory position `n * VECTOR_ENTRY_BYTES`.
pub const VECTOR_ENTRY_BYTES: usize = 2;

/// Emit the kernel-entry steps for `device` starting at `time`.
///
/// Returns the accumulated log text (one `"<time>, <cost>, <description>"`
/// line per step) and the advanced time.
///
/// `device` must index into `vectors`; callers validate before dispatching
/// (out-of-range devices take the log-and-skip path instead).
pub fn dispatch(
    time: u64,
    device: usize,
    context_cost: u64,
    vectors: &[String],
    costs: &Costs,
) -> (String, u64) {
    let mut text = String::new();
    let mut now = time;

    let mut step = |now: &mut u64, cost: u64, description: String| {
        text.push_str(&format!("{now}, {cost}, {description}\n"));
        *now = now.saturating_add(cost);
    };

    step(&mut now, costs.switch_mode, "switch to kernel mode".to_string());
    step(
        &mut now,
        costs.vector_lookup,
        format!(
            "find vector {device} in memory position 0x{:04X}",
            device * VECTOR_ENTRY_BYTES
        ),
    );
    step(
        &mut now,
        costs.load_isr,
        format!("load address {} into the PC", vectors[device]),
    );
    step(&mut now, context_cost, "save context".to_string());

    (text, now)
}
