//! Monotonic simulated clock for deterministic replay.
//!
//! The clock is an integer millisecond counter that only advances when the
//! interpreter explicitly moves time forward by a step's declared cost.
//! Nothing in the crate reads wall-clock time.

/// Millisecond-resolution simulated clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimClock {
    now_ms: u64,
}

impl SimClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self { now_ms: 0 }
    }

    /// Current simulation time in milliseconds.
    #[inline(always)]
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Advance by a step cost, saturating on overflow.
    #[inline(always)]
    pub fn advance(&mut self, cost_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(cost_ms);
    }

    /// Jump to an absolute time returned by a collaborator.
    ///
    /// The target must not be in the past; monotonicity is a crate-wide
    /// invariant.
    #[inline(always)]
    pub fn advance_to(&mut self, t_ms: u64) {
        debug_assert!(t_ms >= self.now_ms);
        self.now_ms = t_ms;
    }
}
