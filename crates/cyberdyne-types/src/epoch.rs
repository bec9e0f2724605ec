//! Clearing-call types: the per-call budget and the report a tick returns.
//!
//! A market clears in epochs counted from its anchor height. Clearing is
//! resumable: each `tick` runs under a [`TickBudget`] and stops early when
//! the budget is spent, leaving the rest of the crossing book for the next
//! call. The returned [`TickReport`] says whether work remains.

use serde::{Deserialize, Serialize};

use crate::{EpochId, Fill};

/// Execution-cost ceiling for a single clearing call, counted in matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickBudget {
    remaining: u32,
}

impl TickBudget {
    #[must_use]
    pub fn new(matches: u32) -> Self {
        Self { remaining: matches }
    }

    /// A budget that never runs out in practice.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            remaining: u32::MAX,
        }
    }

    /// Spend one match. Returns `false` (and spends nothing) when exhausted.
    pub fn try_charge(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Outcome of one `tick` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    /// Epoch the call ran in.
    pub epoch: EpochId,
    /// `false` when the call was made before the first epoch boundary.
    pub gate_open: bool,
    /// Fills settled by this call, in priority order.
    pub fills: Vec<Fill>,
    /// Currency-1 paid to sellers by this call.
    pub volume: u64,
    /// The budget ran out while the book still crossed.
    pub more_work: bool,
    /// SHA-256 commitment over `fills`.
    pub fill_root: [u8; 32],
}

impl TickReport {
    /// Report for a call that did nothing.
    #[must_use]
    pub fn idle(epoch: EpochId, gate_open: bool, fill_root: [u8; 32]) -> Self {
        Self {
            epoch,
            gate_open,
            fills: Vec::new(),
            volume: 0,
            more_work: false,
            fill_root,
        }
    }

    /// Number of matches settled.
    #[must_use]
    pub fn matches(&self) -> usize {
        self.fills.len()
    }

    /// Non-zero indicator of the clearing contract: did anything match?
    #[must_use]
    pub fn any_match(&self) -> bool {
        !self.fills.is_empty()
    }
}
