//! Escrow invariant checker.
//!
//! Invariant enforced after every tick, per ledger:
//! ```text
//! balance_of(market) >= Σ quantity of resting orders funded on that ledger
//! ```
//!
//! Bids are escrowed in currency-1, asks in currency-2. Anything above the
//! committed amount is surplus: rounding leftovers from settlement and
//! deposits nobody has claimed yet.

use cyberdyne_matchcore::PriorityHeap;
use cyberdyne_types::{Address, CyberdyneError, Order, Result, Side};
use serde::{Deserialize, Serialize};

/// What the market holds on one ledger against what it owes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowPosition {
    pub ledger: Address,
    /// Sum of resting order quantities funded on this ledger.
    pub committed: u128,
    /// The market's balance on this ledger.
    pub held: u128,
}

impl EscrowPosition {
    #[must_use]
    pub fn surplus(&self) -> u128 {
        self.held.saturating_sub(self.committed)
    }

    /// # Errors
    /// Returns [`CyberdyneError::EscrowInvariantViolation`] if held < committed.
    pub fn verify(&self) -> Result<()> {
        if self.held < self.committed {
            return Err(CyberdyneError::EscrowInvariantViolation {
                reason: format!(
                    "ledger {}: market holds {} but resting orders commit {}",
                    self.ledger, self.held, self.committed
                ),
            });
        }
        Ok(())
    }
}

/// Total quantity escrowed by the orders resting in `heap`.
#[must_use]
pub fn committed_escrow(heap: &PriorityHeap, side: Side) -> u128 {
    heap.keys()
        .map(|key| u128::from(Order::from_key(side, *key).quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(committed: u128, held: u128) -> EscrowPosition {
        EscrowPosition {
            ledger: Address::from_low_u64(0xc1),
            committed,
            held,
        }
    }

    #[test]
    fn covered_position_passes() {
        assert!(position(917, 917).verify().is_ok());
        assert_eq!(position(917, 917).surplus(), 0);
        assert_eq!(position(0, 453).surplus(), 453);
    }

    #[test]
    fn shortfall_fails() {
        let err = position(1000, 999).verify().unwrap_err();
        assert!(matches!(err, CyberdyneError::EscrowInvariantViolation { .. }));
        assert_eq!(position(1000, 999).surplus(), 0);
    }

    #[test]
    fn committed_escrow_sums_resting_quantities() {
        let owner = Address::from_low_u64(0x4d);
        let mut heap = PriorityHeap::new(Address::from_low_u64(0xb1), owner);
        for (price, qty, who) in [(1200, 1000, 1), (1400, 250, 2)] {
            let order = Order::new(Side::Buy, price, qty, Address::from_low_u64(who)).unwrap();
            heap.push(owner, order.key());
        }
        assert_eq!(committed_escrow(&heap, Side::Buy), 1250);
    }

    #[test]
    fn empty_heap_commits_nothing() {
        let heap = PriorityHeap::new(Address::from_low_u64(0x51), Address::from_low_u64(0x4d));
        assert_eq!(committed_escrow(&heap, Side::Sell), 0);
    }
}
