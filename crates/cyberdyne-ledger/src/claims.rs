//! Deposit claims: push-then-notify escrow.
//!
//! A trader first transfers tokens to the market on a ledger, then calls
//! `buy` / `sell`. The market reads the ledger's most recent successful
//! transfer and, if it is the caller's payment to the market, uses its
//! amount as the order quantity. Each transfer funds at most one order:
//! sequence numbers are monotone per ledger, so remembering the highest
//! claimed sequence per ledger is enough.

use std::collections::HashMap;

use cyberdyne_types::{Address, RejectReason, constants::FIELD_LIMIT};
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;

/// A deposit that has been bound to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub seq: u64,
    pub quantity: u64,
}

/// Highest claimed transfer sequence, per ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositClaims {
    claimed: HashMap<Address, u64>,
}

impl DepositClaims {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the ledger's last transfer without claiming it.
    pub fn inspect<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        depositor: Address,
        recipient: Address,
    ) -> Result<Claim, RejectReason> {
        let record = ledger.last_transfer().ok_or(RejectReason::NoDeposit)?;
        if !record.success {
            return Err(RejectReason::DepositFailed);
        }
        if record.from != depositor {
            return Err(RejectReason::DepositFromOther);
        }
        if record.to != recipient {
            return Err(RejectReason::DepositToOther);
        }
        if self
            .claimed
            .get(&ledger.address())
            .is_some_and(|&seq| record.seq <= seq)
        {
            return Err(RejectReason::AlreadyClaimed);
        }
        let quantity = u64::try_from(record.amount)
            .ok()
            .filter(|&q| q > 0 && q < FIELD_LIMIT)
            .ok_or(RejectReason::QuantityOutOfRange)?;
        Ok(Claim {
            seq: record.seq,
            quantity,
        })
    }

    /// Bind the ledger's last transfer to an order.
    ///
    /// Nothing is recorded when the deposit is rejected.
    pub fn claim<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        depositor: Address,
        recipient: Address,
    ) -> Result<Claim, RejectReason> {
        let claim = self.inspect(ledger, depositor, recipient)?;
        self.claimed.insert(ledger.address(), claim.seq);
        Ok(claim)
    }

    /// Mark the ledger's latest transfer as used without binding it to an
    /// order. Every earlier transfer on the ledger becomes unclaimable too.
    pub fn retire_latest<L: Ledger + ?Sized>(&mut self, ledger: &L) {
        if let Some(record) = ledger.last_transfer() {
            let entry = self.claimed.entry(ledger.address()).or_insert(0);
            *entry = (*entry).max(record.seq);
        }
    }

    /// Highest sequence claimed on `ledger`, if any.
    #[must_use]
    pub fn last_claimed(&self, ledger: Address) -> Option<u64> {
        self.claimed.get(&ledger).copied()
    }
}
