//! Reference subcurrency ledger.
//!
//! A plain issuer-controlled token: the creator is the issuer and the only
//! address allowed to mint. Every `send` is recorded, successful or not, so
//! the most recent attempt can be inspected with [`Subcurrency::last_tx`].
//! All mutations are atomic: either the full transfer happens or no balance
//! changes.

use std::collections::HashMap;

use cyberdyne_types::Address;
use serde::{Deserialize, Serialize};

use crate::ledger::{Ledger, TransferRecord};

/// In-memory token with per-address balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subcurrency {
    address: Address,
    issuer: Address,
    balances: HashMap<Address, u128>,
    /// Most recent `send`, successful or not.
    last_attempt: Option<TransferRecord>,
    /// Most recent successful `send`.
    last_success: Option<TransferRecord>,
    next_seq: u64,
}

impl Subcurrency {
    /// Create an empty ledger at `address`, issued by `issuer`.
    #[must_use]
    pub fn new(address: Address, issuer: Address) -> Self {
        Self {
            address,
            issuer,
            balances: HashMap::new(),
            last_attempt: None,
            last_success: None,
            next_seq: 1,
        }
    }

    #[must_use]
    pub fn issuer(&self) -> Address {
        self.issuer
    }

    /// Mint `amount` to `to`. Only the issuer may mint; anyone else gets
    /// `false` and nothing changes.
    pub fn issue(&mut self, caller: Address, to: Address, amount: u128) -> bool {
        if caller != self.issuer {
            tracing::warn!(
                ledger = %self.address,
                caller = %caller,
                "issue by non-issuer ignored"
            );
            return false;
        }
        let Some(credited) = self.balance(to).checked_add(amount) else {
            return false;
        };
        self.balances.insert(to, credited);
        true
    }

    /// Send `amount` from `caller` to `to`.
    ///
    /// Fails for a zero amount or when `caller` cannot cover it. The attempt
    /// is recorded either way.
    pub fn send(&mut self, caller: Address, to: Address, amount: u128) -> bool {
        let available = self.balance(caller);
        let success = amount > 0
            && available >= amount
            && (caller == to || self.balance(to).checked_add(amount).is_some());

        if success && caller != to {
            self.balances.insert(caller, available - amount);
            let credited = self.balance(to) + amount;
            self.balances.insert(to, credited);
        }

        let record = TransferRecord {
            seq: self.next_seq,
            from: caller,
            to,
            amount,
            success,
        };
        self.next_seq += 1;
        self.last_attempt = Some(record);
        if success {
            self.last_success = Some(record);
        }

        tracing::debug!(
            ledger = %self.address,
            seq = record.seq,
            from = %caller,
            to = %to,
            amount,
            success,
            "send"
        );
        success
    }

    /// Balance of `owner`; unknown addresses hold zero.
    #[must_use]
    pub fn balance(&self, owner: Address) -> u128 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    /// The most recent `send`, including failed ones.
    #[must_use]
    pub fn last_tx(&self) -> Option<TransferRecord> {
        self.last_attempt
    }

    /// Sum of all balances.
    #[must_use]
    pub fn total_supply(&self) -> u128 {
        self.balances.values().sum()
    }
}

impl Ledger for Subcurrency {
    fn address(&self) -> Address {
        self.address
    }

    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> bool {
        self.send(from, to, amount)
    }

    fn balance_of(&self, owner: Address) -> u128 {
        self.balance(owner)
    }

    fn last_transfer(&self) -> Option<TransferRecord> {
        self.last_success
    }
}
