//! The token ledger interface the market settles against.

use cyberdyne_types::Address;
use serde::{Deserialize, Serialize};

/// One transfer as recorded by a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Monotone per ledger; identifies the transfer for deposit claims.
    pub seq: u64,
    pub from: Address,
    pub to: Address,
    pub amount: u128,
    pub success: bool,
}

/// A fungible token ledger.
///
/// The market never holds a ledger; callers pass `&mut` access into each
/// operation that needs it, and the market checks [`Ledger::address`]
/// against the identity it stored at `init`.
pub trait Ledger {
    /// Identity of this ledger.
    fn address(&self) -> Address;

    /// Move `amount` from `from` to `to`. Returns `false` and changes
    /// nothing when the transfer cannot be made.
    fn transfer(&mut self, from: Address, to: Address, amount: u128) -> bool;

    /// Current balance of `owner`.
    fn balance_of(&self, owner: Address) -> u128;

    /// The most recent successful transfer, if any.
    fn last_transfer(&self) -> Option<TransferRecord>;
}
