//! # cyberdyne-market
//!
//! **Market plane**: the periodic double auction itself.
//!
//! ## Architecture
//!
//! A [`Market`] owns two [`PriorityHeap`](cyberdyne_matchcore::PriorityHeap)s
//! and trades between two [`Ledger`](cyberdyne_ledger::Ledger)s:
//! 1. **Admission**: `buy` / `sell` turn the caller's deposit into a resting
//!    order
//! 2. **Clearing**: `tick` matches crossing orders once an epoch boundary
//!    has passed, under a per-call budget
//! 3. **Settlement**: payouts move from the market's ledger accounts to the
//!    traders
//! 4. **Audit**: the escrow the market holds must cover every resting order
//!
//! ## Clearing Flow
//!
//! ```text
//! tick(height) → epoch gate → clear_book() on copies → escrow pre-check
//!     → ledger transfers → commit heaps + volume → fill_root → escrow audit
//! ```

pub mod escrow_audit;
pub mod market;

pub use escrow_audit::{EscrowPosition, committed_escrow};
pub use market::Market;
