//! # cyberdyne-ledger
//!
//! **Ledger boundary**: everything the market knows about the two token
//! ledgers it trades between.
//!
//! ## Architecture
//!
//! 1. **Ledger**: the trait a token contract exposes to the market
//!    (`transfer`, `balance_of`, `last_transfer`)
//! 2. **Subcurrency**: an in-memory reference token with an issuer
//! 3. **DepositClaims**: turns "the caller just paid the market" into an
//!    order quantity, at most once per transfer
//!
//! ## Deposit Flow
//!
//! ```text
//! trader → Ledger.transfer(trader, market, q) → Market.buy(ledger, trader, price)
//!        → DepositClaims.claim() → q becomes the order quantity
//! ```

pub mod claims;
pub mod ledger;
pub mod subcurrency;

pub use claims::{Claim, DepositClaims};
pub use ledger::{Ledger, TransferRecord};
pub use subcurrency::Subcurrency;
