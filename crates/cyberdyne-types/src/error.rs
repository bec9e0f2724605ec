//! Error types for the Cyberdyne market.
//!
//! Only structural failures are errors. Business-logic outcomes (an
//! unauthorised heap mutation, an order that cannot be admitted, a
//! transfer the payer cannot afford) are reported through return values.
//!
//! All errors use the `CD_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order / key codec errors
//! - 2xx: Ledger errors
//! - 4xx: Market lifecycle errors
//! - 5xx: Matching errors
//! - 8xx: Invariant errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, Side};

/// Central error enum for all Cyberdyne operations.
#[derive(Debug, Error)]
pub enum CyberdyneError {
    // =================================================================
    // Order / Codec Errors (1xx)
    // =================================================================
    /// A price does not fit the 48-bit price field.
    #[error("CD_ERR_100: Price {price} does not fit the 48-bit price field")]
    PriceOutOfRange { price: u64 },

    /// A quantity does not fit the 48-bit quantity field.
    #[error("CD_ERR_101: Quantity {quantity} does not fit the 48-bit quantity field")]
    QuantityOutOfRange { quantity: u128 },

    /// A key pulled from a heap does not describe a live order.
    #[error("CD_ERR_102: Malformed {side} key: {reason}")]
    MalformedKey { side: Side, reason: String },

    // =================================================================
    // Ledger Errors (2xx)
    // =================================================================
    /// The market's escrow on a ledger cannot cover a payout.
    #[error("CD_ERR_200: Insufficient escrow on ledger {ledger}: need {needed}, have {available}")]
    InsufficientEscrow {
        ledger: Address,
        needed: u128,
        available: u128,
    },

    /// A ledger refused a transfer the market had already checked it could make.
    #[error("CD_ERR_201: Transfer of {amount} to {to} rejected by ledger {ledger}")]
    TransferRejected {
        ledger: Address,
        to: Address,
        amount: u128,
    },

    /// The ledger passed to a call is not the one bound at initialisation.
    #[error("CD_ERR_202: Ledger mismatch: expected {expected}, got {actual}")]
    LedgerMismatch { expected: Address, actual: Address },

    // =================================================================
    // Market Lifecycle Errors (4xx)
    // =================================================================
    /// `init` was called on a market that is already initialised.
    #[error("CD_ERR_400: Market already initialised")]
    AlreadyInitialized,

    /// An operation needs an initialised market.
    #[error("CD_ERR_401: Market not initialised")]
    NotInitialized,

    /// The market could not take ownership of a heap.
    #[error("CD_ERR_402: Heap is owned by {owner}, market {market} cannot take it over")]
    HeapNotOwned { owner: Address, market: Address },

    /// The same heap instance was supplied for both sides.
    #[error("CD_ERR_403: Buy and sell heaps must be distinct")]
    SharedHeap,

    // =================================================================
    // Matching Errors (5xx)
    // =================================================================
    /// Settlement was requested for a pair that does not cross.
    #[error("CD_ERR_500: Orders do not cross: bid {bid_price} < ask {ask_price}")]
    NotCrossing { bid_price: u64, ask_price: u64 },

    // =================================================================
    // Invariant Errors (8xx)
    // =================================================================
    /// A heap no longer satisfies the min-heap property.
    #[error("CD_ERR_800: Heap invariant violated at index {index}")]
    HeapInvariantViolation { index: usize },

    /// Resting orders claim more escrow than the market holds.
    #[error("CD_ERR_801: Escrow invariant violation: {reason}")]
    EscrowInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("CD_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("CD_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid values, unreadable config, etc.).
    #[error("CD_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CyberdyneError>;

impl From<serde_json::Error> for CyberdyneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
