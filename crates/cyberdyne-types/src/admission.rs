//! Order admission outcomes.
//!
//! Admission failures are business outcomes, not errors: the call returns
//! normally, nothing is pushed, and the reason says why.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Order, U256};

/// Why an order was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// The ledger has no recorded transfer at all.
    NoDeposit,
    /// The most recent transfer on the ledger did not go through.
    DepositFailed,
    /// The most recent transfer was made by someone else.
    DepositFromOther,
    /// The most recent transfer did not pay the market.
    DepositToOther,
    /// The most recent transfer already funds an order.
    AlreadyClaimed,
    /// Zero price, or a price that does not fit the 48-bit field.
    InvalidPrice,
    /// The deposit does not fit the 48-bit quantity field.
    QuantityOutOfRange,
    /// The zero address cannot own an order.
    ZeroTrader,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDeposit => write!(f, "NO_DEPOSIT"),
            Self::DepositFailed => write!(f, "DEPOSIT_FAILED"),
            Self::DepositFromOther => write!(f, "DEPOSIT_FROM_OTHER"),
            Self::DepositToOther => write!(f, "DEPOSIT_TO_OTHER"),
            Self::AlreadyClaimed => write!(f, "ALREADY_CLAIMED"),
            Self::InvalidPrice => write!(f, "INVALID_PRICE"),
            Self::QuantityOutOfRange => write!(f, "QUANTITY_OUT_OF_RANGE"),
            Self::ZeroTrader => write!(f, "ZERO_TRADER"),
        }
    }
}

/// Result of a `buy` / `sell` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Admission {
    /// The order now rests in its heap under `key`.
    Accepted { order: Order, key: U256 },
    /// Nothing was pushed.
    Rejected(RejectReason),
}

impl Admission {
    /// The success indicator of the admission contract.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    #[must_use]
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Accepted { order, .. } => Some(order),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Address, Side};

    #[test]
    fn accepted_exposes_order() {
        let order = Order::new(Side::Buy, 1200, 1000, Address::from_low_u64(1)).unwrap();
        let admission = Admission::Accepted {
            order,
            key: order.key(),
        };
        assert!(admission.is_accepted());
        assert_eq!(admission.order(), Some(&order));
        assert_eq!(admission.reject_reason(), None);
    }

    #[test]
    fn rejected_exposes_reason() {
        let admission = Admission::Rejected(RejectReason::AlreadyClaimed);
        assert!(!admission.is_accepted());
        assert!(admission.order().is_none());
        assert_eq!(admission.reject_reason(), Some(RejectReason::AlreadyClaimed));
        assert_eq!(format!("{}", RejectReason::AlreadyClaimed), "ALREADY_CLAIMED");
    }
}
