//! Fill records produced by the pairwise settlement rule.
//!
//! A [`Fill`] is the immutable record of one bid/ask match: what each side
//! is paid out of the market's escrow, what is left resting, and what the
//! market keeps when both orders close with escrow to spare.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Address;

/// Which resting orders a fill closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillOutcome {
    /// The bid's whole escrow was spent; the ask keeps resting with a residual.
    BidFilled,
    /// The ask's whole escrow was spent; the bid keeps resting with a residual.
    AskFilled,
    /// Both orders close; unspent escrow stays with the market.
    BothFilled,
}

impl fmt::Display for FillOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BidFilled => write!(f, "BID_FILLED"),
            Self::AskFilled => write!(f, "ASK_FILLED"),
            Self::BothFilled => write!(f, "BOTH_FILLED"),
        }
    }
}

/// One settled bid/ask pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub outcome: FillOutcome,
    pub buyer: Address,
    pub seller: Address,
    /// The bid's limit price.
    pub bid_price: u64,
    /// The ask's limit price.
    pub ask_price: u64,
    /// Currency-1 paid to the seller.
    pub to_seller: u64,
    /// Currency-2 paid to the buyer.
    pub to_buyer: u64,
    /// Escrow left on the bid after the fill (0 when the bid closes).
    pub bid_residual: u64,
    /// Escrow left on the ask after the fill (0 when the ask closes).
    pub ask_residual: u64,
    /// Currency-1 released from the bid but paid to nobody.
    pub retained_first: u64,
    /// Currency-2 released from the ask but paid to nobody.
    pub retained_second: u64,
}

impl Fill {
    /// Whether the bid keeps resting after this fill.
    #[must_use]
    pub fn bid_rests(&self) -> bool {
        self.bid_residual > 0
    }

    /// Whether the ask keeps resting after this fill.
    #[must_use]
    pub fn ask_rests(&self) -> bool {
        self.ask_residual > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(outcome: FillOutcome, bid_residual: u64, ask_residual: u64) -> Fill {
        Fill {
            outcome,
            buyer: Address::from_low_u64(1),
            seller: Address::from_low_u64(2),
            bid_price: 1200,
            ask_price: 800,
            to_seller: 83,
            to_buyer: 100_000,
            bid_residual,
            ask_residual,
            retained_first: 0,
            retained_second: 0,
        }
    }

    #[test]
    fn resting_flags_follow_residuals() {
        let f = fill(FillOutcome::AskFilled, 917, 0);
        assert!(f.bid_rests());
        assert!(!f.ask_rests());

        let f = fill(FillOutcome::BothFilled, 0, 0);
        assert!(!f.bid_rests());
        assert!(!f.ask_rests());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(format!("{}", FillOutcome::BidFilled), "BID_FILLED");
        assert_eq!(format!("{}", FillOutcome::AskFilled), "ASK_FILLED");
        assert_eq!(format!("{}", FillOutcome::BothFilled), "BOTH_FILLED");
    }

    #[test]
    fn fill_serde_roundtrip() {
        let f = fill(FillOutcome::AskFilled, 917, 0);
        let json = serde_json::to_string(&f).unwrap();
        let back: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
