//! Pairwise settlement rule for a crossing bid/ask pair.
//!
//! Given best bid `(Pb, Cb)` and best ask `(Ps, Cs)` with `Pb >= Ps`, where
//! `Cb` is currency-1 escrowed by the buyer and `Cs` is currency-2 escrowed
//! by the seller:
//!
//! ```text
//! required    = floor(Cs / Pb)   currency-1 the whole ask costs at the bid price
//! deliverable = Cb * Ps          currency-2 the whole bid buys at the ask price
//!
//! required > Cb            BID_FILLED   buyer <- deliverable, seller <- Cb,
//!                                       ask rests with Cs - deliverable
//! deliverable > Cs         ASK_FILLED   seller <- required, buyer <- Cs,
//!                                       bid rests with Cb - required
//! otherwise                BOTH_FILLED  seller <- required, buyer <- deliverable,
//!                                       both close, the rest stays with the market
//! ```
//!
//! The two partial branches are mutually exclusive: `required > Cb` implies
//! `Cs >= Pb * (Cb + 1) > Cb * Ps`.

use cyberdyne_types::{CyberdyneError, Fill, FillOutcome, Order, Result, Side};

/// Whether a bid and an ask can trade: best bid price >= best ask price.
#[must_use]
pub fn crosses(bid: &Order, ask: &Order) -> bool {
    bid.price >= ask.price
}

/// Settle one crossing pair.
///
/// # Errors
/// - `NotCrossing` if `bid.price < ask.price`
/// - `MalformedKey` if the bid price is zero
pub fn settle_pair(bid: &Order, ask: &Order) -> Result<Fill> {
    if !crosses(bid, ask) {
        return Err(CyberdyneError::NotCrossing {
            bid_price: bid.price,
            ask_price: ask.price,
        });
    }
    if bid.price == 0 {
        return Err(CyberdyneError::MalformedKey {
            side: Side::Buy,
            reason: "zero bid price cannot settle".into(),
        });
    }

    let required = ask.quantity / bid.price;
    let deliverable = u128::from(bid.quantity) * u128::from(ask.price);

    let fill = if required > bid.quantity {
        let to_buyer = narrow(deliverable)?;
        Fill {
            outcome: FillOutcome::BidFilled,
            to_seller: bid.quantity,
            to_buyer,
            bid_residual: 0,
            ask_residual: remainder(ask.quantity, to_buyer)?,
            retained_first: 0,
            retained_second: 0,
            ..blank(bid, ask)
        }
    } else if deliverable > u128::from(ask.quantity) {
        Fill {
            outcome: FillOutcome::AskFilled,
            to_seller: required,
            to_buyer: ask.quantity,
            bid_residual: remainder(bid.quantity, required)?,
            ask_residual: 0,
            retained_first: 0,
            retained_second: 0,
            ..blank(bid, ask)
        }
    } else {
        let to_buyer = narrow(deliverable)?;
        Fill {
            outcome: FillOutcome::BothFilled,
            to_seller: required,
            to_buyer,
            bid_residual: 0,
            ask_residual: 0,
            retained_first: remainder(bid.quantity, required)?,
            retained_second: remainder(ask.quantity, to_buyer)?,
            ..blank(bid, ask)
        }
    };
    Ok(fill)
}

fn blank(bid: &Order, ask: &Order) -> Fill {
    Fill {
        outcome: FillOutcome::BothFilled,
        buyer: bid.trader,
        seller: ask.trader,
        bid_price: bid.price,
        ask_price: ask.price,
        to_seller: 0,
        to_buyer: 0,
        bid_residual: 0,
        ask_residual: 0,
        retained_first: 0,
        retained_second: 0,
    }
}

fn narrow(amount: u128) -> Result<u64> {
    u64::try_from(amount)
        .map_err(|_| CyberdyneError::Internal(format!("payout {amount} exceeds u64")))
}

fn remainder(escrow: u64, paid: u64) -> Result<u64> {
    escrow.checked_sub(paid).ok_or_else(|| {
        CyberdyneError::Internal(format!("payout {paid} exceeds escrow {escrow}"))
    })
}
