//! The clearing loop.
//!
//! Repeatedly reads the best bid and best ask, settles them with
//! [`settle_pair`], and updates both heaps:
//!
//! ```text
//! clear_book(buy, sell, operator, budget) -> ClearingRun { fills, more_work }
//! ```
//!
//! Both tops are always popped; a side with a residual is pushed back with
//! its reduced quantity (a decrease-key done as pop + push). Every match
//! closes at least one order, so the loop ends once the book stops crossing
//! or the budget runs out.

use cyberdyne_types::{Address, CyberdyneError, Fill, Order, Result, Side, TickBudget};

use crate::{
    PriorityHeap,
    settlement::{crosses, settle_pair},
};

/// Result of one pass of the clearing loop.
#[derive(Debug, Clone, Default)]
pub struct ClearingRun {
    /// Fills in the order they were settled.
    pub fills: Vec<Fill>,
    /// The budget ran out while the book still crossed.
    pub more_work: bool,
}

/// The current best bid and best ask, if both exist and they cross.
///
/// # Errors
/// `MalformedKey` if either top does not decode to a live order.
pub fn best_pair(buy: &PriorityHeap, sell: &PriorityHeap) -> Result<Option<(Order, Order)>> {
    if buy.is_empty() || sell.is_empty() {
        return Ok(None);
    }
    let bid = Order::from_live_key(Side::Buy, buy.top())?;
    let ask = Order::from_live_key(Side::Sell, sell.top())?;
    Ok(crosses(&bid, &ask).then_some((bid, ask)))
}

/// Match crossing orders until the book is uncrossed or `budget` is spent.
///
/// `operator` must own both heaps. The heaps are mutated in place, so on
/// error they may be left partially cleared; callers that need all-or-nothing
/// semantics run this on copies and commit them on success.
///
/// # Errors
/// - `HeapNotOwned` if `operator` does not own both heaps
/// - `MalformedKey` if a heap top is not a live order
pub fn clear_book(
    buy: &mut PriorityHeap,
    sell: &mut PriorityHeap,
    operator: Address,
    budget: &mut TickBudget,
) -> Result<ClearingRun> {
    for heap in [&*buy, &*sell] {
        if !heap.is_owner(operator) {
            return Err(CyberdyneError::HeapNotOwned {
                owner: heap.owner(),
                market: operator,
            });
        }
    }

    let mut run = ClearingRun::default();

    while let Some((bid, ask)) = best_pair(buy, sell)? {
        if !budget.try_charge() {
            run.more_work = true;
            break;
        }

        let fill = settle_pair(&bid, &ask)?;

        buy.pop(operator);
        sell.pop(operator);
        if fill.bid_rests() {
            buy.push(operator, bid.with_quantity(fill.bid_residual).key());
        }
        if fill.ask_rests() {
            sell.push(operator, ask.with_quantity(fill.ask_residual).key());
        }

        tracing::debug!(
            outcome = %fill.outcome,
            buyer = %fill.buyer,
            seller = %fill.seller,
            bid_price = fill.bid_price,
            ask_price = fill.ask_price,
            to_seller = fill.to_seller,
            to_buyer = fill.to_buyer,
            bid_residual = fill.bid_residual,
            ask_residual = fill.ask_residual,
            "Orders matched"
        );

        run.fills.push(fill);
    }

    Ok(run)
}
