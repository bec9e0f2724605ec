//! The periodic double auction.
//!
//! Orders accumulate during an epoch; once the epoch boundary has passed,
//! `tick` clears the crossing part of the book:
//! 1. Gate on `height >= anchor + epoch_length`
//! 2. Run the clearing loop on copies of both heaps
//! 3. Audit the escrow the market would hold after paying out against what
//!    the remaining orders commit
//! 4. Pay sellers in currency-1 and buyers in currency-2
//! 5. Commit the heaps and the epoch volume
//! 6. Commit to the fills with a `fill_root`
//!
//! The only fallible step after the first ledger transfer is a later
//! transfer. When a ledger refuses one, every payout already made by the
//! call is sent back to the market before the error is returned.

use cyberdyne_ledger::{DepositClaims, Ledger};
use cyberdyne_matchcore::{PriorityHeap, clear_book, compute_fill_root, root_hex};
use cyberdyne_types::{
    Address, Admission, CyberdyneError, EpochId, Fill, MarketConfig, Order, RejectReason, Result,
    Side, TickBudget, TickReport, check_price,
};
use serde::{Deserialize, Serialize};

use crate::escrow_audit::{EscrowPosition, committed_escrow};

/// State bound by `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Book {
    buy: PriorityHeap,
    sell: PriorityHeap,
    first_currency: Address,
    second_currency: Address,
}

/// A two-currency periodic double auction.
///
/// Bids escrow currency-1 and are priced in currency-2 per currency-1;
/// asks escrow currency-2. Ledgers are never held by the market: every call
/// that reads or moves balances receives them from the caller and checks
/// them against the identities bound at `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    address: Address,
    config: MarketConfig,
    anchor_height: u64,
    book: Option<Book>,
    claims: DepositClaims,
    /// Currency-1 paid to sellers during `volume_epoch`.
    volume: u64,
    volume_epoch: EpochId,
}

impl Market {
    /// Create an uninitialised market whose epochs count from `anchor_height`.
    ///
    /// # Errors
    /// `Configuration` if `config` does not validate or `address` is zero.
    pub fn new(address: Address, config: MarketConfig, anchor_height: u64) -> Result<Self> {
        config.validate()?;
        if address.is_zero() {
            return Err(CyberdyneError::Configuration(
                "market address must be non-zero".into(),
            ));
        }
        Ok(Self {
            address,
            config,
            anchor_height,
            book: None,
            claims: DepositClaims::new(),
            volume: 0,
            volume_epoch: EpochId::default(),
        })
    }

    // =================================================================
    // Lifecycle
    // =================================================================

    /// Bind the heaps and currency ledgers and take ownership of both heaps.
    ///
    /// A heap must be owned either by the market already or by `caller`, in
    /// which case `caller` hands it over. Both heaps are checked before
    /// either changes hands.
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call
    /// - `SharedHeap` if both heaps have the same identity
    /// - `HeapNotOwned` if a heap belongs to someone other than `caller`
    /// - `Configuration` if both currencies name the same ledger
    pub fn init(
        &mut self,
        caller: Address,
        mut buy_heap: PriorityHeap,
        mut sell_heap: PriorityHeap,
        first_currency: Address,
        second_currency: Address,
    ) -> Result<()> {
        if self.book.is_some() {
            return Err(CyberdyneError::AlreadyInitialized);
        }
        if buy_heap.id() == sell_heap.id() {
            return Err(CyberdyneError::SharedHeap);
        }
        if first_currency == second_currency {
            return Err(CyberdyneError::Configuration(format!(
                "currency ledgers must be distinct, both are {first_currency}"
            )));
        }
        for heap in [&buy_heap, &sell_heap] {
            if !heap.is_owner(self.address) && !heap.is_owner(caller) {
                return Err(CyberdyneError::HeapNotOwned {
                    owner: heap.owner(),
                    market: self.address,
                });
            }
        }
        for heap in [&mut buy_heap, &mut sell_heap] {
            if !heap.is_owner(self.address) {
                heap.set_owner(caller, self.address);
            }
        }

        tracing::info!(
            market = %self.address,
            buy_heap = %buy_heap.id(),
            sell_heap = %sell_heap.id(),
            first_currency = %first_currency,
            second_currency = %second_currency,
            anchor_height = self.anchor_height,
            epoch_length = self.config.epoch_length,
            "Market initialised"
        );

        self.book = Some(Book {
            buy: buy_heap,
            sell: sell_heap,
            first_currency,
            second_currency,
        });
        Ok(())
    }

    // =================================================================
    // Admission
    // =================================================================

    /// Rest a bid funded by the caller's latest currency-1 deposit.
    ///
    /// The caller must have just transferred currency-1 to the market; that
    /// amount becomes the bid's quantity.
    ///
    /// # Errors
    /// `NotInitialized`, or `LedgerMismatch` if `ledger` is not currency-1.
    pub fn buy<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        caller: Address,
        price: u64,
    ) -> Result<Admission> {
        self.admit(Side::Buy, ledger, caller, price)
    }

    /// Rest an ask funded by the caller's latest currency-2 deposit.
    ///
    /// # Errors
    /// `NotInitialized`, or `LedgerMismatch` if `ledger` is not currency-2.
    pub fn sell<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        caller: Address,
        price: u64,
    ) -> Result<Admission> {
        self.admit(Side::Sell, ledger, caller, price)
    }

    fn admit<L: Ledger + ?Sized>(
        &mut self,
        side: Side,
        ledger: &L,
        caller: Address,
        price: u64,
    ) -> Result<Admission> {
        let market = self.address;
        let book = self.book.as_mut().ok_or(CyberdyneError::NotInitialized)?;
        let (expected, heap) = match side {
            Side::Buy => (book.first_currency, &mut book.buy),
            Side::Sell => (book.second_currency, &mut book.sell),
        };
        check_ledger(expected, ledger)?;

        let verdict = if caller.is_zero() {
            Err(RejectReason::ZeroTrader)
        } else if price == 0 || check_price(price).is_err() {
            Err(RejectReason::InvalidPrice)
        } else {
            self.claims.claim(ledger, caller, market)
        };

        let claim = match verdict {
            Ok(claim) => claim,
            Err(reason) => {
                tracing::warn!(
                    market = %market,
                    side = %side,
                    trader = %caller,
                    price,
                    reason = %reason,
                    "Order rejected"
                );
                return Ok(Admission::Rejected(reason));
            }
        };

        let order = Order::new(side, price, claim.quantity, caller)?;
        let key = order.key();
        heap.push(market, key);

        tracing::debug!(
            market = %market,
            side = %side,
            trader = %caller,
            price,
            quantity = order.quantity,
            deposit_seq = claim.seq,
            "Order admitted"
        );
        Ok(Admission::Accepted { order, key })
    }

    // =================================================================
    // Clearing
    // =================================================================

    /// Clear crossing orders at block `height`.
    ///
    /// Before the first epoch boundary the call does nothing. Otherwise it
    /// matches until the book stops crossing or `budget` runs out (the
    /// configured default when `None`), and reports whether work remains.
    /// Call again with a fresh budget to resume.
    ///
    /// # Errors
    /// - `NotInitialized`, `LedgerMismatch`
    /// - `MalformedKey` if a heap holds a key that is not a live order
    /// - `InsufficientEscrow` if the market cannot cover the payouts
    /// - `EscrowInvariantViolation` if, after paying out, the market would
    ///   not cover the orders still resting
    /// - `TransferRejected` if a ledger refuses a payout; the payouts
    ///   already made by this call are sent back first
    /// - `Internal` if such a payout cannot be sent back
    ///
    /// On every error except the last, nothing has changed.
    pub fn tick<L1, L2>(
        &mut self,
        first: &mut L1,
        second: &mut L2,
        height: u64,
        budget: Option<TickBudget>,
    ) -> Result<TickReport>
    where
        L1: Ledger + ?Sized,
        L2: Ledger + ?Sized,
    {
        let market = self.address;
        let gate_open = self.gate_open(height);
        let epoch = self.epoch_at(height);
        let mut budget = budget.unwrap_or_else(|| self.config.default_budget());

        let book = self.book.as_mut().ok_or(CyberdyneError::NotInitialized)?;
        check_ledger(book.first_currency, &*first)?;
        check_ledger(book.second_currency, &*second)?;

        if !gate_open {
            tracing::debug!(
                market = %market,
                height,
                opens_at = self.anchor_height.saturating_add(self.config.epoch_length),
                "Tick before first epoch boundary"
            );
            return Ok(TickReport::idle(epoch, false, compute_fill_root(epoch, &[])));
        }

        let mut buy = book.buy.clone();
        let mut sell = book.sell.clone();
        let run = clear_book(&mut buy, &mut sell, market, &mut budget)?;

        let owed_first: u128 = run.fills.iter().map(|f| u128::from(f.to_seller)).sum();
        let owed_second: u128 = run.fills.iter().map(|f| u128::from(f.to_buyer)).sum();
        for position in [
            projected_position(&*first, market, committed_escrow(&buy, Side::Buy), owed_first)?,
            projected_position(&*second, market, committed_escrow(&sell, Side::Sell), owed_second)?,
        ] {
            if let Err(err) = position.verify() {
                tracing::error!(market = %market, error = %err, "Escrow audit failed");
                return Err(err);
            }
        }

        let tick_volume = u64::try_from(owed_first)
            .map_err(|_| CyberdyneError::Internal(format!("tick volume {owed_first} overflows")))?;
        let carried = if epoch == self.volume_epoch {
            self.volume
        } else {
            0
        };
        let volume = carried.checked_add(tick_volume).ok_or_else(|| {
            CyberdyneError::Internal(format!("epoch volume {carried} + {tick_volume} overflows"))
        })?;

        pay_fills(first, second, market, &run.fills, &mut self.claims)?;

        book.buy = buy;
        book.sell = sell;
        self.volume = volume;
        self.volume_epoch = epoch;

        let fill_root = compute_fill_root(epoch, &run.fills);
        let report = TickReport {
            epoch,
            gate_open,
            volume: tick_volume,
            more_work: run.more_work,
            fill_root,
            fills: run.fills,
        };

        tracing::info!(
            market = %market,
            epoch = epoch.0,
            height,
            matches = report.matches(),
            tick_volume,
            epoch_volume = volume,
            more_work = report.more_work,
            budget_left = budget.remaining(),
            fill_root = %root_hex(&fill_root),
            "Tick complete"
        );

        Ok(report)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Currency-1 paid to sellers during the most recently cleared epoch.
    #[must_use]
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// The configured reference price. Settlement never reads it.
    #[must_use]
    pub fn price(&self) -> u64 {
        self.config.reference_price
    }

    #[must_use]
    pub fn first_currency(&self) -> Option<Address> {
        self.book.as_ref().map(|b| b.first_currency)
    }

    #[must_use]
    pub fn second_currency(&self) -> Option<Address> {
        self.book.as_ref().map(|b| b.second_currency)
    }

    #[must_use]
    pub fn buy_heap(&self) -> Option<&PriorityHeap> {
        self.book.as_ref().map(|b| &b.buy)
    }

    #[must_use]
    pub fn sell_heap(&self) -> Option<&PriorityHeap> {
        self.book.as_ref().map(|b| &b.sell)
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    #[must_use]
    pub fn anchor_height(&self) -> u64 {
        self.anchor_height
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.book.is_some()
    }

    /// Whether a tick at `height` may clear.
    #[must_use]
    pub fn gate_open(&self, height: u64) -> bool {
        height >= self.anchor_height.saturating_add(self.config.epoch_length)
    }

    #[must_use]
    pub fn epoch_at(&self, height: u64) -> EpochId {
        EpochId::at_height(self.anchor_height, self.config.epoch_length, height)
    }

    /// Escrow held against escrow committed, for currency-1 then currency-2.
    ///
    /// # Errors
    /// `NotInitialized`, `LedgerMismatch`.
    pub fn escrow_positions<L1, L2>(
        &self,
        first: &L1,
        second: &L2,
    ) -> Result<(EscrowPosition, EscrowPosition)>
    where
        L1: Ledger + ?Sized,
        L2: Ledger + ?Sized,
    {
        let book = self.book.as_ref().ok_or(CyberdyneError::NotInitialized)?;
        check_ledger(book.first_currency, first)?;
        check_ledger(book.second_currency, second)?;
        Ok((
            EscrowPosition {
                ledger: book.first_currency,
                committed: committed_escrow(&book.buy, Side::Buy),
                held: first.balance_of(self.address),
            },
            EscrowPosition {
                ledger: book.second_currency,
                committed: committed_escrow(&book.sell, Side::Sell),
                held: second.balance_of(self.address),
            },
        ))
    }
}

// =====================================================================
// Helpers
// =====================================================================

fn check_ledger<L: Ledger + ?Sized>(expected: Address, ledger: &L) -> Result<()> {
    let actual = ledger.address();
    if actual != expected {
        return Err(CyberdyneError::LedgerMismatch { expected, actual });
    }
    Ok(())
}

/// The market's position on `ledger` once `owed` has been paid out.
fn projected_position<L: Ledger + ?Sized>(
    ledger: &L,
    market: Address,
    committed: u128,
    owed: u128,
) -> Result<EscrowPosition> {
    let available = ledger.balance_of(market);
    let held = available
        .checked_sub(owed)
        .ok_or(CyberdyneError::InsufficientEscrow {
            ledger: ledger.address(),
            needed: owed,
            available,
        })?;
    Ok(EscrowPosition {
        ledger: ledger.address(),
        committed,
        held,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    First,
    Second,
}

fn leg_transfer<L1, L2>(
    first: &mut L1,
    second: &mut L2,
    leg: Leg,
    from: Address,
    to: Address,
    amount: u128,
) -> bool
where
    L1: Ledger + ?Sized,
    L2: Ledger + ?Sized,
{
    match leg {
        Leg::First => first.transfer(from, to, amount),
        Leg::Second => second.transfer(from, to, amount),
    }
}

fn leg_address<L1, L2>(first: &L1, second: &L2, leg: Leg) -> Address
where
    L1: Ledger + ?Sized,
    L2: Ledger + ?Sized,
{
    match leg {
        Leg::First => first.address(),
        Leg::Second => second.address(),
    }
}

/// Pay sellers in currency-1 and buyers in currency-2, in fill order.
/// Zero amounts are skipped.
///
/// If a ledger refuses a payout, the payouts already made are sent back in
/// reverse order and `TransferRejected` is returned.
fn pay_fills<L1, L2>(
    first: &mut L1,
    second: &mut L2,
    market: Address,
    fills: &[Fill],
    claims: &mut DepositClaims,
) -> Result<()>
where
    L1: Ledger + ?Sized,
    L2: Ledger + ?Sized,
{
    let mut paid: Vec<(Leg, Address, u128)> = Vec::with_capacity(fills.len() * 2);
    for fill in fills {
        for (leg, to, amount) in [
            (Leg::First, fill.seller, fill.to_seller),
            (Leg::Second, fill.buyer, fill.to_buyer),
        ] {
            if amount == 0 {
                continue;
            }
            let amount = u128::from(amount);
            if leg_transfer(first, second, leg, market, to, amount) {
                paid.push((leg, to, amount));
                continue;
            }

            let ledger = leg_address(&*first, &*second, leg);
            tracing::warn!(
                market = %market,
                ledger = %ledger,
                to = %to,
                amount,
                reverting = paid.len(),
                "Payout refused"
            );
            revert_payouts(first, second, market, &paid, claims)?;
            return Err(CyberdyneError::TransferRejected { ledger, to, amount });
        }
    }
    Ok(())
}

/// Send `paid` back to the market, newest first.
///
/// A returned payout is a transfer into the market like any deposit, so
/// the latest transfer on every ledger touched is retired from
/// `claims`: nobody can rest an order on money the market already held.
fn revert_payouts<L1, L2>(
    first: &mut L1,
    second: &mut L2,
    market: Address,
    paid: &[(Leg, Address, u128)],
    claims: &mut DepositClaims,
) -> Result<()>
where
    L1: Ledger + ?Sized,
    L2: Ledger + ?Sized,
{
    for &(leg, to, amount) in paid.iter().rev() {
        if !leg_transfer(first, second, leg, to, market, amount) {
            let ledger = leg_address(&*first, &*second, leg);
            tracing::error!(
                market = %market,
                ledger = %ledger,
                from = %to,
                amount,
                "Payout could not be reverted"
            );
            return Err(CyberdyneError::Internal(format!(
                "could not revert payout of {amount} to {to} on ledger {ledger}"
            )));
        }
    }
    if paid.iter().any(|&(leg, _, _)| leg == Leg::First) {
        claims.retire_latest(&*first);
    }
    if paid.iter().any(|&(leg, _, _)| leg == Leg::Second) {
        claims.retire_latest(&*second);
    }
    Ok(())
}
