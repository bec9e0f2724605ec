//! End-to-end tests across the ledger, matchcore and market crates.
//!
//! Each scenario funds traders on two subcurrency ledgers, deposits into
//! the market, rests orders, advances the block height past the epoch
//! boundary and clears. Expected balances are exact: settlement is integer
//! arithmetic with floor division.

use cyberdyne_ledger::{Ledger, Subcurrency};
use cyberdyne_market::Market;
use cyberdyne_matchcore::{PriorityHeap, verify_fill_root};
use cyberdyne_types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ISSUER: u64 = 0x15;
const CREATOR: u64 = 0xcc;
const MARKET: u64 = 0x4d;
const A0: u64 = 0xa0;
const A1: u64 = 0xa1;
const A2: u64 = 0xa2;
const A3: u64 = 0xa3;

fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper: a market over two freshly issued ledgers, anchored at height 0.
struct Exchange {
    market: Market,
    first: Subcurrency,
    second: Subcurrency,
}

impl Exchange {
    fn new() -> Self {
        Self::with_config(MarketConfig::default())
    }

    fn with_config(config: MarketConfig) -> Self {
        init_tracing();
        let mut market = Market::new(addr(MARKET), config, 0).expect("valid config");
        market
            .init(
                addr(CREATOR),
                PriorityHeap::new(addr(0xb1), addr(CREATOR)),
                PriorityHeap::new(addr(0x51), addr(CREATOR)),
                addr(0xc1),
                addr(0xc2),
            )
            .expect("first init succeeds");
        Self {
            market,
            first: Subcurrency::new(addr(0xc1), addr(ISSUER)),
            second: Subcurrency::new(addr(0xc2), addr(ISSUER)),
        }
    }

    /// Issue currency-1 to `trader`, deposit it with the market and bid.
    fn bid(&mut self, trader: u64, price: u64, quantity: u128) -> Admission {
        assert!(self.first.issue(addr(ISSUER), addr(trader), quantity));
        assert!(self.first.send(addr(trader), addr(MARKET), quantity));
        self.market
            .buy(&self.first, addr(trader), price)
            .expect("buy on currency-1")
    }

    /// Issue currency-2 to `trader`, deposit it with the market and ask.
    fn ask(&mut self, trader: u64, price: u64, quantity: u128) -> Admission {
        assert!(self.second.issue(addr(ISSUER), addr(trader), quantity));
        assert!(self.second.send(addr(trader), addr(MARKET), quantity));
        self.market
            .sell(&self.second, addr(trader), price)
            .expect("sell on currency-2")
    }

    fn tick(&mut self, height: u64) -> TickReport {
        self.market
            .tick(&mut self.first, &mut self.second, height, None)
            .expect("tick")
    }

    fn tick_with(&mut self, height: u64, budget: TickBudget) -> TickReport {
        self.market
            .tick(&mut self.first, &mut self.second, height, Some(budget))
            .expect("tick")
    }

    fn buy_size(&self) -> usize {
        self.market.buy_heap().map_or(0, PriorityHeap::size)
    }

    fn sell_size(&self) -> usize {
        self.market.sell_heap().map_or(0, PriorityHeap::size)
    }

    /// The two-bid, two-ask book used by several scenarios.
    fn multi_order_book(&mut self) {
        assert!(self.bid(A0, 1200, 1000).is_accepted());
        assert!(self.bid(A1, 1400, 1000).is_accepted());
        assert!(self.ask(A2, 800, 1_000_000).is_accepted());
        assert!(self.ask(A3, 600, 1_000_000).is_accepted());
    }
}

#[test]
fn tick_before_first_epoch_does_nothing() {
    let mut ex = Exchange::new();
    ex.bid(A0, 1200, 1000);
    ex.ask(A2, 800, 100_000);

    let report = ex.tick(0);
    assert!(!report.any_match());
    assert!(!report.gate_open);
    assert_eq!(ex.buy_size(), 1);
    assert_eq!(ex.sell_size(), 1);
    assert_eq!(ex.first.balance(addr(MARKET)), 1000);
    assert_eq!(ex.second.balance(addr(MARKET)), 100_000);
}

#[test]
fn partial_buy_rests_bid_residual() {
    let mut ex = Exchange::new();
    ex.bid(A0, 1200, 1000);
    ex.ask(A2, 800, 100_000);
    assert_eq!(ex.buy_size(), 1);
    assert_eq!(ex.sell_size(), 1);

    let report = ex.tick(100);
    assert!(report.any_match());
    assert_eq!(ex.market.volume(), 83);
    assert_eq!(ex.market.price(), 1000);

    assert_eq!(ex.first.balance(addr(A2)), 83);
    assert_eq!(ex.second.balance(addr(A0)), 100_000);
    assert_eq!(ex.first.balance(addr(MARKET)), 917);
    assert_eq!(ex.second.balance(addr(MARKET)), 0);

    assert_eq!(ex.buy_size(), 1);
    assert_eq!(ex.sell_size(), 0);
    let heap = ex.market.buy_heap().expect("initialised");
    assert_eq!(decode_buy(heap.top()), (1200, 917, addr(A0)));

    assert!(!ex.tick(100).any_match());
}

#[test]
fn partial_sell_rests_ask_residual() {
    let mut ex = Exchange::new();
    ex.bid(A0, 1200, 100);
    ex.ask(A2, 800, 1_000_000);

    let report = ex.tick(100);
    assert!(report.any_match());
    assert_eq!(report.fills[0].outcome, FillOutcome::BidFilled);
    assert_eq!(ex.market.volume(), 100);
    assert_eq!(ex.market.price(), 1000);

    assert_eq!(ex.second.balance(addr(A0)), 80_000);
    assert_eq!(ex.first.balance(addr(A2)), 100);
    assert_eq!(ex.first.balance(addr(MARKET)), 0);
    assert_eq!(ex.second.balance(addr(MARKET)), 920_000);

    assert_eq!(ex.buy_size(), 0);
    assert_eq!(ex.sell_size(), 1);
    let heap = ex.market.sell_heap().expect("initialised");
    assert_eq!(decode_sell(heap.top()), (800, 920_000, addr(A2)));

    assert!(!ex.tick(100).any_match());
}

#[test]
fn multi_order_book_clears_in_priority_order() {
    let mut ex = Exchange::new();
    ex.multi_order_book();
    assert_eq!(ex.buy_size(), 2);
    assert_eq!(ex.sell_size(), 2);

    let report = ex.tick(100);
    assert_eq!(report.matches(), 2);
    assert!(!report.more_work);

    // Best bid against best ask first.
    assert_eq!(report.fills[0].buyer, addr(A1));
    assert_eq!(report.fills[0].seller, addr(A3));
    assert_eq!(report.fills[1].buyer, addr(A0));
    assert_eq!(report.fills[1].seller, addr(A2));
    assert!(
        report
            .fills
            .iter()
            .all(|f| f.outcome == FillOutcome::BothFilled)
    );

    assert_eq!(ex.second.balance(addr(A0)), 800_000);
    assert_eq!(ex.second.balance(addr(A1)), 600_000);
    assert_eq!(ex.first.balance(addr(A2)), 833);
    assert_eq!(ex.first.balance(addr(A3)), 714);
    assert_eq!(ex.market.volume(), 1547);
    assert_eq!(ex.market.price(), 1000);
    assert_eq!(ex.first.balance(addr(MARKET)), 453);
    assert_eq!(ex.second.balance(addr(MARKET)), 600_000);
    assert_eq!(ex.buy_size(), 0);
    assert_eq!(ex.sell_size(), 0);

    assert!(verify_fill_root(report.epoch, &report.fills, &report.fill_root));
}

#[test]
fn budget_exhaustion_resumes_on_next_tick() {
    let mut ex = Exchange::new();
    ex.multi_order_book();

    let first = ex.tick_with(100, TickBudget::new(1));
    assert_eq!(first.matches(), 1);
    assert!(first.more_work);
    assert_eq!(ex.buy_size(), 1);
    assert_eq!(ex.sell_size(), 1);

    let second = ex.tick_with(100, TickBudget::new(1));
    assert_eq!(second.matches(), 1);
    assert!(!second.more_work);

    // Same end state as clearing in one call.
    assert_eq!(ex.market.volume(), 1547);
    assert_eq!(ex.first.balance(addr(MARKET)), 453);
    assert_eq!(ex.second.balance(addr(MARKET)), 600_000);
    assert_eq!(first.volume + second.volume, 1547);
}

#[test]
fn configured_budget_applies_when_none_given() {
    let config = MarketConfig {
        max_matches_per_tick: 1,
        ..MarketConfig::default()
    };
    let mut ex = Exchange::with_config(config);
    ex.multi_order_book();

    assert!(ex.tick(100).more_work);
    assert!(!ex.tick(100).more_work);
    assert_eq!(ex.market.volume(), 1547);
}

#[test]
fn non_crossing_book_stays_put() {
    let mut ex = Exchange::new();
    ex.bid(A0, 700, 1000);
    ex.ask(A2, 800, 100_000);

    let report = ex.tick(100);
    assert!(!report.any_match());
    assert!(report.gate_open);
    assert_eq!(ex.buy_size(), 1);
    assert_eq!(ex.sell_size(), 1);
}

#[test]
fn deposit_cannot_be_reused_after_clearing() {
    let mut ex = Exchange::new();
    ex.bid(A0, 1200, 1000);
    ex.ask(A2, 800, 100_000);
    ex.tick(100);

    // The market's own payouts are now the last transfers on each ledger.
    let admission = ex.market.buy(&ex.first, addr(A0), 1200).expect("buy");
    assert!(!admission.is_accepted());
}

#[test]
fn fill_root_is_deterministic_across_replays() {
    let mut a = Exchange::new();
    let mut b = Exchange::new();
    a.multi_order_book();
    b.multi_order_book();
    assert_eq!(a.tick(250).fill_root, b.tick(250).fill_root);
}

#[test]
fn random_books_conserve_escrow() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut ex = Exchange::new();
    let traders: Vec<u64> = (0x100..0x110).collect();

    for round in 1..=5u64 {
        for &trader in &traders {
            let price = rng.gen_range(500..1500);
            if rng.gen_bool(0.5) {
                ex.bid(trader, price, rng.gen_range(1..10_000));
            } else {
                ex.ask(trader, price, rng.gen_range(1..10_000_000));
            }
        }
        ex.tick(round * 100);

        let (first, second) = ex
            .market
            .escrow_positions(&ex.first, &ex.second)
            .expect("initialised");
        assert!(first.verify().is_ok());
        assert!(second.verify().is_ok());

        // Whatever is left can no longer cross.
        let buy = ex.market.buy_heap().expect("initialised");
        let sell = ex.market.sell_heap().expect("initialised");
        if !buy.is_empty() && !sell.is_empty() {
            let (bid_price, _, _) = decode_buy(buy.top());
            let (ask_price, _, _) = decode_sell(sell.top());
            assert!(bid_price < ask_price);
        }
    }

    let supply_first: u128 = ex.first.total_supply();
    assert_eq!(
        supply_first,
        ex.first.balance_of(addr(MARKET))
            + traders.iter().map(|&t| ex.first.balance(addr(t))).sum::<u128>()
    );
}
