//! Order model and the packed 256-bit order key codec.
//!
//! A resting order lives in a heap as a single 256-bit key:
//!
//! ```text
//!  255        208 207        160 159                          0
//! +-------------+--------------+------------------------------+
//! |   price     |   quantity   |            trader            |
//! +-------------+--------------+------------------------------+
//! ```
//!
//! Bid keys store the 48-bit two's-complement negation of the price, so a
//! higher bid packs to a smaller key. Both heaps are min-heaps, so the top
//! of the buy heap is the best bid and the top of the sell heap is the best
//! ask. The quantity field is the order's remaining escrow in its native
//! currency: currency-1 for bids, currency-2 for asks.

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    Address, CyberdyneError, Result,
    constants::{FIELD_LIMIT, FIELD_MASK, PRICE_SHIFT, QUANTITY_SHIFT},
};

/// Which side of the book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Unpacked view of a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub side: Side,
    /// Limit price, always the plain (non-negated) value.
    pub price: u64,
    /// Remaining escrow in the order's native currency.
    pub quantity: u64,
    /// Escrow owner and payout recipient.
    pub trader: Address,
}

impl Order {
    /// Build an order, rejecting fields that do not fit the key layout.
    pub fn new(side: Side, price: u64, quantity: u64, trader: Address) -> Result<Self> {
        check_price(price)?;
        check_quantity(u128::from(quantity))?;
        Ok(Self {
            side,
            price,
            quantity,
            trader,
        })
    }

    /// Pack into the 256-bit heap key.
    #[must_use]
    pub fn key(&self) -> U256 {
        let price_field = match self.side {
            Side::Sell => self.price & FIELD_MASK,
            Side::Buy => FIELD_LIMIT.wrapping_sub(self.price) & FIELD_MASK,
        };
        (U256::from(price_field) << PRICE_SHIFT)
            | (U256::from(self.quantity & FIELD_MASK) << QUANTITY_SHIFT)
            | self.trader.to_u256()
    }

    /// Unpack a heap key. Total: every 256-bit word decodes to some order.
    #[must_use]
    pub fn from_key(side: Side, key: U256) -> Self {
        let price_field = (key >> PRICE_SHIFT).low_u64() & FIELD_MASK;
        let quantity = (key >> QUANTITY_SHIFT).low_u64() & FIELD_MASK;
        let price = match side {
            Side::Sell => price_field,
            Side::Buy => FIELD_LIMIT.wrapping_sub(price_field) & FIELD_MASK,
        };
        Self {
            side,
            price,
            quantity,
            trader: Address::from_u256(key),
        }
    }

    /// Unpack a key that must describe a live order (non-zero price,
    /// quantity and trader).
    pub fn from_live_key(side: Side, key: U256) -> Result<Self> {
        let order = Self::from_key(side, key);
        let reason = if order.trader.is_zero() {
            Some("zero trader")
        } else if order.price == 0 {
            Some("zero price")
        } else if order.quantity == 0 {
            Some("zero quantity")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(CyberdyneError::MalformedKey {
                side,
                reason: format!("{reason} in key {key:#x}"),
            }),
            None => Ok(order),
        }
    }

    /// Same order with a different remaining quantity.
    #[must_use]
    pub fn with_quantity(self, quantity: u64) -> Self {
        Self { quantity, ..self }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}@{} by {}",
            self.side,
            self.quantity,
            self.price,
            self.trader.short()
        )
    }
}

/// Reject prices that do not fit the 48-bit field.
pub fn check_price(price: u64) -> Result<()> {
    if price >= FIELD_LIMIT {
        return Err(CyberdyneError::PriceOutOfRange { price });
    }
    Ok(())
}

/// Reject quantities that do not fit the 48-bit field.
pub fn check_quantity(quantity: u128) -> Result<()> {
    if quantity >= u128::from(FIELD_LIMIT) {
        return Err(CyberdyneError::QuantityOutOfRange { quantity });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Codec entry points
// ---------------------------------------------------------------------------

/// Pack a bid: the price field holds the negated price.
pub fn encode_buy(price: u64, quantity: u64, trader: Address) -> Result<U256> {
    Order::new(Side::Buy, price, quantity, trader).map(|o| o.key())
}

/// Pack an ask: the price field holds the price as is.
pub fn encode_sell(price: u64, quantity: u64, trader: Address) -> Result<U256> {
    Order::new(Side::Sell, price, quantity, trader).map(|o| o.key())
}

/// Inverse of [`encode_buy`]: `(price, quantity, trader)`.
#[must_use]
pub fn decode_buy(key: U256) -> (u64, u64, Address) {
    let o = Order::from_key(Side::Buy, key);
    (o.price, o.quantity, o.trader)
}

/// Inverse of [`encode_sell`]: `(price, quantity, trader)`.
#[must_use]
pub fn decode_sell(key: U256) -> (u64, u64, Address) {
    let o = Order::from_key(Side::Sell, key);
    (o.price, o.quantity, o.trader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trader(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn sell_key_layout() {
        let key = encode_sell(800, 1_000_000, trader(0xabc)).unwrap();
        assert_eq!(key >> 208, U256::from(800u64));
        assert_eq!((key >> 160) & U256::from(FIELD_MASK), U256::from(1_000_000u64));
        assert_eq!(Address::from_u256(key), trader(0xabc));
        assert_eq!(decode_sell(key), (800, 1_000_000, trader(0xabc)));
    }

    #[test]
    fn buy_key_stores_negated_price() {
        let key = encode_buy(1200, 1000, trader(1)).unwrap();
        assert_eq!(key >> 208, U256::from(FIELD_LIMIT - 1200));
        assert_eq!(decode_buy(key), (1200, 1000, trader(1)));
    }

    #[test]
    fn higher_bid_sorts_first() {
        let best = encode_buy(1400, 1000, trader(2)).unwrap();
        let worse = encode_buy(1200, 1000, trader(1)).unwrap();
        assert!(best < worse);
    }

    #[test]
    fn lower_ask_sorts_first() {
        let best = encode_sell(600, 1_000_000, trader(4)).unwrap();
        let worse = encode_sell(800, 1_000_000, trader(3)).unwrap();
        assert!(best < worse);
    }

    #[test]
    fn same_price_smaller_quantity_sorts_first() {
        let small = encode_buy(1200, 917, trader(1)).unwrap();
        let large = encode_buy(1200, 1000, trader(1)).unwrap();
        assert!(small < large);
    }

    #[test]
    fn field_extremes_survive_packing() {
        let max = FIELD_MASK;
        let key = encode_sell(max, max, trader(u64::MAX)).unwrap();
        assert_eq!(decode_sell(key), (max, max, trader(u64::MAX)));

        let key = encode_buy(1, max, trader(7)).unwrap();
        assert_eq!(decode_buy(key), (1, max, trader(7)));
        // Negated price 1 is all ones in the top field.
        assert_eq!(key >> 208, U256::from(FIELD_MASK));
    }

    #[test]
    fn out_of_range_fields_rejected() {
        assert!(matches!(
            encode_sell(FIELD_LIMIT, 1, trader(1)),
            Err(CyberdyneError::PriceOutOfRange { .. })
        ));
        assert!(matches!(
            encode_buy(1, FIELD_LIMIT, trader(1)),
            Err(CyberdyneError::QuantityOutOfRange { .. })
        ));
    }

    #[test]
    fn live_key_rejects_zero_fields() {
        let no_trader = Order::new(Side::Sell, 5, 5, Address::ZERO).unwrap().key();
        assert!(Order::from_live_key(Side::Sell, no_trader).is_err());

        let no_qty = Order::new(Side::Buy, 5, 0, trader(1)).unwrap().key();
        assert!(Order::from_live_key(Side::Buy, no_qty).is_err());

        assert!(Order::from_live_key(Side::Buy, U256::zero()).is_err());

        let ok = Order::new(Side::Buy, 5, 5, trader(1)).unwrap();
        assert_eq!(Order::from_live_key(Side::Buy, ok.key()).unwrap(), ok);
    }

    #[test]
    fn with_quantity_keeps_price_and_trader() {
        let o = Order::new(Side::Buy, 1200, 1000, trader(1)).unwrap();
        let r = o.with_quantity(917);
        assert_eq!(r.price, 1200);
        assert_eq!(r.trader, trader(1));
        assert_eq!(decode_buy(r.key()), (1200, 917, trader(1)));
    }

    #[test]
    fn side_display() {
        assert_eq!(format!("{}", Side::Buy), "BUY");
        assert_eq!(format!("{}", Side::Sell), "SELL");
    }
}
