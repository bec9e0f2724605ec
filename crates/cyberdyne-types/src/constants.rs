//! System-wide constants: order key layout and market defaults.

/// Width of the price field in an order key.
pub const PRICE_BITS: usize = 48;

/// Width of the escrowed-quantity field in an order key.
pub const QUANTITY_BITS: usize = 48;

/// Width of the trader identifier field in an order key.
pub const TRADER_BITS: usize = 160;

/// Bit offset of the quantity field (it sits directly above the trader).
pub const QUANTITY_SHIFT: usize = TRADER_BITS;

/// Bit offset of the price field (most significant 48 bits).
pub const PRICE_SHIFT: usize = QUANTITY_SHIFT + QUANTITY_BITS;

/// Exclusive upper bound of a 48-bit field value (2^48).
pub const FIELD_LIMIT: u64 = 1 << PRICE_BITS;

/// Mask selecting the low 48 bits.
pub const FIELD_MASK: u64 = FIELD_LIMIT - 1;

/// Default number of blocks between market creation and the first clearing.
pub const DEFAULT_EPOCH_LENGTH: u64 = 100;

/// Default value reported by `Market::price()`.
pub const DEFAULT_REFERENCE_PRICE: u64 = 1000;

/// Default number of matches a single `tick` may perform.
pub const DEFAULT_MAX_MATCHES_PER_TICK: u32 = 256;
