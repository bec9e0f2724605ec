//! Identities used throughout Cyberdyne.
//!
//! Traders, heaps, markets and ledgers are all named by a 160-bit
//! [`Address`], the same width as the trader field of a packed order key.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CyberdyneError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// 160-bit identity of a trader or of a heap / market / ledger instance.
///
/// The zero address is reserved: it never owns a live order.
///
/// Serialises as a `0x`-prefixed hex string so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The reserved zero identity.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Address whose low 64 bits are `n` (handy for fixtures and well-known ids).
    #[must_use]
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Take the low 160 bits of a 256-bit word.
    #[must_use]
    pub fn from_u256(word: U256) -> Self {
        let mut buf = [0u8; 32];
        word.to_big_endian(&mut buf);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&buf[12..]);
        Self(bytes)
    }

    /// Zero-extend to a 256-bit word.
    #[must_use]
    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// First four bytes, hex encoded, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = CyberdyneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| CyberdyneError::Serialization(format!("address {s:?}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// A random, non-zero address.
    pub fn random() -> Self {
        let mut bytes: [u8; 20] = rand::random();
        bytes[0] |= 0x01;
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// EpochId
// ---------------------------------------------------------------------------

/// Index of a clearing epoch, counted from the market's anchor height.
///
/// Epoch 0 is the collection window before the first clearing; ticks
/// become effective from epoch 1 onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct EpochId(pub u64);

impl EpochId {
    /// The epoch containing `height` for a market anchored at `anchor`.
    ///
    /// Heights before the anchor belong to epoch 0.
    #[must_use]
    pub fn at_height(anchor: u64, epoch_length: u64, height: u64) -> Self {
        if epoch_length == 0 {
            return Self(0);
        }
        Self(height.saturating_sub(anchor) / epoch_length)
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
