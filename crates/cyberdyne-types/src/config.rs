//! Market configuration.

use serde::{Deserialize, Serialize};

use crate::{CyberdyneError, Result, TickBudget, constants};

/// Per-market configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Blocks per clearing epoch. Ticks are no-ops until one full epoch
    /// has elapsed since the market's anchor height.
    pub epoch_length: u64,
    /// Value reported by `Market::price()`. Never used for settlement.
    pub reference_price: u64,
    /// Matches a tick may perform when the caller supplies no budget.
    pub max_matches_per_tick: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            epoch_length: constants::DEFAULT_EPOCH_LENGTH,
            reference_price: constants::DEFAULT_REFERENCE_PRICE,
            max_matches_per_tick: constants::DEFAULT_MAX_MATCHES_PER_TICK,
        }
    }
}

impl MarketConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the market cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.epoch_length == 0 {
            return Err(CyberdyneError::Configuration(
                "epoch_length must be > 0".into(),
            ));
        }
        if self.max_matches_per_tick == 0 {
            return Err(CyberdyneError::Configuration(
                "max_matches_per_tick must be > 0".into(),
            ));
        }
        if self.reference_price >= constants::FIELD_LIMIT {
            return Err(CyberdyneError::Configuration(format!(
                "reference_price {} does not fit the 48-bit price field",
                self.reference_price
            )));
        }
        Ok(())
    }

    /// The default per-call budget.
    #[must_use]
    pub fn default_budget(&self) -> TickBudget {
        TickBudget::new(self.max_matches_per_tick)
    }
}
