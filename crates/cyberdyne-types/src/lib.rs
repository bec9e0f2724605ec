//! # cyberdyne-types
//!
//! Shared types, errors, and configuration for the **Cyberdyne** periodic
//! double auction.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identities**: [`Address`] (160-bit trader / contract identity), [`EpochId`]
//! - **Order model**: [`Side`], [`Order`] and the 256-bit key codec
//!   ([`encode_buy`], [`encode_sell`], [`decode_buy`], [`decode_sell`])
//! - **Fill model**: [`Fill`], [`FillOutcome`]
//! - **Admission model**: [`Admission`], [`RejectReason`]
//! - **Clearing model**: [`TickBudget`], [`TickReport`]
//! - **Configuration**: [`MarketConfig`]
//! - **Errors**: [`CyberdyneError`] with `CD_ERR_` prefix codes
//! - **Constants**: key layout and market defaults

pub mod admission;
pub mod config;
pub mod constants;
pub mod epoch;
pub mod error;
pub mod fill;
pub mod ids;
pub mod order;

pub use admission::*;
pub use config::*;
pub use epoch::*;
pub use error::*;
pub use fill::*;
pub use ids::*;
pub use order::*;

/// 256-bit unsigned integer used for packed order keys.
pub use primitive_types::U256;

// Constants are accessed via `cyberdyne_types::constants::FOO`
// (not re-exported to avoid name collisions).
