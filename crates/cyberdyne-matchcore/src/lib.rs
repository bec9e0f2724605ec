//! # cyberdyne-matchcore
//!
//! **Pure clearing core for Cyberdyne.**
//!
//! MatchCore is the compute plane: it holds resting orders and decides how
//! crossing orders settle. It has:
//!
//! - **Owner-gated heaps**: [`PriorityHeap`] only lets its owner mutate it
//! - **Exact integer settlement**: floor division, no rounding modes
//! - **Zero ledger side effects**: the clearing loop produces [`Fill`]s,
//!   moving balances is the market's job
//! - **Deterministic output**: same heaps in, same fills and fill root out
//!
//! [`Fill`]: cyberdyne_types::Fill

pub mod determinism;
pub mod heap;
pub mod matcher;
pub mod settlement;

pub use determinism::{compute_fill_root, root_hex, verify_fill_root};
pub use heap::PriorityHeap;
pub use matcher::{ClearingRun, best_pair, clear_book};
pub use settlement::{crosses, settle_pair};
