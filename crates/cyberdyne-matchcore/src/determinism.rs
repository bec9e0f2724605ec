//! Fill root: a SHA-256 commitment over the fills of one clearing call.
//!
//! Two markets that start from the same heaps and run the same ticks must
//! produce the same fills. The root lets them (and auditors) compare a
//! whole tick with one 32-byte value instead of the full fill list.

use cyberdyne_types::{EpochId, Fill, FillOutcome};
use sha2::{Digest, Sha256};

/// Compute the fill root for a tick.
///
/// Depends on the epoch, the fill count and every field of every fill, in
/// order. The same fills in the same order always produce the same root.
#[must_use]
pub fn compute_fill_root(epoch: EpochId, fills: &[Fill]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"cyberdyne:fill_root:v1:");
    hasher.update(epoch.0.to_le_bytes());
    hasher.update((fills.len() as u64).to_le_bytes());

    for fill in fills {
        hasher.update([match fill.outcome {
            FillOutcome::BidFilled => 0u8,
            FillOutcome::AskFilled => 1u8,
            FillOutcome::BothFilled => 2u8,
        }]);
        hasher.update(fill.buyer.as_bytes());
        hasher.update(fill.seller.as_bytes());
        for value in [
            fill.bid_price,
            fill.ask_price,
            fill.to_seller,
            fill.to_buyer,
            fill.bid_residual,
            fill.ask_residual,
            fill.retained_first,
            fill.retained_second,
        ] {
            hasher.update(value.to_le_bytes());
        }
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Recompute the root over `fills` and compare it with `expected_root`.
#[must_use]
pub fn verify_fill_root(epoch: EpochId, fills: &[Fill], expected_root: &[u8; 32]) -> bool {
    compute_fill_root(epoch, fills) == *expected_root
}

/// Hex form of a root, for log fields.
#[must_use]
pub fn root_hex(root: &[u8; 32]) -> String {
    hex::encode(root)
}
