//! Fixed-point price-index arithmetic.
//!
//! A program's price index accumulates (incentive units × 10⁹) per share.
//! All intermediates are computed in u128 and narrowed back to u64; a
//! narrowing failure is reported loudly as
//! [`StakingError::ArithmeticOverflow`] rather than silently saturating,
//! since an index that cannot fit 64 bits indicates a misconfigured
//! program.

use crate::error::StakingError;

/// Fixed-point base of the price index: one full incentive unit per share.
pub const INDEX_SCALE: u64 = 1_000_000_000;

/// Incentive accrued over an elapsed window, pro-rated against the program
/// interval:
///
/// ```text
/// accrued = period_amount × elapsed_ms / interval_ms
/// ```
///
/// `elapsed_ms` is a whole number of intervals except for the program's
/// first window, which runs from the unrounded creation timestamp to the
/// next interval boundary and therefore pays fractionally.
///
/// The caller guarantees `interval_ms > 0` (enforced at program creation).
pub fn accrued_over_window(period_amount: u64, elapsed_ms: u64, interval_ms: u64) -> u128 {
    (period_amount as u128) * (elapsed_ms as u128) / (interval_ms as u128)
}

/// Index delta distributing `accrued` incentive units across
/// `total_active_shares`:
///
/// ```text
/// delta = 10⁹ × accrued / total_active_shares
/// ```
///
/// The caller guarantees `total_active_shares > 0`; allocation skips the
/// window entirely when nothing is staked.
pub fn index_delta(accrued: u128, total_active_shares: u64) -> Result<u64, StakingError> {
    let numerator = (INDEX_SCALE as u128)
        .checked_mul(accrued)
        .ok_or(StakingError::ArithmeticOverflow)?;
    let delta = numerator / (total_active_shares as u128);
    delta
        .try_into()
        .map_err(|_| StakingError::ArithmeticOverflow)
}

/// Incentive owed for `shares` over an index delta:
///
/// ```text
/// owed = shares × delta_index / 10⁹
/// ```
pub fn shares_owed(shares: u64, delta_index: u64) -> Result<u64, StakingError> {
    let owed = (shares as u128) * (delta_index as u128) / (INDEX_SCALE as u128);
    owed.try_into()
        .map_err(|_| StakingError::ArithmeticOverflow)
}
