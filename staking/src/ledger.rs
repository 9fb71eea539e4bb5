//! Per-user share accounting.

use {
    crate::{
        error::StakingError,
        types::{ProgramId, UserId},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// A bundle of shares inside the unlock-countdown window.
///
/// The tranche earns incentives only up to the per-program index snapshot
/// captured when it was unsubscribed; once the owner's last-seen index
/// passes the snapshot, the tranche contributes nothing further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DeactivatingTranche {
    /// Remaining locked principal in this tranche.
    pub shares: u64,

    /// Moment the tranche entered the deactivating state.
    pub unsubscribed_ms: u64,

    /// `unsubscribed_ms + unlock_countdown_ms` at unsubscription time.
    /// Later countdown changes do not move existing tranches.
    pub unlocked_ms: u64,

    /// Per-program price index at the moment of unsubscription.
    pub snapshot_index_by_program_id: BTreeMap<ProgramId, u64>,
}

/// Share ledger of a single user, keyed by identity in the pool's user
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UserShareLedger {
    /// Owning identity; enforced equal to the table key on every load.
    pub user: UserId,

    /// Timestamp of this user's most recent stake.
    pub last_stake_ms: u64,

    /// `active_shares` plus all deactivating tranche shares.
    pub total_shares: u64,

    /// Shares currently earning incentives.
    pub active_shares: u64,

    /// FIFO list of deactivating tranches (oldest first).
    pub deactivating: Vec<DeactivatingTranche>,

    /// Last observed per-program price index.  Absence means the user has
    /// never yet earned from that program; the baseline is 0.
    pub last_index_by_program_id: BTreeMap<ProgramId, u64>,
}

impl UserShareLedger {
    pub(crate) fn new(user: UserId) -> Self {
        Self {
            user,
            last_stake_ms: 0,
            total_shares: 0,
            active_shares: 0,
            deactivating: Vec::new(),
            last_index_by_program_id: BTreeMap::new(),
        }
    }

    /// Sum of shares across all deactivating tranches.
    pub fn deactivating_shares(&self) -> u64 {
        self.deactivating.iter().map(|t| t.shares).sum()
    }

    /// True when nothing remains: the destruction condition checked after
    /// unstake.
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0 && self.active_shares == 0 && self.deactivating.is_empty()
    }

    /// Plans the FIFO consumption of up to `target` unlocked shares without
    /// mutating anything.  The planned amount is less than `target` when
    /// fewer shares are deactivating.
    ///
    /// Touching any tranche whose countdown has not run out fails the whole
    /// plan with [`StakingError::SharesNotYetExpired`].
    pub(crate) fn plan_unlock(&self, target: u64, now_ms: u64) -> Result<UnlockPlan, StakingError> {
        let mut remaining = target;
        let mut drained = 0usize;
        let mut partial = 0u64;
        for tranche in &self.deactivating {
            if remaining == 0 {
                break;
            }
            if tranche.unlocked_ms > now_ms {
                return Err(StakingError::SharesNotYetExpired {
                    unlocked_ms: tranche.unlocked_ms,
                    now_ms,
                });
            }
            if tranche.shares <= remaining {
                remaining -= tranche.shares;
                drained += 1;
            } else {
                partial = remaining;
                remaining = 0;
            }
        }
        Ok(UnlockPlan {
            consumed: target - remaining,
            drained,
            partial,
        })
    }

    /// Applies a plan produced by [`Self::plan_unlock`] against the same
    /// ledger state.
    pub(crate) fn apply_unlock(&mut self, plan: &UnlockPlan) -> Result<(), StakingError> {
        self.deactivating.drain(..plan.drained);
        if plan.partial > 0 {
            // Drained tranches were removed, so the partial one is now
            // first.
            let tranche = &mut self.deactivating[0];
            tranche.shares -= plan.partial;
        }
        self.total_shares = self
            .total_shares
            .checked_sub(plan.consumed)
            .ok_or(StakingError::ArithmeticOverflow)?;
        Ok(())
    }

    #[cfg(test)]
    fn consume_unlocked(&mut self, target: u64, now_ms: u64) -> Result<u64, StakingError> {
        let plan = self.plan_unlock(target, now_ms)?;
        self.apply_unlock(&plan)?;
        Ok(plan.consumed)
    }
}

/// Outcome of a [`UserShareLedger::plan_unlock`] walk: how much would be
/// consumed, how many whole tranches drain, and the partial bite into the
/// next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UnlockPlan {
    pub consumed: u64,
    drained: usize,
    partial: u64,
}
