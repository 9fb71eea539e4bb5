//! Event shapes for pool observability.
//!
//! The engine defines *what* happened and with which contents; publishing is
//! the embedder's concern.  Successful operations append to the pool's
//! pending queue (drained via [`crate::StakingPool::take_events`]); failed
//! operations append nothing.

use {
    crate::types::{PoolId, ProgramId, TokenType},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StakingEvent {
    NewPool {
        pool: PoolId,
        stake_token_type: TokenType,
        unlock_countdown_ms: u64,
    },
    CreateIncentiveProgram {
        pool: PoolId,
        incentive_id: ProgramId,
        token_type: TokenType,
        initial_balance: u64,
        period_amount: u64,
        interval_ms: u64,
    },
    DeactivateIncentiveProgram {
        pool: PoolId,
        incentive_id: ProgramId,
        token_type: TokenType,
    },
    ActivateIncentiveProgram {
        pool: PoolId,
        incentive_id: ProgramId,
        token_type: TokenType,
    },
    RemoveIncentiveProgram {
        pool: PoolId,
        incentive_id: ProgramId,
        token_type: TokenType,
        returned_balance: u64,
    },
    UpdateUnlockCountdownTsMs {
        pool: PoolId,
        unlock_countdown_ms: u64,
    },
    UpdateIncentiveConfig {
        pool: PoolId,
        incentive_id: ProgramId,
        period_amount: u64,
        interval_ms: u64,
    },
    Stake {
        pool: PoolId,
        token_type: TokenType,
        /// The user's `total_shares` *after* this stake.
        stake_amount: u64,
        stake_ts_ms: u64,
        /// Per-program index snapshot written to the ledger.
        last_index_snapshot: BTreeMap<ProgramId, u64>,
    },
    Unsubscribe {
        pool: PoolId,
        token_type: TokenType,
        unsubscribed_shares: u64,
        unsubscribe_ts_ms: u64,
        unlocked_ts_ms: u64,
    },
    Unstake {
        pool: PoolId,
        token_type: TokenType,
        unstake_amount: u64,
        unstake_ts_ms: u64,
    },
    Harvest {
        pool: PoolId,
        incentive_token_type: TokenType,
        harvest_amount: u64,
    },
}
