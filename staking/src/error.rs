//! Errors produced by the staking engine.
//!
//! Every error is fatal to the operation that raised it: the operation
//! applies no state change, emits no event, and moves no tokens.

use {
    crate::types::{TokenType, UserId},
    thiserror::Error,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingError {
    /// The provided token type differs from the pool's stake token or from
    /// the program's incentive token.
    #[error("token type mismatch: expected {expected}, got {got}")]
    TokenTypeMismatch { expected: TokenType, got: TokenType },

    /// The operation requires an existing share ledger for the user.
    #[error("no share ledger exists for user {user}")]
    UserShareNotFound { user: UserId },

    /// Attempted to unstake a deactivating tranche before its countdown ran
    /// out.
    #[error("deactivating shares unlock at {unlocked_ms} ms, current time is {now_ms} ms")]
    SharesNotYetExpired { unlocked_ms: u64, now_ms: u64 },

    /// The ledger's recorded owner differs from the caller (internal
    /// corruption check).
    #[error("share ledger records owner {recorded}, caller is {caller}")]
    UserMismatch { recorded: UserId, caller: UserId },

    /// Unsubscribe requested more shares than are currently active.
    #[error("unsubscribe of {requested} shares exceeds {available} active shares")]
    ActiveSharesNotEnough { requested: u64, available: u64 },

    /// Pool configuration attempted with an unlock countdown of zero.
    #[error("unlock countdown must be greater than zero")]
    ZeroUnlockCountdown,

    /// Deactivation of a program that is not active.
    #[error("incentive program is already deactivated")]
    AlreadyDeactivated,

    /// Activation of a program that is already active.
    #[error("incentive program is already active")]
    AlreadyActivated,

    /// Program creation with an empty incentive balance.
    #[error("incentive program requires a non-empty initial balance")]
    ZeroIncentive,

    /// Program creation or config update with a period amount of zero.
    #[error("period incentive amount must be greater than zero")]
    ZeroPeriodIncentiveAmount,

    /// Program creation or config update with an interval of zero.
    #[error("allocation interval must be greater than zero")]
    ZeroInterval,

    /// Stake of a coin with zero value.
    #[error("stake coin has zero value")]
    ZeroCoin,

    /// No incentive program exists at the given positional index.
    #[error("no incentive program at index {program_idx}")]
    IncentiveNotFound { program_idx: usize },

    /// A 128-bit intermediate exceeded the 64-bit narrowing, or a custody
    /// counter would wrap.  Indicates misconfiguration; fatal.
    #[error("arithmetic overflow in staking calculation")]
    ArithmeticOverflow,
}
