//! Per-program incentive state.
//!
//! An incentive program is an independently parameterized distribution
//! schedule attached to a pool: it holds a reserved balance of its incentive
//! token and releases `period_amount` units per `interval_ms` into the price
//! index while active.

use {
    crate::{
        coin::{Balance, Coin},
        error::StakingError,
        types::{ProgramId, TokenType},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Distribution schedule parameters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct IncentiveConfig {
    /// Incentive units released per full interval.  Strictly positive.
    pub period_amount: u64,

    /// Allocation interval in milliseconds.  Strictly positive; the price
    /// index only advances at multiples of this interval.
    pub interval_ms: u64,
}

impl IncentiveConfig {
    pub fn validate(&self) -> Result<(), StakingError> {
        if self.period_amount == 0 {
            return Err(StakingError::ZeroPeriodIncentiveAmount);
        }
        if self.interval_ms == 0 {
            return Err(StakingError::ZeroInterval);
        }
        Ok(())
    }
}

/// State of one incentive program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct IncentiveProgram {
    /// Stable id, assigned at creation and never reused.
    pub id: ProgramId,

    /// Incentive token type; the program's balance is tagged with it.
    pub token_type: TokenType,

    pub config: IncentiveConfig,

    /// Only active programs advance their index during allocation.
    /// Deactivation freezes the index in place.
    pub active: bool,

    /// Timestamp of the last index update.  Set to the unrounded creation
    /// time at birth so the first window accrues from exactly "now" instead
    /// of retroactively from the previous interval boundary; every
    /// subsequent advance lands it on a multiple of `interval_ms`.
    pub last_allocate_ms: u64,

    /// Accumulator in (incentive units × 10⁹) per share.
    pub price_index: u64,

    /// Reserved incentive tokens still held in custody.
    pub balance: Balance,
}

impl IncentiveProgram {
    /// Creates a program taking custody of `incentive`.
    pub(crate) fn new(
        id: ProgramId,
        incentive: Coin,
        period_amount: u64,
        interval_ms: u64,
        now_ms: u64,
    ) -> Result<Self, StakingError> {
        if incentive.is_zero() {
            return Err(StakingError::ZeroIncentive);
        }
        let config = IncentiveConfig {
            period_amount,
            interval_ms,
        };
        config.validate()?;
        let token_type = incentive.token_type().clone();
        Ok(Self {
            id,
            token_type,
            config,
            active: true,
            last_allocate_ms: now_ms,
            price_index: 0,
            balance: Balance::from_coin(incentive),
        })
    }

    pub(crate) fn check_token_type(&self, token_type: &TokenType) -> Result<(), StakingError> {
        if self.token_type != *token_type {
            return Err(StakingError::TokenTypeMismatch {
                expected: self.token_type.clone(),
                got: token_type.clone(),
            });
        }
        Ok(())
    }

    /// Freezes the index by marking the program inactive.  The unallocated
    /// window since `last_allocate_ms` is *not* settled first.
    pub(crate) fn deactivate(&mut self, token_type: &TokenType) -> Result<(), StakingError> {
        self.check_token_type(token_type)?;
        if !self.active {
            return Err(StakingError::AlreadyDeactivated);
        }
        self.active = false;
        Ok(())
    }

    pub(crate) fn activate(&mut self, token_type: &TokenType) -> Result<(), StakingError> {
        self.check_token_type(token_type)?;
        if self.active {
            return Err(StakingError::AlreadyActivated);
        }
        self.active = true;
        Ok(())
    }
}
