//! Value-typed token custody.
//!
//! Tokens move by ownership: a [`Coin`] is value in flight, handed from the
//! caller to the pool on stake / program creation and from the pool back to
//! the caller on unstake / harvest / program removal.  A [`Balance`] is
//! value at rest, held exclusively by the pool or by a program.  Joining and
//! splitting are the only custody transfers, and both check the token-type
//! tag before moving anything.

use {
    crate::{error::StakingError, types::TokenType},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// A quantity of tokens in flight.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Coin {
    token_type: TokenType,
    amount: u64,
}

impl Coin {
    pub fn new(token_type: TokenType, amount: u64) -> Self {
        Self { token_type, amount }
    }

    /// A zero-value coin of the given type.
    pub fn zero(token_type: TokenType) -> Self {
        Self {
            token_type,
            amount: 0,
        }
    }

    pub fn value(&self) -> u64 {
        self.amount
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Absorbs `other` into `self`.  Fails on a type mismatch or if the
    /// combined value would wrap.
    pub fn join(&mut self, other: Coin) -> Result<(), StakingError> {
        if other.token_type != self.token_type {
            return Err(StakingError::TokenTypeMismatch {
                expected: self.token_type.clone(),
                got: other.token_type,
            });
        }
        self.amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        Ok(())
    }
}

/// A quantity of tokens at rest, owned by a pool or a program.
///
/// Created empty (or from an initial coin) with a fixed token type; only
/// coins of that type can ever be joined in.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Balance {
    token_type: TokenType,
    amount: u64,
}

impl Balance {
    /// An empty balance of the given type.
    pub fn new(token_type: TokenType) -> Self {
        Self {
            token_type,
            amount: 0,
        }
    }

    /// Takes custody of a coin, consuming it.
    pub fn from_coin(coin: Coin) -> Self {
        Self {
            token_type: coin.token_type,
            amount: coin.amount,
        }
    }

    pub fn value(&self) -> u64 {
        self.amount
    }

    pub fn token_type(&self) -> &TokenType {
        &self.token_type
    }

    /// Adds a coin to this balance.  Fails on a type mismatch or wrap.
    pub fn join(&mut self, coin: Coin) -> Result<(), StakingError> {
        if coin.token_type != self.token_type {
            return Err(StakingError::TokenTypeMismatch {
                expected: self.token_type.clone(),
                got: coin.token_type,
            });
        }
        self.amount = self
            .amount
            .checked_add(coin.amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Splits `amount` units out of this balance.  An underflow here means
    /// the caller asked for more than is held, which the pool's invariants
    /// rule out; it is reported as [`StakingError::ArithmeticOverflow`].
    pub fn split(&mut self, amount: u64) -> Result<Coin, StakingError> {
        self.amount = self
            .amount
            .checked_sub(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        Ok(Coin {
            token_type: self.token_type.clone(),
            amount,
        })
    }

    /// Consumes the balance, releasing the full remaining value.
    pub fn into_coin(self) -> Coin {
        Coin {
            token_type: self.token_type,
            amount: self.amount,
        }
    }
}
