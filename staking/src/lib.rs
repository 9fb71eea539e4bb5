//! # SMVR Staking
//!
//! The accounting core of the SMVR **staking and incentive-distribution
//! engine**.  Users deposit a single stake token into a pool and receive
//! time-locked shares; the pool runs any number of independent **incentive
//! programs** (each in its own incentive token) and distributes them
//! pro-rata to active stakers through a fixed-point **price index**
//! (incentive units × 10⁹ per share).
//!
//! Shares move through three states: **active** (earning), **deactivating**
//! (inside the unlock countdown, earning only up to the index snapshot
//! taken at unsubscription), and **withdrawable**.  Harvesting pays out
//! across both active shares and deactivating tranches at any time.
//!
//! The engine is deliberately self-contained: the clock is injected as
//! `now_ms` parameters, identities and token types are opaque, admin
//! authority is an opaque [`AdminCap`] capability, and event publishing is
//! left to the embedder (events are drained via
//! [`StakingPool::take_events`]).
//!
//! ## Quick start
//!
//! ```rust
//! use smvr_staking::{AdminCap, Coin, StakingPool, TokenType, UserId};
//!
//! let admin = AdminCap::new();
//! let smvr = TokenType::from("smvr::SMVR");
//! let usdc = TokenType::from("usdc::USDC");
//!
//! // Pool with a five-day unlock countdown.
//! let mut pool = StakingPool::new(&admin, 5 * 24 * 3_600_000, smvr.clone()).unwrap();
//!
//! // Distribute 10^7 USDC base units per minute, funded with 10^11.
//! pool.create_incentive_program(
//!     &admin,
//!     Coin::new(usdc.clone(), 100_000_000_000),
//!     10_000_000,
//!     60_000,
//!     0,
//! )
//! .unwrap();
//!
//! let user = UserId::new_unique();
//! pool.stake(Coin::new(smvr.clone(), 1_000_000_000), 0, user).unwrap();
//!
//! // One interval later the sole staker is owed a full period.
//! let reward = pool.harvest(&usdc, 60_000, user).unwrap();
//! assert_eq!(reward.value(), 10_000_000);
//! ```
//!
//! See [`StakingPool`] for the full operation surface and [`index_math`]
//! for the allocation arithmetic.

pub mod coin;
pub mod error;
pub mod event;
pub mod index_math;
pub mod ledger;
pub mod pool;
pub mod program;
pub mod types;


// Re-exports for convenience.
pub use {
    coin::{Balance, Coin},
    error::StakingError,
    event::StakingEvent,
    index_math::INDEX_SCALE,
    ledger::{DeactivatingTranche, UserShareLedger},
    pool::StakingPool,
    program::{IncentiveConfig, IncentiveProgram},
    types::{AdminCap, PoolId, ProgramId, TokenType, UserId},
};
