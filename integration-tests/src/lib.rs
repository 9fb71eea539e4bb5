//! SMVR Staking Integration Tests
//!
//! Multi-operation scenario suite for the staking engine:
//!
//! 1. **Share lifecycle** — stake, unsubscribe, countdown, unstake across
//!    multiple users and interleavings
//! 2. **Incentive programs** — creation, deactivation, removal, config and
//!    countdown updates, multi-token distribution
//!
//! All tests run against [`harness::StakingHarness`], which owns the pool,
//! the admin capability, and a simulated millisecond clock, and re-checks
//! the pool's accounting invariants after every step.

pub mod harness;
