//! SMVR Staking Property-Based Invariant Tests
//!
//! Uses proptest to verify the engine's accounting invariants across
//! randomly generated operation traces:
//! - Share conservation between the pool counters and the user ledgers
//! - Principal custody equals the sum of ledger totals
//! - Index monotonicity between ledgers, tranches, and programs
//! - Distribution never exceeds program deposits
//! - Round-trip and idempotency laws

pub mod staking_invariants;
