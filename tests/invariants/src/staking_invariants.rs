//! Property-based tests for staking pool invariants.
//!
//! Properties tested:
//! 1. Pool counters and ledgers stay in balance across arbitrary
//!    interleavings of stake, unsubscribe, unstake, and harvest.
//! 2. Principal custody always equals the sum of ledger totals.
//! 3. Ledger bookmarks and tranche snapshots never exceed a program's
//!    price index.
//! 4. Total distribution never exceeds the program's deposits.
//! 5. Stake → unsubscribe → wait → unstake returns the principal exactly.
//! 6. Allocation is idempotent for a fixed timestamp.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use smvr_staking::{AdminCap, Coin, StakingError, StakingPool, TokenType, UserId};

    // ── Trace fixture ──

    const INTERVAL_MS: u64 = 60_000;
    const COUNTDOWN_MS: u64 = 2 * INTERVAL_MS;
    const PERIOD_AMOUNT: u64 = 10_000_000;
    const FUNDING: u64 = 1_000_000_000_000;
    const BASE_TS_MS: u64 = 1_715_212_800_000;
    const USERS: usize = 3;

    fn stake_token() -> TokenType {
        TokenType::from("smvr::SMVR")
    }

    fn incentive_token() -> TokenType {
        TokenType::from("usdc::USDC")
    }

    #[derive(Debug, Clone)]
    enum Op {
        AdvanceMs(u64),
        Stake { user: usize, amount: u64 },
        Unsubscribe { user: usize, shares: Option<u64> },
        Unstake { user: usize, shares: Option<u64> },
        Harvest { user: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            // Half-interval steps keep some timestamps off the boundary.
            (1u64..=20).prop_map(|n| Op::AdvanceMs(n * 30_000)),
            (0..USERS, 1u64..=1_000_000_000)
                .prop_map(|(user, amount)| Op::Stake { user, amount }),
            (0..USERS, prop::option::of(0u64..=1_000_000_000))
                .prop_map(|(user, shares)| Op::Unsubscribe { user, shares }),
            (0..USERS, prop::option::of(0u64..=1_000_000_000))
                .prop_map(|(user, shares)| Op::Unstake { user, shares }),
            (0..USERS).prop_map(|user| Op::Harvest { user }),
        ]
    }

    struct Trace {
        pool: StakingPool,
        users: Vec<UserId>,
        now_ms: u64,
        harvested: u64,
    }

    impl Trace {
        fn new() -> Self {
            let admin = AdminCap::new();
            let mut pool = StakingPool::new(&admin, COUNTDOWN_MS, stake_token()).unwrap();
            pool.create_incentive_program(
                &admin,
                Coin::new(incentive_token(), FUNDING),
                PERIOD_AMOUNT,
                INTERVAL_MS,
                BASE_TS_MS,
            )
            .unwrap();
            Self {
                pool,
                users: (0..USERS).map(|_| UserId::new_unique()).collect(),
                now_ms: BASE_TS_MS,
                harvested: 0,
            }
        }

        /// Applies one operation.  Domain errors are legal trace outcomes;
        /// anything else is a bug.
        fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
            let result: Result<(), StakingError> = match *op {
                Op::AdvanceMs(ms) => {
                    self.now_ms += ms;
                    Ok(())
                }
                Op::Stake { user, amount } => self.pool.stake(
                    Coin::new(stake_token(), amount),
                    self.now_ms,
                    self.users[user],
                ),
                Op::Unsubscribe { user, shares } => self.pool.unsubscribe(
                    &stake_token(),
                    shares,
                    self.now_ms,
                    self.users[user],
                ),
                Op::Unstake { user, shares } => self
                    .pool
                    .unstake(&stake_token(), shares, self.now_ms, self.users[user])
                    .map(|_| ()),
                Op::Harvest { user } => self
                    .pool
                    .harvest(&incentive_token(), self.now_ms, self.users[user])
                    .map(|coin| self.harvested += coin.value()),
            };
            match result {
                Ok(())
                | Err(StakingError::UserShareNotFound { .. })
                | Err(StakingError::ActiveSharesNotEnough { .. })
                | Err(StakingError::SharesNotYetExpired { .. }) => Ok(()),
                Err(other) => Err(TestCaseError::fail(format!(
                    "unexpected error applying {op:?}: {other}"
                ))),
            }
        }

        fn check_invariants(&self) -> Result<(), TestCaseError> {
            let pool = &self.pool;

            // ── INVARIANT: total_active_shares = Σ active_shares ──
            let active_sum: u64 = pool.ledgers().map(|l| l.active_shares).sum();
            prop_assert_eq!(pool.total_active_shares(), active_sum);

            // ── INVARIANT: total = active + deactivating, per ledger ──
            let mut total_sum: u64 = 0;
            for ledger in pool.ledgers() {
                prop_assert_eq!(
                    ledger.total_shares,
                    ledger.active_shares + ledger.deactivating_shares()
                );
                total_sum += ledger.total_shares;
            }

            // ── INVARIANT: principal custody matches ledger totals ──
            prop_assert_eq!(pool.stake_balance().value(), total_sum);

            // ── INVARIANT: no bookmark or snapshot outruns its program ──
            for program in pool.programs() {
                for ledger in pool.ledgers() {
                    if let Some(&last) = ledger.last_index_by_program_id.get(&program.id) {
                        prop_assert!(last <= program.price_index);
                    }
                    for tranche in &ledger.deactivating {
                        if let Some(&cap) =
                            tranche.snapshot_index_by_program_id.get(&program.id)
                        {
                            prop_assert!(cap <= program.price_index);
                        }
                    }
                }
            }

            // ── INVARIANT: distribution never exceeds deposits ──
            prop_assert_eq!(
                self.pool.programs()[0].balance.value() + self.harvested,
                FUNDING
            );
            Ok(())
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Invariants hold across random operation traces
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn invariants_hold_across_random_traces(
            ops in prop::collection::vec(op_strategy(), 1..50)
        ) {
            let mut trace = Trace::new();
            for op in &ops {
                trace.apply(op)?;
                trace.check_invariants()?;
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2. Full round trip returns the principal exactly
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn round_trip_returns_exact_principal(
            amount in 1u64..=10_000_000_000,
            hold_intervals in 0u64..=20,
        ) {
            let mut trace = Trace::new();
            let user = trace.users[0];
            trace.pool
                .stake(Coin::new(stake_token(), amount), trace.now_ms, user)
                .unwrap();

            trace.now_ms += hold_intervals * INTERVAL_MS;
            trace.pool
                .unsubscribe(&stake_token(), None, trace.now_ms, user)
                .unwrap();

            trace.now_ms += COUNTDOWN_MS;
            let principal = trace.pool
                .unstake(&stake_token(), None, trace.now_ms, user)
                .unwrap();
            prop_assert_eq!(principal.value(), amount);
            prop_assert!(trace.pool.user_ledger(&user).is_none());
            prop_assert_eq!(trace.pool.stake_balance().value(), 0);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 3. Harvest twice at one timestamp: the second is empty and changes
    //    nothing
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn repeated_harvest_at_fixed_time_is_idempotent(
            ops in prop::collection::vec(op_strategy(), 1..30),
            amount in 1u64..=1_000_000_000,
        ) {
            let mut trace = Trace::new();
            let user = trace.users[0];
            trace.pool
                .stake(Coin::new(stake_token(), amount), trace.now_ms, user)
                .unwrap();
            for op in &ops {
                trace.apply(op)?;
            }
            // The trace may have fully unstaked user 0; restore a ledger so
            // the double-harvest below always has one to work with.
            if trace.pool.user_ledger(&user).is_none() {
                trace.pool
                    .stake(Coin::new(stake_token(), amount), trace.now_ms, user)
                    .unwrap();
            }

            let _first = trace.pool
                .harvest(&incentive_token(), trace.now_ms, user)
                .unwrap();
            let programs_after_first = trace.pool.programs().to_vec();
            let ledger_after_first = trace.pool.user_ledger(&user).cloned();

            let second = trace.pool
                .harvest(&incentive_token(), trace.now_ms, user)
                .unwrap();
            prop_assert_eq!(second.value(), 0);
            prop_assert_eq!(trace.pool.programs(), programs_after_first.as_slice());
            prop_assert_eq!(trace.pool.user_ledger(&user).cloned(), ledger_after_first);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Rewards split proportionally between two stakers
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn rewards_are_proportional_to_shares(
            amount_a in 1_000u64..=10_000_000_000,
            amount_b in 1_000u64..=10_000_000_000,
        ) {
            let mut trace = Trace::new();
            let (a, b) = (trace.users[0], trace.users[1]);
            trace.pool
                .stake(Coin::new(stake_token(), amount_a), trace.now_ms, a)
                .unwrap();
            trace.pool
                .stake(Coin::new(stake_token(), amount_b), trace.now_ms, b)
                .unwrap();

            trace.now_ms += INTERVAL_MS;
            let reward_a = trace.pool
                .harvest(&incentive_token(), trace.now_ms, a)
                .unwrap()
                .value();
            let reward_b = trace.pool
                .harvest(&incentive_token(), trace.now_ms, b)
                .unwrap()
                .value();

            // Nothing over-distributes.
            prop_assert!(reward_a + reward_b <= PERIOD_AMOUNT);

            // More shares never earn less.
            if amount_a >= amount_b {
                prop_assert!(reward_a >= reward_b);
            } else {
                prop_assert!(reward_b >= reward_a);
            }

            // Both sides truncate the same index delta, so cross-multiplied
            // rewards differ by at most one delta's worth of rounding.
            let delta = (reward_a as u128 * amount_b as u128)
                .abs_diff(reward_b as u128 * amount_a as u128);
            let tolerance = amount_a.max(amount_b) as u128;
            prop_assert!(delta <= tolerance);
        }
    }
}
