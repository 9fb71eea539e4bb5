//! SMVR Staking Test Harness
//!
//! Provides a deterministic environment for integration-testing the staking
//! engine: one pool, the admin capability, and a simulated millisecond
//! clock.  Operation wrappers feed the clock into the engine and re-assert
//! the pool's accounting invariants after every mutation, so any scenario
//! that drifts out of balance fails at the step that broke it.

use smvr_staking::{AdminCap, Coin, ProgramId, StakingError, StakingPool, TokenType, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Base timestamp used by the scenario suite (2024-05-09 00:00:00 UTC).
pub const BASE_TS_MS: u64 = 1_715_212_800_000;

/// Default allocation interval (one minute).
pub const INTERVAL_MS: u64 = 60_000;

/// Default unlock countdown (five days).
pub const COUNTDOWN_MS: u64 = 5 * 24 * 3_600_000;

/// Default incentive released per interval.
pub const PERIOD_AMOUNT: u64 = 10_000_000;

/// Default incentive program funding.
pub const PROGRAM_FUNDING: u64 = 100_000_000_000;

/// Stake token used by the suite.
pub const STAKE_TOKEN: &str = "smvr::SMVR";

/// Default incentive token used by the suite.
pub const INCENTIVE_TOKEN: &str = "usdc::USDC";

/// Initialise env_logger once per test process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn stake_token() -> TokenType {
    TokenType::from(STAKE_TOKEN)
}

pub fn incentive_token() -> TokenType {
    TokenType::from(INCENTIVE_TOKEN)
}

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

/// One pool under test plus the simulated clock driving it.
pub struct StakingHarness {
    pub admin: AdminCap,
    pub pool: StakingPool,
    pub now_ms: u64,
}

impl Default for StakingHarness {
    fn default() -> Self {
        Self::new(COUNTDOWN_MS)
    }
}

impl StakingHarness {
    /// Creates a harness with an empty pool and the clock at [`BASE_TS_MS`].
    pub fn new(unlock_countdown_ms: u64) -> Self {
        let admin = AdminCap::new();
        let pool = StakingPool::new(&admin, unlock_countdown_ms, stake_token())
            .expect("pool creation with a positive countdown");
        Self {
            admin,
            pool,
            now_ms: BASE_TS_MS,
        }
    }

    /// Creates a harness whose pool already runs one default-parameter
    /// incentive program.
    pub fn with_default_program() -> Self {
        let mut harness = Self::default();
        harness.create_program(INCENTIVE_TOKEN, PROGRAM_FUNDING, PERIOD_AMOUNT, INTERVAL_MS);
        harness
    }

    // ── Clock ────────────────────────────────────────────────────────────────

    pub fn advance_ms(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Advances the clock by `n` allocation intervals.
    pub fn advance_intervals(&mut self, n: u64) {
        self.advance_ms(n * INTERVAL_MS);
    }

    /// Advances the clock past the unlock countdown.
    pub fn advance_past_countdown(&mut self) {
        self.advance_ms(self.pool.unlock_countdown_ms());
    }

    // ── Admin wrappers ───────────────────────────────────────────────────────

    pub fn create_program(
        &mut self,
        token: &str,
        funding: u64,
        period_amount: u64,
        interval_ms: u64,
    ) -> ProgramId {
        let id = self
            .pool
            .create_incentive_program(
                &self.admin,
                Coin::new(TokenType::from(token), funding),
                period_amount,
                interval_ms,
                self.now_ms,
            )
            .expect("program creation with validated parameters");
        self.assert_invariants();
        id
    }

    pub fn remove_program(&mut self, program_idx: usize, token: &str) -> u64 {
        let returned = self
            .pool
            .remove_incentive_program(&self.admin, program_idx, &TokenType::from(token))
            .expect("program removal at a valid index");
        self.assert_invariants();
        returned.value()
    }

    // ── User wrappers ────────────────────────────────────────────────────────

    pub fn stake(&mut self, user: UserId, amount: u64) {
        self.pool
            .stake(Coin::new(stake_token(), amount), self.now_ms, user)
            .expect("stake of a positive amount");
        self.assert_invariants();
    }

    pub fn unsubscribe(&mut self, user: UserId, shares: Option<u64>) {
        self.pool
            .unsubscribe(&stake_token(), shares, self.now_ms, user)
            .expect("unsubscribe within active shares");
        self.assert_invariants();
    }

    pub fn unstake(&mut self, user: UserId, shares: Option<u64>) -> u64 {
        let coin = self
            .pool
            .unstake(&stake_token(), shares, self.now_ms, user)
            .expect("unstake of unlocked shares");
        self.assert_invariants();
        coin.value()
    }

    pub fn try_unstake(
        &mut self,
        user: UserId,
        shares: Option<u64>,
    ) -> Result<u64, StakingError> {
        let result = self
            .pool
            .unstake(&stake_token(), shares, self.now_ms, user)
            .map(|coin| coin.value());
        self.assert_invariants();
        result
    }

    /// Harvests the default incentive token and returns the amount.
    pub fn harvest(&mut self, user: UserId) -> u64 {
        self.harvest_token(user, INCENTIVE_TOKEN)
    }

    pub fn harvest_token(&mut self, user: UserId, token: &str) -> u64 {
        let coin = self
            .pool
            .harvest(&TokenType::from(token), self.now_ms, user)
            .expect("harvest for an existing ledger");
        self.assert_invariants();
        coin.value()
    }

    // ── Invariant checks ─────────────────────────────────────────────────────

    /// Asserts the pool's accounting invariants:
    ///
    /// 1. `total_active_shares` equals the sum of ledger active shares.
    /// 2. Every ledger's `total_shares` equals its active plus deactivating
    ///    shares.
    /// 3. The principal balance equals the sum of ledger `total_shares`
    ///    (no units are ever in flight inside a single operation).
    /// 4. No ledger bookmark or tranche snapshot exceeds its program's
    ///    current price index.
    pub fn assert_invariants(&self) {
        let pool = &self.pool;

        let active_sum: u64 = pool.ledgers().map(|l| l.active_shares).sum();
        assert_eq!(
            pool.total_active_shares(),
            active_sum,
            "total_active_shares diverged from ledger sum"
        );

        let mut total_sum: u64 = 0;
        for ledger in pool.ledgers() {
            assert_eq!(
                ledger.total_shares,
                ledger.active_shares + ledger.deactivating_shares(),
                "ledger {} shares out of balance",
                ledger.user
            );
            total_sum += ledger.total_shares;
        }
        assert_eq!(
            pool.stake_balance().value(),
            total_sum,
            "principal custody diverged from ledger totals"
        );

        for program in pool.programs() {
            for ledger in pool.ledgers() {
                if let Some(&last) = ledger.last_index_by_program_id.get(&program.id) {
                    assert!(
                        last <= program.price_index,
                        "ledger {} is ahead of {}'s price index",
                        ledger.user,
                        program.id
                    );
                }
                for tranche in &ledger.deactivating {
                    if let Some(&cap) = tranche.snapshot_index_by_program_id.get(&program.id) {
                        assert!(
                            cap <= program.price_index,
                            "tranche snapshot ahead of {}'s price index",
                            program.id
                        );
                    }
                }
            }
        }
    }
}
