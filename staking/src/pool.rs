//! Top-level pool accounting.
//!
//! A [`StakingPool`] owns one principal balance, a registry of incentive
//! programs, and the per-user share table.  Every mutating user operation
//! (stake, unsubscribe, unstake, harvest) first advances all active
//! programs' price indexes to the clock-aligned boundary, then applies its
//! effect.  Operations are all-or-nothing: every domain check runs before
//! allocation, and the allocation and harvest passes compute their full
//! effect before applying any of it, so a failed operation leaves the pool
//! untouched.  The one exception is a fatal [`StakingError::ArithmeticOverflow`]
//! raised after allocation, which may leave that (independently consistent)
//! index advance in place.

use {
    crate::{
        coin::{Balance, Coin},
        error::StakingError,
        event::StakingEvent,
        index_math,
        ledger::{DeactivatingTranche, UserShareLedger},
        program::{IncentiveConfig, IncentiveProgram},
        types::{AdminCap, PoolId, ProgramId, TokenType, UserId},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::debug,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// One staking pool: custody of a single stake-token principal plus any
/// number of incentive programs distributing over it.
#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakingPool {
    id: PoolId,
    stake_token_type: TokenType,
    unlock_countdown_ms: u64,
    /// Reserved for admin pause; not gating in current semantics.
    active: bool,
    /// Denominator for index allocation; always Σ ledger `active_shares`.
    total_active_shares: u64,
    /// Monotonic program-id counter, never reused.
    next_incentive_id: u64,
    stake_balance: Balance,
    programs: Vec<IncentiveProgram>,
    user_shares: BTreeMap<UserId, UserShareLedger>,
    /// Pending events, drained by the embedder.  Not part of persisted
    /// state.
    #[serde(skip)]
    #[borsh(skip)]
    events: Vec<StakingEvent>,
}

impl StakingPool {
    // -----------------------------------------------------------------------
    // Construction & admin surface
    // -----------------------------------------------------------------------

    /// Creates a pool for `stake_token_type` with the given unlock
    /// countdown.
    pub fn new(
        _admin: &AdminCap,
        unlock_countdown_ms: u64,
        stake_token_type: TokenType,
    ) -> Result<Self, StakingError> {
        if unlock_countdown_ms == 0 {
            return Err(StakingError::ZeroUnlockCountdown);
        }
        let id = PoolId::new_unique();
        let mut pool = Self {
            id,
            stake_token_type: stake_token_type.clone(),
            unlock_countdown_ms,
            active: true,
            total_active_shares: 0,
            next_incentive_id: 0,
            stake_balance: Balance::new(stake_token_type.clone()),
            programs: Vec::new(),
            user_shares: BTreeMap::new(),
            events: Vec::new(),
        };
        pool.events.push(StakingEvent::NewPool {
            pool: id,
            stake_token_type,
            unlock_countdown_ms,
        });
        Ok(pool)
    }

    /// Registers a new incentive program, taking custody of `incentive` as
    /// its distributable balance.
    ///
    /// `last_allocate_ms` starts at the unrounded `now_ms` so the first
    /// window accrues from exactly now; pre-existing stakers receive
    /// nothing retroactively.
    pub fn create_incentive_program(
        &mut self,
        _admin: &AdminCap,
        incentive: Coin,
        period_amount: u64,
        interval_ms: u64,
        now_ms: u64,
    ) -> Result<ProgramId, StakingError> {
        let id = ProgramId(self.next_incentive_id);
        let token_type = incentive.token_type().clone();
        let initial_balance = incentive.value();
        let program = IncentiveProgram::new(id, incentive, period_amount, interval_ms, now_ms)?;
        self.next_incentive_id = self
            .next_incentive_id
            .checked_add(1)
            .ok_or(StakingError::ArithmeticOverflow)?;
        self.programs.push(program);
        self.events.push(StakingEvent::CreateIncentiveProgram {
            pool: self.id,
            incentive_id: id,
            token_type: token_type.clone(),
            initial_balance,
            period_amount,
            interval_ms,
        });
        debug!(
            "create_incentive_program: {id} distributing {period_amount} {token_type} per \
             {interval_ms} ms from balance {initial_balance}"
        );
        Ok(id)
    }

    /// Freezes a program's index in place.  The unallocated window since its
    /// `last_allocate_ms` is not settled first.
    pub fn deactivate_incentive_program(
        &mut self,
        _admin: &AdminCap,
        program_idx: usize,
        token_type: &TokenType,
    ) -> Result<(), StakingError> {
        let program = self.program_mut(program_idx)?;
        program.deactivate(token_type)?;
        let id = program.id;
        self.events.push(StakingEvent::DeactivateIncentiveProgram {
            pool: self.id,
            incentive_id: id,
            token_type: token_type.clone(),
        });
        debug!("deactivate_incentive_program: {id}");
        Ok(())
    }

    /// Resumes a deactivated program.  Allocation restarts from the frozen
    /// `last_allocate_ms`, so the whole frozen window accrues at the next
    /// mutating operation.
    pub fn activate_incentive_program(
        &mut self,
        _admin: &AdminCap,
        program_idx: usize,
        token_type: &TokenType,
    ) -> Result<(), StakingError> {
        let program = self.program_mut(program_idx)?;
        program.activate(token_type)?;
        let id = program.id;
        self.events.push(StakingEvent::ActivateIncentiveProgram {
            pool: self.id,
            incentive_id: id,
            token_type: token_type.clone(),
        });
        debug!("activate_incentive_program: {id}");
        Ok(())
    }

    /// Destroys a program and returns its remaining balance.
    ///
    /// Ledger `last_index_by_program_id` entries for the removed id become
    /// dangling; harvest iterates the registry and therefore ignores them.
    pub fn remove_incentive_program(
        &mut self,
        _admin: &AdminCap,
        program_idx: usize,
        token_type: &TokenType,
    ) -> Result<Coin, StakingError> {
        self.program(program_idx)?.check_token_type(token_type)?;
        let program = self.programs.remove(program_idx);
        let returned = program.balance.into_coin();
        self.events.push(StakingEvent::RemoveIncentiveProgram {
            pool: self.id,
            incentive_id: program.id,
            token_type: token_type.clone(),
            returned_balance: returned.value(),
        });
        debug!(
            "remove_incentive_program: {} returning {} {token_type}",
            program.id,
            returned.value()
        );
        Ok(returned)
    }

    /// Changes the unlock countdown for *future* unsubscriptions; existing
    /// tranches keep the `unlocked_ms` they were created with.
    pub fn update_unlock_countdown_ms(
        &mut self,
        _admin: &AdminCap,
        new_ms: u64,
    ) -> Result<(), StakingError> {
        if new_ms == 0 {
            return Err(StakingError::ZeroUnlockCountdown);
        }
        self.unlock_countdown_ms = new_ms;
        self.events.push(StakingEvent::UpdateUnlockCountdownTsMs {
            pool: self.id,
            unlock_countdown_ms: new_ms,
        });
        debug!("update_unlock_countdown_ms: {new_ms}");
        Ok(())
    }

    /// Updates a program's distribution schedule.  Does *not* settle the
    /// unallocated window first: the new rate applies retroactively from
    /// the program's `last_allocate_ms`.  A caller wanting the old rate
    /// settled up to now runs any mutating operation (e.g. a harvest) at
    /// the change timestamp before updating.
    pub fn update_incentive_config(
        &mut self,
        _admin: &AdminCap,
        program_idx: usize,
        period_amount: Option<u64>,
        interval_ms: Option<u64>,
    ) -> Result<(), StakingError> {
        let program = self.program_mut(program_idx)?;
        let config = IncentiveConfig {
            period_amount: period_amount.unwrap_or(program.config.period_amount),
            interval_ms: interval_ms.unwrap_or(program.config.interval_ms),
        };
        config.validate()?;
        program.config = config;
        let id = program.id;
        self.events.push(StakingEvent::UpdateIncentiveConfig {
            pool: self.id,
            incentive_id: id,
            period_amount: config.period_amount,
            interval_ms: config.interval_ms,
        });
        debug!(
            "update_incentive_config: {id} now {} per {} ms",
            config.period_amount, config.interval_ms
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Stake lifecycle
    // -----------------------------------------------------------------------

    /// Deposits `stake` and credits the user with an equal number of active
    /// shares.
    ///
    /// The ledger's per-program index bookmarks are **overwritten** with the
    /// current snapshot: incentives accrued to pre-existing active shares
    /// and not yet harvested are consumed by this stake.  Harvest first to
    /// keep them.
    pub fn stake(&mut self, stake: Coin, now_ms: u64, user: UserId) -> Result<(), StakingError> {
        if *stake.token_type() != self.stake_token_type {
            return Err(StakingError::TokenTypeMismatch {
                expected: self.stake_token_type.clone(),
                got: stake.token_type().clone(),
            });
        }
        let amount = stake.value();
        if amount == 0 {
            return Err(StakingError::ZeroCoin);
        }

        // Every domain check and every counter that could wrap is validated
        // before allocation so a failed stake leaves the pool untouched.
        let (cur_total, cur_active) = match self.user_shares.get(&user) {
            Some(ledger) => {
                if ledger.user != user {
                    return Err(StakingError::UserMismatch {
                        recorded: ledger.user,
                        caller: user,
                    });
                }
                (ledger.total_shares, ledger.active_shares)
            }
            None => (0, 0),
        };
        let new_total = cur_total
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        let new_active = cur_active
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        let new_pool_active = self
            .total_active_shares
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;
        self.stake_balance
            .value()
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;

        self.allocate_incentive(now_ms)?;
        let snapshot = self.index_snapshot();

        self.stake_balance.join(stake)?;
        let ledger = self
            .user_shares
            .entry(user)
            .or_insert_with(|| UserShareLedger::new(user));
        ledger.last_stake_ms = now_ms;
        ledger.total_shares = new_total;
        ledger.active_shares = new_active;
        ledger.last_index_by_program_id = snapshot.clone();
        self.total_active_shares = new_pool_active;

        self.events.push(StakingEvent::Stake {
            pool: self.id,
            token_type: self.stake_token_type.clone(),
            stake_amount: new_total,
            stake_ts_ms: now_ms,
            last_index_snapshot: snapshot,
        });
        debug!(
            "stake: user {user} staked {amount} {}, total shares {new_total}",
            self.stake_token_type
        );
        Ok(())
    }

    /// Moves shares out of the earning set into a deactivating tranche that
    /// unlocks after the pool's countdown.  `shares` defaults to all active
    /// shares; zero shares is a successful no-op.
    pub fn unsubscribe(
        &mut self,
        token_type: &TokenType,
        shares: Option<u64>,
        now_ms: u64,
        user: UserId,
    ) -> Result<(), StakingError> {
        if *token_type != self.stake_token_type {
            return Err(StakingError::TokenTypeMismatch {
                expected: self.stake_token_type.clone(),
                got: token_type.clone(),
            });
        }

        let ledger = self.ledger(&user)?;
        let shares = shares.unwrap_or(ledger.active_shares);
        if shares > ledger.active_shares {
            return Err(StakingError::ActiveSharesNotEnough {
                requested: shares,
                available: ledger.active_shares,
            });
        }
        let unlocked_ms = now_ms
            .checked_add(self.unlock_countdown_ms)
            .ok_or(StakingError::ArithmeticOverflow)?;

        self.allocate_incentive(now_ms)?;
        if shares == 0 {
            return Ok(());
        }
        let snapshot = self.index_snapshot();

        let ledger = self
            .user_shares
            .get_mut(&user)
            .ok_or(StakingError::UserShareNotFound { user })?;
        ledger.active_shares -= shares;
        ledger.deactivating.push(DeactivatingTranche {
            shares,
            unsubscribed_ms: now_ms,
            unlocked_ms,
            snapshot_index_by_program_id: snapshot,
        });
        self.total_active_shares = self
            .total_active_shares
            .checked_sub(shares)
            .ok_or(StakingError::ArithmeticOverflow)?;

        self.events.push(StakingEvent::Unsubscribe {
            pool: self.id,
            token_type: token_type.clone(),
            unsubscribed_shares: shares,
            unsubscribe_ts_ms: now_ms,
            unlocked_ts_ms: unlocked_ms,
        });
        debug!("unsubscribe: user {user} moved {shares} shares to countdown, unlock at {unlocked_ms}");
        Ok(())
    }

    /// Withdraws unlocked principal from the user's deactivating tranches
    /// in FIFO order.  `shares` defaults to everything deactivating; any
    /// touched tranche still inside its countdown fails the whole call.
    ///
    /// Consuming the last share destroys the ledger, together with any
    /// incentives it had not yet harvested.
    pub fn unstake(
        &mut self,
        token_type: &TokenType,
        shares: Option<u64>,
        now_ms: u64,
        user: UserId,
    ) -> Result<Coin, StakingError> {
        if *token_type != self.stake_token_type {
            return Err(StakingError::TokenTypeMismatch {
                expected: self.stake_token_type.clone(),
                got: token_type.clone(),
            });
        }

        let ledger = self.ledger(&user)?;
        let target = match shares {
            Some(shares) => shares,
            None => ledger
                .total_shares
                .checked_sub(ledger.active_shares)
                .ok_or(StakingError::ArithmeticOverflow)?,
        };
        let plan = ledger.plan_unlock(target, now_ms)?;
        let consumed = plan.consumed;

        self.allocate_incentive(now_ms)?;
        if consumed == 0 {
            return Ok(Coin::zero(self.stake_token_type.clone()));
        }
        let ledger = self
            .user_shares
            .get_mut(&user)
            .ok_or(StakingError::UserShareNotFound { user })?;
        ledger.apply_unlock(&plan)?;
        if ledger.is_empty() {
            self.user_shares.remove(&user);
        }
        let principal = self.stake_balance.split(consumed)?;

        self.events.push(StakingEvent::Unstake {
            pool: self.id,
            token_type: token_type.clone(),
            unstake_amount: consumed,
            unstake_ts_ms: now_ms,
        });
        debug!("unstake: user {user} withdrew {consumed} {}", self.stake_token_type);
        Ok(principal)
    }

    // -----------------------------------------------------------------------
    // Harvest
    // -----------------------------------------------------------------------

    /// Collects everything the user is owed in `incentive_token_type`
    /// across all programs of that type, bounded per program by the balance
    /// it still holds.
    ///
    /// Active shares earn from the last-seen index up to the current one;
    /// each deactivating tranche earns only up to the snapshot it captured
    /// at unsubscription.  The ledger's bookmarks advance to the current
    /// index either way.
    pub fn harvest(
        &mut self,
        incentive_token_type: &TokenType,
        now_ms: u64,
        user: UserId,
    ) -> Result<Coin, StakingError> {
        self.ledger(&user)?;
        self.allocate_incentive(now_ms)?;

        // Plan pass over immutable state; nothing is written until every
        // per-program amount has been computed.
        let ledger = self.ledger(&user)?;
        let mut plan: Vec<(usize, ProgramId, u64, u64)> = Vec::new();
        let mut harvested: u64 = 0;
        for (idx, program) in self.programs.iter().enumerate() {
            if program.token_type != *incentive_token_type {
                continue;
            }
            let owed = Self::owed_from_program(ledger, program)?;
            let pay = owed.min(program.balance.value());
            harvested = harvested
                .checked_add(pay)
                .ok_or(StakingError::ArithmeticOverflow)?;
            plan.push((idx, program.id, pay, program.price_index));
        }

        // Apply pass.
        let ledger = self
            .user_shares
            .get_mut(&user)
            .ok_or(StakingError::UserShareNotFound { user })?;
        for &(_, program_id, _, price_index) in &plan {
            ledger.last_index_by_program_id.insert(program_id, price_index);
        }
        let mut out = Coin::zero(incentive_token_type.clone());
        for &(idx, _, pay, _) in &plan {
            let part = self.programs[idx].balance.split(pay)?;
            out.join(part)?;
        }

        self.events.push(StakingEvent::Harvest {
            pool: self.id,
            incentive_token_type: incentive_token_type.clone(),
            harvest_amount: harvested,
        });
        debug!("harvest: user {user} collected {harvested} {incentive_token_type}");
        Ok(out)
    }

    /// Projects what [`Self::harvest`] would pay at `now_ms` without
    /// mutating anything.
    pub fn pending_incentive(
        &self,
        incentive_token_type: &TokenType,
        now_ms: u64,
        user: &UserId,
    ) -> Result<u64, StakingError> {
        let ledger = self.ledger(user)?;
        let mut pending: u64 = 0;
        for program in &self.programs {
            if program.token_type != *incentive_token_type {
                continue;
            }
            // As-if-allocated view of the program.
            let mut projected = program.clone();
            if let Some((aligned_ms, price_index)) = self.planned_advance(program, now_ms)? {
                projected.last_allocate_ms = aligned_ms;
                projected.price_index = price_index;
            }
            let owed = Self::owed_from_program(ledger, &projected)?;
            let pay = owed.min(projected.balance.value());
            pending = pending
                .checked_add(pay)
                .ok_or(StakingError::ArithmeticOverflow)?;
        }
        Ok(pending)
    }

    /// Owed incentive for one ledger against one program: active shares over
    /// the delta since the last-seen index, plus each tranche capped at its
    /// unsubscription snapshot.
    fn owed_from_program(
        ledger: &UserShareLedger,
        program: &IncentiveProgram,
    ) -> Result<u64, StakingError> {
        let last = ledger
            .last_index_by_program_id
            .get(&program.id)
            .copied()
            .unwrap_or(0);
        let delta = program
            .price_index
            .checked_sub(last)
            .ok_or(StakingError::ArithmeticOverflow)?;
        let mut owed = index_math::shares_owed(ledger.active_shares, delta)?;
        for tranche in &ledger.deactivating {
            if let Some(&cap) = tranche.snapshot_index_by_program_id.get(&program.id) {
                if cap > last {
                    let tranche_owed = index_math::shares_owed(tranche.shares, cap - last)?;
                    owed = owed
                        .checked_add(tranche_owed)
                        .ok_or(StakingError::ArithmeticOverflow)?;
                }
            }
        }
        Ok(owed)
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    /// Advances every active program's price index to the interval boundary
    /// at or below `now_ms`.  Idempotent for a given `now_ms`.
    ///
    /// With no active shares the index is left alone and only
    /// `last_allocate_ms` advances: windows in which nothing is staked are
    /// intentionally skipped and their tokens stay in the program balance.
    ///
    /// Advances for all programs are computed before any is applied, so an
    /// overflow leaves the pool unchanged.
    fn allocate_incentive(&mut self, now_ms: u64) -> Result<(), StakingError> {
        let mut advances: Vec<(usize, u64, u64)> = Vec::new();
        for (idx, program) in self.programs.iter().enumerate() {
            if let Some((aligned_ms, price_index)) = self.planned_advance(program, now_ms)? {
                advances.push((idx, aligned_ms, price_index));
            }
        }
        for (idx, aligned_ms, price_index) in advances {
            let program = &mut self.programs[idx];
            program.last_allocate_ms = aligned_ms;
            program.price_index = price_index;
        }
        Ok(())
    }

    /// The advance one program would make at `now_ms`, or `None` when the
    /// program is inactive or the aligned boundary has not moved.
    fn planned_advance(
        &self,
        program: &IncentiveProgram,
        now_ms: u64,
    ) -> Result<Option<(u64, u64)>, StakingError> {
        if !program.active {
            return Ok(None);
        }
        let interval_ms = program.config.interval_ms;
        let aligned_now = now_ms / interval_ms * interval_ms;
        if aligned_now <= program.last_allocate_ms {
            return Ok(None);
        }
        let elapsed = aligned_now - program.last_allocate_ms;
        let price_index = if self.total_active_shares > 0 {
            let accrued =
                index_math::accrued_over_window(program.config.period_amount, elapsed, interval_ms);
            let delta = index_math::index_delta(accrued, self.total_active_shares)?;
            program
                .price_index
                .checked_add(delta)
                .ok_or(StakingError::ArithmeticOverflow)?
        } else {
            program.price_index
        };
        Ok(Some((aligned_now, price_index)))
    }

    /// Current per-program price indexes, keyed by stable id.
    fn index_snapshot(&self) -> BTreeMap<ProgramId, u64> {
        self.programs
            .iter()
            .map(|p| (p.id, p.price_index))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Lookup & accessors
    // -----------------------------------------------------------------------

    fn program(&self, program_idx: usize) -> Result<&IncentiveProgram, StakingError> {
        self.programs
            .get(program_idx)
            .ok_or(StakingError::IncentiveNotFound { program_idx })
    }

    fn program_mut(&mut self, program_idx: usize) -> Result<&mut IncentiveProgram, StakingError> {
        self.programs
            .get_mut(program_idx)
            .ok_or(StakingError::IncentiveNotFound { program_idx })
    }

    fn ledger(&self, user: &UserId) -> Result<&UserShareLedger, StakingError> {
        let ledger = self
            .user_shares
            .get(user)
            .ok_or(StakingError::UserShareNotFound { user: *user })?;
        if ledger.user != *user {
            return Err(StakingError::UserMismatch {
                recorded: ledger.user,
                caller: *user,
            });
        }
        Ok(ledger)
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn stake_token_type(&self) -> &TokenType {
        &self.stake_token_type
    }

    pub fn unlock_countdown_ms(&self) -> u64 {
        self.unlock_countdown_ms
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn total_active_shares(&self) -> u64 {
        self.total_active_shares
    }

    pub fn stake_balance(&self) -> &Balance {
        &self.stake_balance
    }

    pub fn programs(&self) -> &[IncentiveProgram] {
        &self.programs
    }

    pub fn user_ledger(&self, user: &UserId) -> Option<&UserShareLedger> {
        self.user_shares.get(user)
    }

    pub fn ledgers(&self) -> impl Iterator<Item = &UserShareLedger> {
        self.user_shares.values()
    }

    /// Drains the pending event queue.
    pub fn take_events(&mut self) -> Vec<StakingEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending events without draining them.
    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }
}
