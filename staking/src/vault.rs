//! Staking vault: escrow, accrual and lock enforcement
//!
//! The vault identity owns escrowed assets in the registry and must be
//! registered fee-exempt in the ledger so reward payouts move fee-free.
//! Every operation checks its preconditions before the first effect; the
//! reward leg runs before any position or registry mutation so a failed
//! payout aborts the whole operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ledger::SharedLedger;
use marketplace::SharedMarketplace;

use crate::error::{Result, StakingError};
use crate::position::StakePosition;

/// Committed staking events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeEvent {
    Staked { id: u64, staker: String },
    Claimed { id: u64, amount: u64 },
    Unstaked { id: u64, staker: String },
}

pub struct StakingVault {
    /// Escrow identity in the registry and settlement operator in the ledger.
    identity: String,
    marketplace: SharedMarketplace,
    ledger: SharedLedger,
    /// Ledger account rewards are paid from; funded by the DAO.
    reward_pool: String,
    /// Reward units accrued per second per staked asset.
    reward_rate: u64,
    lock_duration: u64,
    positions: HashMap<u64, StakePosition>,
    events: Vec<StakeEvent>,
}

impl StakingVault {
    pub fn new(
        identity: &str,
        marketplace: SharedMarketplace,
        ledger: SharedLedger,
        reward_pool: &str,
        reward_rate: u64,
        lock_duration: u64,
    ) -> Self {
        StakingVault {
            identity: identity.to_string(),
            marketplace,
            ledger,
            reward_pool: reward_pool.to_string(),
            reward_rate,
            lock_duration,
            positions: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Escrow `id` with the vault and open a position for the caller.
    pub fn stake(&mut self, caller: &str, id: u64, now: u64) -> Result<()> {
        if self.positions.get(&id).is_some_and(|p| p.active) {
            return Err(StakingError::AlreadyStaked(id));
        }

        // Ownership check and listing cleanup happen inside the registry
        // transfer; a non-owner caller aborts here with no state change.
        self.marketplace
            .write()
            .unwrap()
            .transfer_asset(caller, id, &self.identity)?;

        self.positions
            .insert(id, StakePosition::new(id, caller, now, self.lock_duration));
        self.events.push(StakeEvent::Staked {
            id,
            staker: caller.to_string(),
        });
        log::debug!("asset {} staked by {} at {}", id, caller, now);
        Ok(())
    }

    /// Pay out the reward accrued since the last claim and advance the
    /// claim cursor to `now`. Returns the amount paid.
    pub fn claim_reward(&mut self, caller: &str, id: u64, now: u64) -> Result<u64> {
        let position = self.active_position(id)?;
        if position.staker != caller {
            return Err(StakingError::NotStaker(id));
        }
        let reward = position.accrued(now, self.reward_rate)?;

        if reward > 0 {
            self.ledger.write().unwrap().transfer_exempt(
                &self.identity,
                &self.reward_pool,
                caller,
                reward,
            )?;
        }

        // The cursor advances to the claim time, so a repeated claim can
        // never pay the same interval twice.
        if let Some(position) = self.positions.get_mut(&id) {
            position.last_claim_at = now;
        }
        self.events.push(StakeEvent::Claimed { id, amount: reward });
        Ok(reward)
    }

    /// Return the asset to its staker after the lock expires, settling any
    /// unclaimed reward on the way out.
    pub fn unstake(&mut self, caller: &str, id: u64, now: u64) -> Result<()> {
        let position = self.active_position(id)?;
        if position.staker != caller {
            return Err(StakingError::NotStaker(id));
        }
        if !position.is_unlocked(now) {
            return Err(StakingError::StillLocked {
                asset_id: id,
                unlock_at: position.unlock_at(),
            });
        }
        let staker = position.staker.clone();
        let reward = position.accrued(now, self.reward_rate)?;

        if reward > 0 {
            self.ledger.write().unwrap().transfer_exempt(
                &self.identity,
                &self.reward_pool,
                &staker,
                reward,
            )?;
        }

        self.marketplace
            .write()
            .unwrap()
            .transfer_asset(&self.identity, id, &staker)?;

        if let Some(position) = self.positions.get_mut(&id) {
            position.last_claim_at = now;
            position.active = false;
        }
        if reward > 0 {
            self.events.push(StakeEvent::Claimed { id, amount: reward });
        }
        self.events.push(StakeEvent::Unstaked { id, staker });
        log::debug!("asset {} unstaked at {} (reward {})", id, now, reward);
        Ok(())
    }

    /// Reward accrued but not yet claimed for an active position.
    pub fn pending_reward(&self, id: u64, now: u64) -> Result<u64> {
        self.active_position(id)?.accrued(now, self.reward_rate)
    }

    pub fn position(&self, id: u64) -> Option<&StakePosition> {
        self.positions.get(&id)
    }

    pub fn reward_rate(&self) -> u64 {
        self.reward_rate
    }

    pub fn lock_duration(&self) -> u64 {
        self.lock_duration
    }

    pub fn events(&self) -> &[StakeEvent] {
        &self.events
    }

    fn active_position(&self, id: u64) -> Result<&StakePosition> {
        self.positions
            .get(&id)
            .filter(|p| p.active)
            .ok_or(StakingError::NotStaked(id))
    }
}
