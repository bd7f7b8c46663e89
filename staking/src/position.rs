//! Stake positions and reward accrual

use serde::{Deserialize, Serialize};

use crate::error::{Result, StakingError};

/// One escrowed asset. While `active`, registry ownership of the asset is
/// held by the vault identity; the staker retains the right to reclaim it
/// once the lock expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakePosition {
    pub asset_id: u64,
    pub staker: String,
    pub staked_at: u64,
    /// Copied from the vault configuration at stake time; later vault
    /// reconfiguration never changes an open position.
    pub lock_duration: u64,
    pub last_claim_at: u64,
    pub active: bool,
}

impl StakePosition {
    pub fn new(asset_id: u64, staker: &str, now: u64, lock_duration: u64) -> Self {
        StakePosition {
            asset_id,
            staker: staker.to_string(),
            staked_at: now,
            lock_duration,
            last_claim_at: now,
            active: true,
        }
    }

    pub fn unlock_at(&self) -> u64 {
        self.staked_at + self.lock_duration
    }

    pub fn is_unlocked(&self, now: u64) -> bool {
        now >= self.unlock_at()
    }

    /// Linear accrual since the last claim. Timestamps are non-decreasing
    /// per the hosting transaction log, so elapsed time saturates at zero.
    pub fn accrued(&self, now: u64, reward_rate: u64) -> Result<u64> {
        let elapsed = now.saturating_sub(self.last_claim_at);
        elapsed
            .checked_mul(reward_rate)
            .ok_or(StakingError::Overflow)
    }
}
