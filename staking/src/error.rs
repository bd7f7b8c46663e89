//! Staking error types

use ledger::LedgerError;
use marketplace::MarketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StakingError {
    #[error("Asset already staked: {0}")]
    AlreadyStaked(u64),

    #[error("Asset not staked: {0}")]
    NotStaked(u64),

    #[error("Not the staker of asset {0}")]
    NotStaker(u64),

    #[error("Asset {asset_id} still locked until {unlock_at}")]
    StillLocked { asset_id: u64, unlock_at: u64 },

    #[error("Reward overflow")]
    Overflow,

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, StakingError>;
