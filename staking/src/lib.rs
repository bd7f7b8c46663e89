//! Time-locked asset staking
//!
//! Escrows a registry asset with the vault for a fixed lock duration and
//! accrues a linear reward paid from a ledger reward pool. The lock cannot
//! be bypassed early and repeated claims never double-pay: the claim cursor
//! always advances to the claim time.

pub mod error;
pub mod position;
pub mod vault;

pub use error::{Result, StakingError};
pub use position::StakePosition;
pub use vault::{StakeEvent, StakingVault};
