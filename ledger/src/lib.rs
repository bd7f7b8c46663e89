//! Fee-bearing fungible ledger
//!
//! Capped-supply balance ledger with:
//! - A mandatory burn/dev fee split on every transfer
//! - Fee-exempt settlement transfers for registered internal movers
//! - A DAO-only snapshot capability for external reward computation
//! - A one-time proof-gated distribution path for the reserved allotment

pub mod claims;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod snapshot;

pub use claims::{AcceptAllVerifier, ClaimVerifier};
pub use error::{LedgerError, Result};
pub use fees::{FeeSchedule, FeeSplit};
pub use ledger::{Allocation, FeeLedger, LedgerConfig, LedgerEvent, LedgerInit};
pub use snapshot::Snapshot;

use std::sync::{Arc, RwLock};

/// Shared handle to a ledger, injected into the marketplace and staking
/// components at construction.
pub type SharedLedger = Arc<RwLock<FeeLedger>>;

/// Wrap a ledger in a shared handle.
pub fn shared(ledger: FeeLedger) -> SharedLedger {
    Arc::new(RwLock::new(ledger))
}

/// Ledger constants
pub mod constants {
    /// One whole token (8 decimal places)
    pub const COIN: u64 = 100_000_000;

    /// Basis-point denominator for all rate math
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Burn fee on transfers (0.5%)
    pub const DEFAULT_BURN_RATE_BPS: u64 = 50;

    /// Dev fee on transfers, paid to the fee sink (0.25%)
    pub const DEFAULT_DEV_RATE_BPS: u64 = 25;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_constants() {
        assert_eq!(constants::COIN, 100_000_000);
        assert_eq!(constants::BPS_DENOMINATOR, 10_000);
        assert_eq!(constants::DEFAULT_BURN_RATE_BPS, 50);
        assert_eq!(constants::DEFAULT_DEV_RATE_BPS, 25);
    }
}
