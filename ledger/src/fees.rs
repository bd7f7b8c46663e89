//! Transfer fee schedule and split math

use serde::{Deserialize, Serialize};

use crate::constants::{BPS_DENOMINATOR, DEFAULT_BURN_RATE_BPS, DEFAULT_DEV_RATE_BPS};

/// Fee rates applied to every non-exempt transfer, in basis points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub burn_rate_bps: u64,
    pub dev_rate_bps: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            burn_rate_bps: DEFAULT_BURN_RATE_BPS,
            dev_rate_bps: DEFAULT_DEV_RATE_BPS,
        }
    }
}

/// The three-way partition of a transferred amount.
///
/// Invariant: `burn + dev + net == amount` for the amount the split was
/// computed from. Truncation remainders fold into `net`, never get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub burn: u64,
    pub dev: u64,
    pub net: u64,
}

impl FeeSchedule {
    /// Split `amount` into burn, dev and net portions with integer truncation.
    pub fn split(&self, amount: u64) -> FeeSplit {
        let burn = bps_of(amount, self.burn_rate_bps);
        let dev = bps_of(amount, self.dev_rate_bps);
        FeeSplit {
            burn,
            dev,
            net: amount - burn - dev,
        }
    }

    /// A split with no fees taken (exempt transfers).
    pub fn exempt(amount: u64) -> FeeSplit {
        FeeSplit {
            burn: 0,
            dev: 0,
            net: amount,
        }
    }
}

/// `amount * rate_bps / 10_000`, truncating. Widened to u128 so the
/// intermediate product cannot overflow for any u64 amount.
pub fn bps_of(amount: u64, rate_bps: u64) -> u64 {
    (amount as u128 * rate_bps as u128 / BPS_DENOMINATOR as u128) as u64
}

impl FeeSplit {
    pub fn total(&self) -> u64 {
        self.burn + self.dev + self.net
    }
}
