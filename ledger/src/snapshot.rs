//! Balance snapshots for external reward/airdrop computation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An immutable copy of the balance table at a point in time.
///
/// Snapshots are appended by the DAO and never mutated afterwards; ids are
/// assigned from a monotonic counter starting at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: u64,
    pub taken_at: u64,
    pub balances: HashMap<String, u64>,
}

impl Snapshot {
    pub fn balance_of(&self, identity: &str) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    /// Sum of all recorded balances.
    pub fn total(&self) -> u64 {
        self.balances.values().sum()
    }
}
