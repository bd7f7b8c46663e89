//! Fee ledger state machine
//!
//! Every public operation is one logical transaction: all precondition
//! reads happen before any effect, and every effect is applied before the
//! operation returns. Events are appended only after the last state
//! mutation, so no external observer can see a half-applied operation and
//! no caller-supplied code ever runs mid-operation.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::claims::ClaimVerifier;
use crate::constants::BPS_DENOMINATOR;
use crate::error::{LedgerError, Result};
use crate::fees::{bps_of, FeeSchedule, FeeSplit};
use crate::snapshot::Snapshot;

/// A fixed-percentage allocation bucket minted at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub identity: String,
    pub share_bps: u64,
}

/// Initialization parameters for [`FeeLedger::initialize`].
///
/// Reference deployment: cap of 1e9 whole tokens, timelock 15%, community
/// wallet 15%, DAO 10%, remainder to the deployer bucket.
#[derive(Debug, Clone)]
pub struct LedgerInit {
    pub cap: u64,
    pub dao: String,
    pub fee_sink: String,
    pub dev_wallet: String,
    pub allocations: Vec<Allocation>,
    /// Share of the cap reserved for proof-gated distribution claims.
    pub claim_allotment_bps: u64,
}

/// Privileged identities and the immutable cap, fixed at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub cap: u64,
    pub dao: String,
    pub fee_sink: String,
    pub dev_wallet: String,
}

/// Committed ledger events, appended after each operation's mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Transfer { from: String, to: String, net: u64 },
    Snapshot { id: u64 },
    Claimed { identity: String, amount: u64 },
    FeeExemptionSet { identity: String, exempt: bool },
}

/// Capped-supply fungible ledger with a mandatory fee split on transfers.
pub struct FeeLedger {
    config: Option<LedgerConfig>,
    schedule: FeeSchedule,
    balances: HashMap<String, u64>,
    total_supply: u64,
    /// Units minted into the distribution reserve but not yet claimed.
    /// Counted in `total_supply` but held by no account.
    unclaimed_allotment: u64,
    claimed: HashSet<String>,
    fee_exempt: HashSet<String>,
    snapshots: Vec<Snapshot>,
    events: Vec<LedgerEvent>,
    verifier: Option<Arc<dyn ClaimVerifier>>,
}

impl FeeLedger {
    pub fn new(schedule: FeeSchedule) -> Self {
        FeeLedger {
            config: None,
            schedule,
            balances: HashMap::new(),
            total_supply: 0,
            unclaimed_allotment: 0,
            claimed: HashSet::new(),
            fee_exempt: HashSet::new(),
            snapshots: Vec::new(),
            events: Vec::new(),
            verifier: None,
        }
    }

    /// One-time mint of exactly `cap` units across the allocation buckets,
    /// the claim allotment, and a deployer-bucket remainder.
    pub fn initialize(&mut self, init: LedgerInit, verifier: Arc<dyn ClaimVerifier>) -> Result<()> {
        if self.config.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }

        let share_total: u64 = init
            .allocations
            .iter()
            .map(|a| a.share_bps)
            .sum::<u64>()
            .checked_add(init.claim_allotment_bps)
            .ok_or(LedgerError::Overflow)?;
        if share_total > BPS_DENOMINATOR {
            return Err(LedgerError::CapExceeded(format!(
                "allocation shares total {} bps",
                share_total
            )));
        }

        let mut credited: u64 = 0;
        for alloc in &init.allocations {
            let amount = bps_of(init.cap, alloc.share_bps);
            self.credit(&alloc.identity, amount);
            credited += amount;
        }

        self.unclaimed_allotment = bps_of(init.cap, init.claim_allotment_bps);

        // Truncation from the bps math lands in the deployer bucket, so the
        // minted total is exactly the cap.
        let remainder = init.cap - credited - self.unclaimed_allotment;
        self.credit(&init.dev_wallet, remainder);

        self.total_supply = init.cap;
        self.verifier = Some(verifier);
        self.config = Some(LedgerConfig {
            cap: init.cap,
            dao: init.dao,
            fee_sink: init.fee_sink,
            dev_wallet: init.dev_wallet,
        });

        log::info!(
            "ledger initialized: cap={} allotment={}",
            init.cap,
            self.unclaimed_allotment
        );
        Ok(())
    }

    /// Move `amount` from `from` to `to`, applying the fee split unless
    /// `from` is fee-exempt. Returns the split actually applied.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64) -> Result<FeeSplit> {
        let config = self.require_initialized()?;
        let fee_sink = config.fee_sink.clone();

        let split = if self.fee_exempt.contains(from) {
            FeeSchedule::exempt(amount)
        } else {
            self.schedule.split(amount)
        };

        self.debit(from, amount)?;
        self.credit(to, split.net);
        self.credit(&fee_sink, split.dev);
        self.total_supply -= split.burn;

        self.events.push(LedgerEvent::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            net: split.net,
        });
        log::debug!("transfer {} -> {}: net {} burn {}", from, to, split.net, split.burn);
        Ok(split)
    }

    /// Fee-free settlement leg driven by a registered internal mover
    /// (marketplace settlement, staking payouts). The operator must be in
    /// the fee-exempt set; the funds still move from `from`.
    pub fn transfer_exempt(
        &mut self,
        operator: &str,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<()> {
        self.require_initialized()?;
        if !self.fee_exempt.contains(operator) {
            return Err(LedgerError::NotAuthorized(format!(
                "{} is not a registered settlement operator",
                operator
            )));
        }

        self.debit(from, amount)?;
        self.credit(to, amount);

        self.events.push(LedgerEvent::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            net: amount,
        });
        Ok(())
    }

    /// DAO-managed fee-exemption capability set.
    pub fn set_fee_exempt(&mut self, caller: &str, identity: &str, exempt: bool) -> Result<()> {
        let config = self.require_initialized()?;
        if caller != config.dao {
            return Err(LedgerError::NotAuthorized(format!(
                "{} may not manage fee exemptions",
                caller
            )));
        }

        if exempt {
            self.fee_exempt.insert(identity.to_string());
        } else {
            self.fee_exempt.remove(identity);
        }

        self.events.push(LedgerEvent::FeeExemptionSet {
            identity: identity.to_string(),
            exempt,
        });
        Ok(())
    }

    /// Release units from the distribution allotment against an external
    /// proof. Each identity can claim at most once; supply is unchanged
    /// because the allotment was minted at initialization.
    pub fn claim(&mut self, identity: &str, amount: u64, proof: &[u8]) -> Result<()> {
        self.require_initialized()?;
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(LedgerError::NotInitialized)?
            .clone();

        if self.claimed.contains(identity) {
            return Err(LedgerError::AlreadyClaimed(identity.to_string()));
        }
        if !verifier.verify_claim(identity, amount, proof) {
            return Err(LedgerError::InvalidProof(identity.to_string()));
        }
        if amount > self.unclaimed_allotment {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.unclaimed_allotment,
            });
        }

        self.unclaimed_allotment -= amount;
        self.credit(identity, amount);
        self.claimed.insert(identity.to_string());

        self.events.push(LedgerEvent::Claimed {
            identity: identity.to_string(),
            amount,
        });
        log::info!("distribution claim: {} received {}", identity, amount);
        Ok(())
    }

    /// DAO-only: append an immutable balance-table copy with the next
    /// monotonic snapshot id. Returns the new id.
    pub fn snapshot(&mut self, caller: &str, now: u64) -> Result<u64> {
        let config = self.require_initialized()?;
        if caller != config.dao {
            return Err(LedgerError::NotAuthorized(format!(
                "{} may not snapshot",
                caller
            )));
        }

        let id = self.snapshots.len() as u64 + 1;
        self.snapshots.push(Snapshot {
            id,
            taken_at: now,
            balances: self.balances.clone(),
        });

        self.events.push(LedgerEvent::Snapshot { id });
        log::info!("snapshot {} taken at {}", id, now);
        Ok(id)
    }

    pub fn balance_of(&self, identity: &str) -> u64 {
        self.balances.get(identity).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn cap(&self) -> u64 {
        self.config.as_ref().map_or(0, |c| c.cap)
    }

    pub fn unclaimed_allotment(&self) -> u64 {
        self.unclaimed_allotment
    }

    pub fn is_fee_exempt(&self, identity: &str) -> bool {
        self.fee_exempt.contains(identity)
    }

    pub fn snapshot_count(&self) -> u64 {
        self.snapshots.len() as u64
    }

    pub fn get_snapshot(&self, id: u64) -> Option<&Snapshot> {
        id.checked_sub(1).and_then(|i| self.snapshots.get(i as usize))
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn config(&self) -> Option<&LedgerConfig> {
        self.config.as_ref()
    }

    fn require_initialized(&self) -> Result<&LedgerConfig> {
        self.config.as_ref().ok_or(LedgerError::NotInitialized)
    }

    fn credit(&mut self, identity: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        *self.balances.entry(identity.to_string()).or_insert(0) += amount;
    }

    fn debit(&mut self, identity: &str, amount: u64) -> Result<()> {
        let available = self.balance_of(identity);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if let Some(balance) = self.balances.get_mut(identity) {
            *balance -= amount;
        }
        Ok(())
    }
}
