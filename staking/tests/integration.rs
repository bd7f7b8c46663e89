//! Full engine flow: ledger initialization, marketplace settlement and a
//! staking round trip, all against one shared ledger.

use std::sync::Arc;

use ledger::constants::COIN;
use ledger::{AcceptAllVerifier, Allocation, FeeLedger, FeeSchedule, LedgerInit, SharedLedger};
use marketplace::{Marketplace, SharedMarketplace};
use staking::{StakingError, StakingVault};

const CAP: u64 = 1_000_000_000 * COIN;
const LOCK: u64 = 86_400;
const RATE: u64 = COIN / 100;

fn deploy() -> (SharedLedger, SharedMarketplace, StakingVault) {
    let mut raw = FeeLedger::new(FeeSchedule::default());
    raw.initialize(
        LedgerInit {
            cap: CAP,
            dao: "dao".to_string(),
            fee_sink: "community".to_string(),
            dev_wallet: "deployer".to_string(),
            allocations: vec![
                Allocation {
                    identity: "timelock".to_string(),
                    share_bps: 1_500,
                },
                Allocation {
                    identity: "community".to_string(),
                    share_bps: 1_500,
                },
                Allocation {
                    identity: "dao".to_string(),
                    share_bps: 1_000,
                },
            ],
            claim_allotment_bps: 0,
        },
        Arc::new(AcceptAllVerifier),
    )
    .unwrap();
    raw.set_fee_exempt("dao", "market", true).unwrap();
    raw.set_fee_exempt("dao", "vault", true).unwrap();

    let shared = ledger::shared(raw);
    let mut market = Marketplace::new("market", shared.clone());
    market.initialize("dao", "dev").unwrap();
    let market = marketplace::shared(market);

    let vault = StakingVault::new("vault", market.clone(), shared.clone(), "dao", RATE, LOCK);
    (shared, market, vault)
}

#[test]
fn test_purchase_then_stake_round_trip() {
    let (shared, market, mut vault) = deploy();

    // fund the buyer through a normal (fee-bearing) transfer
    shared
        .write()
        .unwrap()
        .transfer("deployer", "buyer", 1_000 * COIN)
        .unwrap();

    let price = 100 * COIN;
    let id = {
        let mut market = market.write().unwrap();
        let id = market.mint("dao", "ipfs://asset").unwrap();
        market.list("dao", id, price).unwrap();
        market.purchase("buyer", id).unwrap();
        id
    };
    assert_eq!(market.read().unwrap().owner_of(id).unwrap(), "buyer");

    vault.stake("buyer", id, 10_000).unwrap();
    assert_eq!(market.read().unwrap().owner_of(id).unwrap(), "vault");

    // immediate unstake is refused
    assert!(matches!(
        vault.unstake("buyer", id, 10_000).unwrap_err(),
        StakingError::StillLocked { .. }
    ));

    // at exactly the lock boundary the asset comes back with a full reward
    let balance_before = shared.read().unwrap().balance_of("buyer");
    vault.unstake("buyer", id, 10_000 + LOCK).unwrap();

    assert_eq!(market.read().unwrap().owner_of(id).unwrap(), "buyer");
    assert_eq!(
        shared.read().unwrap().balance_of("buyer"),
        balance_before + LOCK * RATE
    );
}

#[test]
fn test_value_is_conserved_across_settlement() {
    let (shared, market, mut vault) = deploy();

    shared
        .write()
        .unwrap()
        .transfer("deployer", "buyer", 1_000 * COIN)
        .unwrap();

    let id = {
        let mut market = market.write().unwrap();
        let id = market.mint("dao", "ipfs://asset").unwrap();
        market.list("dao", id, 50 * COIN).unwrap();
        market.purchase("buyer", id).unwrap();
        id
    };
    vault.stake("buyer", id, 0).unwrap();
    vault.claim_reward("buyer", id, LOCK / 2).unwrap();
    vault.unstake("buyer", id, LOCK).unwrap();

    let ledger = shared.read().unwrap();
    // the only supply change is the burn from the one fee-bearing transfer
    let burned = 1_000 * COIN * 50 / 10_000;
    assert_eq!(ledger.total_supply(), CAP - burned);
    assert!(ledger.total_supply() <= ledger.cap());

    let held: u64 = [
        "dao",
        "community",
        "timelock",
        "deployer",
        "buyer",
        "dev",
        "market",
        "vault",
    ]
    .iter()
    .map(|id| ledger.balance_of(id))
    .sum();
    assert_eq!(held, ledger.total_supply());
}

#[test]
fn test_snapshot_observes_settled_state() {
    let (shared, market, mut vault) = deploy();

    shared
        .write()
        .unwrap()
        .transfer_exempt("market", "deployer", "buyer", 10 * COIN)
        .unwrap();

    let id = {
        let mut market = market.write().unwrap();
        let id = market.mint("dao", "ipfs://asset").unwrap();
        market.list("dao", id, 5 * COIN).unwrap();
        market.purchase("buyer", id).unwrap();
        id
    };
    vault.stake("buyer", id, 100).unwrap();

    let snap_id = shared.write().unwrap().snapshot("dao", 200).unwrap();
    let ledger = shared.read().unwrap();
    let snap = ledger.get_snapshot(snap_id).unwrap();
    assert_eq!(snap.balance_of("buyer"), ledger.balance_of("buyer"));
    assert_eq!(snap.total(), ledger.total_supply());
}
