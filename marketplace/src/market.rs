//! Listing and purchase settlement
//!
//! Each public operation is one logical transaction: preconditions are
//! checked before any effect, the ledger guard is held across both payment
//! legs, and events are appended only after the last mutation. No caller
//! code runs mid-operation.

use serde::{Deserialize, Serialize};

use ledger::constants::COIN;
use ledger::fees::bps_of;
use ledger::SharedLedger;

use crate::error::{MarketError, Result};
use crate::registry::{AssetRegistry, Listing};

/// Sale fee charged as marketplace revenue (0.75%).
pub const DEFAULT_SALE_FEE_BPS: u64 = 75;

/// Flat listing fee payable by the buyer at settlement (1 token).
pub const DEFAULT_LISTING_FEE: u64 = COIN;

/// Privileged identities, fixed at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub dao: String,
    pub dev_wallet: String,
}

/// Marketplace revenue schedule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketFees {
    pub sale_fee_bps: u64,
    pub listing_fee: u64,
}

impl Default for MarketFees {
    fn default() -> Self {
        MarketFees {
            sale_fee_bps: DEFAULT_SALE_FEE_BPS,
            listing_fee: DEFAULT_LISTING_FEE,
        }
    }
}

/// Committed marketplace events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    Minted { owner: String, id: u64, uri: String },
    Listed { id: u64, price: u64 },
    Purchased { buyer: String, id: u64, price: u64 },
    Cancelled { id: u64 },
}

/// Asset registry plus the listing/purchase state machine, settling through
/// a shared fee ledger.
pub struct Marketplace {
    /// Settlement identity; must be registered fee-exempt in the ledger so
    /// internal payment legs bypass the transfer fee.
    identity: String,
    ledger: SharedLedger,
    config: Option<MarketConfig>,
    fees: MarketFees,
    registry: AssetRegistry,
    events: Vec<MarketEvent>,
}

impl Marketplace {
    pub fn new(identity: &str, ledger: SharedLedger) -> Self {
        Marketplace {
            identity: identity.to_string(),
            ledger,
            config: None,
            fees: MarketFees::default(),
            registry: AssetRegistry::new(),
            events: Vec::new(),
        }
    }

    pub fn with_fees(identity: &str, ledger: SharedLedger, fees: MarketFees) -> Self {
        Marketplace {
            fees,
            ..Marketplace::new(identity, ledger)
        }
    }

    /// One-time wiring of the privileged identities.
    pub fn initialize(&mut self, dao: &str, dev_wallet: &str) -> Result<()> {
        if self.config.is_some() {
            return Err(MarketError::AlreadyInitialized);
        }
        self.config = Some(MarketConfig {
            dao: dao.to_string(),
            dev_wallet: dev_wallet.to_string(),
        });
        log::info!("marketplace initialized: dao={} dev_wallet={}", dao, dev_wallet);
        Ok(())
    }

    /// DAO-only: register a new asset owned by the caller.
    pub fn mint(&mut self, caller: &str, uri: &str) -> Result<u64> {
        let config = self.require_initialized()?;
        if caller != config.dao {
            return Err(MarketError::NotAuthorized(format!(
                "{} may not mint",
                caller
            )));
        }

        let id = self.registry.mint(caller, uri);
        self.events.push(MarketEvent::Minted {
            owner: caller.to_string(),
            id,
            uri: uri.to_string(),
        });
        log::debug!("minted asset {} for {}", id, caller);
        Ok(id)
    }

    /// Publish (or replace) a fixed-price listing. Listing an already-listed
    /// asset overwrites the previous listing: an implicit cancel-and-relist.
    pub fn list(&mut self, caller: &str, id: u64, price: u64) -> Result<()> {
        self.require_initialized()?;
        if price == 0 {
            return Err(MarketError::InvalidPrice(price));
        }

        let asset = self.registry.get_mut(id)?;
        if asset.owner != caller {
            return Err(MarketError::NotOwner(id));
        }

        asset.listing = Some(Listing {
            price,
            seller: caller.to_string(),
        });
        self.events.push(MarketEvent::Listed { id, price });
        Ok(())
    }

    /// Withdraw a listing. Only the listing's seller may cancel.
    pub fn cancel_listing(&mut self, caller: &str, id: u64) -> Result<()> {
        self.require_initialized()?;

        let asset = self.registry.get_mut(id)?;
        let listing = asset.listing.as_ref().ok_or(MarketError::NotListed(id))?;
        if listing.seller != caller {
            return Err(MarketError::NotOwner(id));
        }
        asset.listing = None;

        self.events.push(MarketEvent::Cancelled { id });
        Ok(())
    }

    /// Settle a purchase: payment legs and ownership transfer commit
    /// together or not at all.
    ///
    /// The buyer pays `price + listing_fee`. The seller receives
    /// `price - sale_fee`; `sale_fee + listing_fee` go to the dev wallet.
    /// Both legs run fee-exempt through the settlement identity.
    pub fn purchase(&mut self, buyer: &str, id: u64) -> Result<()> {
        let config = self.require_initialized()?;
        let dev_wallet = config.dev_wallet.clone();

        let asset = self.registry.get(id)?;
        let listing = asset
            .listing
            .clone()
            .ok_or(MarketError::NotListed(id))?;
        if listing.seller == buyer {
            return Err(MarketError::NotAuthorized(
                "seller cannot purchase own listing".to_string(),
            ));
        }

        let sale_fee = bps_of(listing.price, self.fees.sale_fee_bps);
        let required = listing
            .price
            .checked_add(self.fees.listing_fee)
            .ok_or(MarketError::Overflow)?;

        {
            let mut ledger = self.ledger.write().unwrap();

            // All settlement preconditions are checked before the first leg
            // moves funds, so a failure here aborts with no state change.
            let available = ledger.balance_of(buyer);
            if available < required {
                return Err(MarketError::InsufficientBalance {
                    required,
                    available,
                });
            }

            ledger.transfer_exempt(
                &self.identity,
                buyer,
                &listing.seller,
                listing.price - sale_fee,
            )?;
            ledger.transfer_exempt(
                &self.identity,
                buyer,
                &dev_wallet,
                sale_fee + self.fees.listing_fee,
            )?;
        }

        self.registry.transfer(id, buyer)?;

        self.events.push(MarketEvent::Purchased {
            buyer: buyer.to_string(),
            id,
            price: listing.price,
        });
        log::debug!(
            "asset {} sold to {} for {} (fee {})",
            id,
            buyer,
            listing.price,
            sale_fee
        );
        Ok(())
    }

    /// Raw ownership transfer outside the purchase path. The registry
    /// clears any live listing as part of the transfer.
    pub fn transfer_asset(&mut self, caller: &str, id: u64, to: &str) -> Result<()> {
        self.require_initialized()?;
        if self.registry.owner_of(id)? != caller {
            return Err(MarketError::NotOwner(id));
        }
        self.registry.transfer(id, to)
    }

    pub fn owner_of(&self, id: u64) -> Result<&str> {
        self.registry.owner_of(id)
    }

    pub fn token_uri(&self, id: u64) -> Result<&str> {
        Ok(self.registry.get(id)?.uri.as_str())
    }

    pub fn get_listing(&self, id: u64) -> Result<Option<&Listing>> {
        Ok(self.registry.get(id)?.listing.as_ref())
    }

    pub fn asset_count(&self) -> u64 {
        self.registry.count()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn fees(&self) -> &MarketFees {
        &self.fees
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    fn require_initialized(&self) -> Result<&MarketConfig> {
        self.config.as_ref().ok_or(MarketError::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ledger::{AcceptAllVerifier, Allocation, FeeLedger, FeeSchedule, LedgerInit};

    const CAP: u64 = 1_000_000 * COIN;

    fn setup() -> (SharedLedger, Marketplace) {
        let mut raw = FeeLedger::new(FeeSchedule::default());
        raw.initialize(
            LedgerInit {
                cap: CAP,
                dao: "dao".to_string(),
                fee_sink: "community".to_string(),
                dev_wallet: "deployer".to_string(),
                allocations: vec![Allocation {
                    identity: "dao".to_string(),
                    share_bps: 1_000,
                }],
                claim_allotment_bps: 0,
            },
            Arc::new(AcceptAllVerifier),
        )
        .unwrap();
        raw.set_fee_exempt("dao", "market", true).unwrap();
        // fund the buyer without fee noise
        raw.transfer_exempt("market", "deployer", "buyer", 1_000 * COIN)
            .unwrap();

        let shared = ledger::shared(raw);
        let mut market = Marketplace::new("market", shared.clone());
        market.initialize("dao", "dev").unwrap();
        (shared, market)
    }

    #[test]
    fn test_mint_is_dao_only() {
        let (_, mut market) = setup();

        let err = market.mint("buyer", "ipfs://x").unwrap_err();
        assert!(matches!(err, MarketError::NotAuthorized(_)));

        let id = market.mint("dao", "ipfs://x").unwrap();
        assert_eq!(id, 1);
        assert_eq!(market.owner_of(1).unwrap(), "dao");
        assert_eq!(market.token_uri(1).unwrap(), "ipfs://x");
        assert_eq!(
            market.events()[0],
            MarketEvent::Minted {
                owner: "dao".to_string(),
                id: 1,
                uri: "ipfs://x".to_string()
            }
        );
    }

    #[test]
    fn test_operations_require_initialization() {
        let (shared, _) = setup();
        let mut fresh = Marketplace::new("market", shared);
        assert!(matches!(
            fresh.mint("dao", "ipfs://x").unwrap_err(),
            MarketError::NotInitialized
        ));
        assert!(matches!(
            fresh.initialize("dao", "dev"),
            Ok(())
        ));
        assert!(matches!(
            fresh.initialize("dao", "dev").unwrap_err(),
            MarketError::AlreadyInitialized
        ));
    }

    #[test]
    fn test_list_requires_owner_and_positive_price() {
        let (_, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();

        assert!(matches!(
            market.list("buyer", id, 100).unwrap_err(),
            MarketError::NotOwner(_)
        ));
        assert!(matches!(
            market.list("dao", id, 0).unwrap_err(),
            MarketError::InvalidPrice(0)
        ));

        market.list("dao", id, 100 * COIN).unwrap();
        assert_eq!(
            market.get_listing(id).unwrap().unwrap().price,
            100 * COIN
        );
    }

    #[test]
    fn test_relist_overwrites() {
        let (_, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        market.list("dao", id, 100).unwrap();
        market.list("dao", id, 250).unwrap();
        assert_eq!(market.get_listing(id).unwrap().unwrap().price, 250);
    }

    #[test]
    fn test_cancel_listing() {
        let (_, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();

        assert!(matches!(
            market.cancel_listing("dao", id).unwrap_err(),
            MarketError::NotListed(_)
        ));

        market.list("dao", id, 100).unwrap();
        assert!(matches!(
            market.cancel_listing("buyer", id).unwrap_err(),
            MarketError::NotOwner(_)
        ));

        market.cancel_listing("dao", id).unwrap();
        assert!(market.get_listing(id).unwrap().is_none());
    }

    #[test]
    fn test_purchase_settles_atomically() {
        let (shared, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        let price = 100 * COIN;
        market.list("dao", id, price).unwrap();

        market.purchase("buyer", id).unwrap();

        assert_eq!(market.owner_of(id).unwrap(), "buyer");
        assert!(market.get_listing(id).unwrap().is_none());

        let ledger = shared.read().unwrap();
        let sale_fee = price * 75 / 10_000;
        assert_eq!(ledger.balance_of("dao"), CAP / 10 + price - sale_fee);
        assert_eq!(ledger.balance_of("dev"), sale_fee + COIN);
        assert_eq!(ledger.balance_of("buyer"), 1_000 * COIN - price - COIN);
    }

    #[test]
    fn test_purchase_unlisted_fails() {
        let (_, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        assert!(matches!(
            market.purchase("buyer", id).unwrap_err(),
            MarketError::NotListed(_)
        ));
    }

    #[test]
    fn test_second_purchase_fails_not_listed() {
        let (shared, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        market.list("dao", id, 10 * COIN).unwrap();

        // fund a second buyer
        shared
            .write()
            .unwrap()
            .transfer_exempt("market", "deployer", "rival", 100 * COIN)
            .unwrap();

        market.purchase("buyer", id).unwrap();
        assert!(matches!(
            market.purchase("rival", id).unwrap_err(),
            MarketError::NotListed(_)
        ));
    }

    #[test]
    fn test_purchase_insufficient_balance_leaves_state_untouched() {
        let (shared, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        market.list("dao", id, 5_000 * COIN).unwrap();

        let err = market.purchase("buyer", id).unwrap_err();
        assert!(matches!(err, MarketError::InsufficientBalance { .. }));

        assert_eq!(market.owner_of(id).unwrap(), "dao");
        assert!(market.get_listing(id).unwrap().is_some());
        assert_eq!(shared.read().unwrap().balance_of("buyer"), 1_000 * COIN);
    }

    #[test]
    fn test_seller_cannot_buy_own_listing() {
        let (_, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        market.list("dao", id, 10).unwrap();
        assert!(matches!(
            market.purchase("dao", id).unwrap_err(),
            MarketError::NotAuthorized(_)
        ));
    }

    #[test]
    fn test_raw_transfer_clears_listing() {
        let (_, mut market) = setup();
        let id = market.mint("dao", "ipfs://x").unwrap();
        market.list("dao", id, 100).unwrap();

        assert!(matches!(
            market.transfer_asset("buyer", id, "buyer").unwrap_err(),
            MarketError::NotOwner(_)
        ));

        market.transfer_asset("dao", id, "buyer").unwrap();
        assert_eq!(market.owner_of(id).unwrap(), "buyer");
        assert!(market.get_listing(id).unwrap().is_none());

        // the stale listing cannot be purchased from the old seller
        assert!(matches!(
            market.purchase("rival", id).unwrap_err(),
            MarketError::NotListed(_)
        ));
    }
}
