//! Non-fungible asset registry and marketplace
//!
//! Owns asset identity, ownership and listing state, and settles purchases
//! through the shared fee ledger atomically with the ownership transfer.
//! Settlement legs run fee-exempt so the ledger's transfer fee does not
//! corrode seller proceeds.

pub mod error;
pub mod market;
pub mod registry;

pub use error::{MarketError, Result};
pub use market::{MarketConfig, MarketEvent, MarketFees, Marketplace};
pub use registry::{Asset, AssetRegistry, Listing};

use std::sync::{Arc, RwLock};

/// Shared handle to a marketplace, injected into the staking vault.
pub type SharedMarketplace = Arc<RwLock<Marketplace>>;

/// Wrap a marketplace in a shared handle.
pub fn shared(market: Marketplace) -> SharedMarketplace {
    Arc::new(RwLock::new(market))
}
