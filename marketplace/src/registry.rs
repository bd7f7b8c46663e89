//! Asset registry: identity, ownership, URIs and listing state
//!
//! Ids come from a monotonic counter starting at 1 and are never reused.
//! An asset carries at most one active listing, and the registry clears the
//! listing on every ownership change so `listing.seller == owner` holds at
//! all times regardless of how the transfer was driven.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{MarketError, Result};

/// A seller-published fixed-price offer for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub price: u64,
    pub seller: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub owner: String,
    pub uri: String,
    pub listing: Option<Listing>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: HashMap<u64, Asset>,
    next_id: u64,
}

impl AssetRegistry {
    pub fn new() -> Self {
        AssetRegistry {
            assets: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a new asset and return its id.
    pub fn mint(&mut self, owner: &str, uri: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.assets.insert(
            id,
            Asset {
                id,
                owner: owner.to_string(),
                uri: uri.to_string(),
                listing: None,
            },
        );
        id
    }

    pub fn get(&self, id: u64) -> Result<&Asset> {
        self.assets.get(&id).ok_or(MarketError::UnknownAsset(id))
    }

    pub fn get_mut(&mut self, id: u64) -> Result<&mut Asset> {
        self.assets.get_mut(&id).ok_or(MarketError::UnknownAsset(id))
    }

    pub fn owner_of(&self, id: u64) -> Result<&str> {
        Ok(self.get(id)?.owner.as_str())
    }

    /// Change ownership. Any live listing is cleared here, inside the
    /// registry, so a transfer outside the purchase path can never leave a
    /// stale listing behind.
    pub fn transfer(&mut self, id: u64, to: &str) -> Result<()> {
        let asset = self.get_mut(id)?;
        asset.owner = to.to_string();
        asset.listing = None;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.assets.len() as u64
    }
}
