//! Marketplace error types

use ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Marketplace already initialized")]
    AlreadyInitialized,

    #[error("Marketplace not initialized")]
    NotInitialized,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Not token owner: asset {0}")]
    NotOwner(u64),

    #[error("Unknown asset: {0}")]
    UnknownAsset(u64),

    #[error("Asset not listed: {0}")]
    NotListed(u64),

    #[error("Invalid price: {0}")]
    InvalidPrice(u64),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("Amount overflow")]
    Overflow,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, MarketError>;
