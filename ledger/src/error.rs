//! Ledger error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Ledger already initialized")]
    AlreadyInitialized,

    #[error("Ledger not initialized")]
    NotInitialized,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Cap exceeded: {0}")]
    CapExceeded(String),

    #[error("Amount overflow")]
    Overflow,

    #[error("Distribution proof rejected for {0}")]
    InvalidProof(String),

    #[error("Distribution already claimed by {0}")]
    AlreadyClaimed(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
