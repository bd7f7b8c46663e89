//! Distribution claim verification
//!
//! The initial-distribution allotment is released against proofs checked by
//! an external collaborator. The ledger only consumes the boolean verdict;
//! proof construction and the commitment root live outside this crate.

/// External proof verifier consumed by [`crate::FeeLedger::claim`].
pub trait ClaimVerifier: Send + Sync {
    /// Returns true when `identity` is entitled to `amount` under `proof`.
    fn verify_claim(&self, identity: &str, amount: u64, proof: &[u8]) -> bool;
}

/// Verifier that accepts every claim. For deployments that reserve no
/// allotment, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllVerifier;

impl ClaimVerifier for AcceptAllVerifier {
    fn verify_claim(&self, _identity: &str, _amount: u64, _proof: &[u8]) -> bool {
        true
    }
}
