//! Integrity regimes for custodian event logs: Ed25519 signatures and
//! SHA-256 hash chaining. Both attach to an event as an `(author,
//! integrity)` pair computed over the event's canonical signing bytes;
//! neither regime depends on the shape of the event itself, so this crate
//! has no dependency on `custodian-primitives`.

mod error;
mod hashchain;
mod keypair;
mod signer;

pub use error::IntegrityError;
pub use hashchain::{HashChainLinker, HashChainValidator};
pub use keypair::KeyPair;
pub use signer::{SignatureValidator, Signer};

/// The `author` and `integrity` pair produced for an unsigned event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedIntegrity {
    pub author: String,
    pub integrity: Vec<u8>,
}

/// Attaches `author`/`integrity` to an event's signing bytes. `prev_integrity`
/// is the tail event's `integrity` field, consulted by hash-chain linkers and
/// ignored by signers.
pub trait IntegrityLinker {
    fn link(&self, signing_bytes: &[u8], prev_integrity: Option<&[u8]>) -> LinkedIntegrity;
}

/// Verifies an `(author, integrity)` pair against an event's signing bytes.
pub trait IntegrityValidator {
    fn validate(
        &self,
        author: &str,
        signing_bytes: &[u8],
        integrity: &[u8],
        prev_integrity: Option<&[u8]>,
    ) -> Result<(), IntegrityError>;
}
