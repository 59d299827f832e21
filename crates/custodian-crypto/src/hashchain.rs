use sha2::Digest;
use sha2::Sha256;

use crate::error::IntegrityError;
use crate::{IntegrityLinker, IntegrityValidator, LinkedIntegrity};

/// Hash-chain mode linker: `author` is a free-form owner identifier fixed at
/// construction; `integrity` is `SHA256(prev_integrity ∥ signing_bytes)`,
/// with `prev_integrity` empty for the first event in a dataset.
pub struct HashChainLinker {
    owner: String,
}

impl HashChainLinker {
    pub fn new(owner: impl Into<String>) -> Self {
        Self { owner: owner.into() }
    }

    fn digest(signing_bytes: &[u8], prev_integrity: Option<&[u8]>) -> Vec<u8> {
        let mut hasher = Sha256::new();
        if let Some(prev) = prev_integrity {
            hasher.update(prev);
        }
        hasher.update(signing_bytes);
        hasher.finalize().to_vec()
    }
}

impl IntegrityLinker for HashChainLinker {
    fn link(&self, signing_bytes: &[u8], prev_integrity: Option<&[u8]>) -> LinkedIntegrity {
        LinkedIntegrity {
            author: self.owner.clone(),
            integrity: Self::digest(signing_bytes, prev_integrity),
        }
    }
}

/// Hash-chain mode validator: recomputes the digest and compares for
/// equality. `author` is not consulted — hash-chain mode has no per-author
/// key material, only the free-form owner string carried on the event.
#[derive(Default)]
pub struct HashChainValidator;

impl IntegrityValidator for HashChainValidator {
    fn validate(
        &self,
        _author: &str,
        signing_bytes: &[u8],
        integrity: &[u8],
        prev_integrity: Option<&[u8]>,
    ) -> Result<(), IntegrityError> {
        let expected = HashChainLinker::digest(signing_bytes, prev_integrity);
        if expected == integrity {
            Ok(())
        } else {
            Err(IntegrityError::ChainMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_event_chains_from_empty_prefix() {
        let linker = HashChainLinker::new("alice");
        let linked = linker.link(b"event-one", None);

        let validator = HashChainValidator;
        validator.validate("alice", b"event-one", &linked.integrity, None).unwrap();
    }

    #[test]
    fn subsequent_event_chains_from_prior_integrity() {
        let linker = HashChainLinker::new("alice");
        let first = linker.link(b"event-one", None);
        let second = linker.link(b"event-two", Some(&first.integrity));

        let validator = HashChainValidator;
        validator
            .validate("alice", b"event-two", &second.integrity, Some(&first.integrity))
            .unwrap();

        // Validating against the wrong prefix must fail.
        assert!(validator.validate("alice", b"event-two", &second.integrity, None).is_err());
    }
}
