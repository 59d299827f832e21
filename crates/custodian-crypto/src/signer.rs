use ed25519_dalek::Signature;
use ed25519_dalek::Signer as _;
use ed25519_dalek::SigningKey;
use ed25519_dalek::Verifier;
use ed25519_dalek::VerifyingKey;

use crate::error::IntegrityError;
use crate::{IntegrityLinker, IntegrityValidator, LinkedIntegrity};

/// Signed-mode linker: `author` is the hex of the Ed25519 verifying key,
/// `integrity` is the signature over the event's signing bytes.
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }
}

impl IntegrityLinker for Signer {
    fn link(&self, signing_bytes: &[u8], _prev_integrity: Option<&[u8]>) -> LinkedIntegrity {
        let signature = self.signing_key.sign(signing_bytes);
        LinkedIntegrity {
            author: hex::encode(self.signing_key.verifying_key().to_bytes()),
            integrity: signature.to_bytes().to_vec(),
        }
    }
}

/// Signed-mode validator: reconstructs the verifying key from `author`'s hex
/// and checks the signature.
#[derive(Default)]
pub struct SignatureValidator;

impl IntegrityValidator for SignatureValidator {
    fn validate(
        &self,
        author: &str,
        signing_bytes: &[u8],
        integrity: &[u8],
        _prev_integrity: Option<&[u8]>,
    ) -> Result<(), IntegrityError> {
        let key_bytes = hex::decode(author)?;
        let key_bytes: [u8; 32] = key_bytes
            .try_into()
            .map_err(|v: Vec<u8>| IntegrityError::WrongLength { expected: 32, got: v.len() })?;
        let verifying_key =
            VerifyingKey::from_bytes(&key_bytes).map_err(IntegrityError::MalformedAuthor)?;

        let sig_bytes: [u8; 64] = integrity.try_into().map_err(|_| {
            IntegrityError::WrongLength { expected: 64, got: integrity.len() }
        })?;
        let signature = Signature::from_bytes(&sig_bytes);

        verifying_key
            .verify(signing_bytes, &signature)
            .map_err(|_| IntegrityError::BadSignature)
    }
}
