use ed25519_dalek::SigningKey;
use ed25519_dalek::SECRET_KEY_LENGTH;
use rand::rngs::OsRng;

use crate::error::IntegrityError;

/// Convenience wrapper around an Ed25519 signing key for host-side bootstrap
/// and key persistence. Not used by the validation pipeline itself, which
/// only ever sees the hex-encoded public key carried in an event's `author`
/// field.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self { signing_key: SigningKey::generate(&mut OsRng) }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Hex of the Ed25519 public (verify) key; this is the value that goes
    /// into an event's `author` field in signed mode.
    pub fn public_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, IntegrityError> {
        let bytes = hex::decode(s)?;
        let got = bytes.len();
        let bytes: [u8; SECRET_KEY_LENGTH] = bytes
            .try_into()
            .map_err(|_| IntegrityError::WrongLength { expected: SECRET_KEY_LENGTH, got })?;
        Ok(Self { signing_key: SigningKey::from_bytes(&bytes) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hex() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_hex(&pair.to_hex()).unwrap();
        assert_eq!(pair.public_hex(), restored.public_hex());
    }
}
