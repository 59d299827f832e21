use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::HashTypeT;
use crate::identifier::Identifier;

/// Metadata for a structured label conforming to some schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub uuid: Uuid,
    pub version: u64,
    pub schema: Identifier,
    pub size: u64,
    pub hash_type: HashTypeT,
    pub hash: String,
}

impl Annotation {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.uuid, self.version)
    }

    /// `uuid ∥ version:u64 ∥ schema.signing_bytes ∥ size:u64 ∥ hash_type:u8
    /// ∥ hash_bytes`.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(self.uuid.as_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.schema.signing_bytes());
        bytes.extend_from_slice(&self.size.to_le_bytes());
        bytes.push(self.hash_type as u8);
        if let Ok(hash_bytes) = hex::decode(&self.hash) {
            bytes.extend_from_slice(&hash_bytes);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_bytes_embed_schema_identifier_bytes() {
        let annotation = Annotation {
            uuid: Uuid::from_u128(9),
            version: 1,
            schema: Identifier::new(Uuid::from_u128(3), 0),
            size: 4,
            hash_type: HashTypeT::Sha256,
            hash: "b".repeat(64),
        };
        let bytes = annotation.signing_bytes();
        let schema_bytes = annotation.schema.signing_bytes();
        assert_eq!(&bytes[24..24 + schema_bytes.len()], &schema_bytes[..]);
    }
}
