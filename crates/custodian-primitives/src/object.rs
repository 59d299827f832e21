use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::HashTypeT;
use crate::identifier::Identifier;

/// The prefix that marks an object as a schema object (§3.2).
pub const SCHEMA_NAME_PREFIX: &str = "schema-";

/// A schema object's required mimetype.
pub const SCHEMA_MIMETYPE: &str = "application/schema+json";

pub fn is_schema_name(name: &str) -> bool {
    name.starts_with(SCHEMA_NAME_PREFIX)
}

/// Metadata for a blob. `hash` is lowercase hex, always 64 characters for
/// the one supported hash type (SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub uuid: Uuid,
    pub version: u64,
    pub name: String,
    pub format: String,
    pub size: u64,
    pub hash_type: HashTypeT,
    pub hash: String,
}

impl Object {
    pub fn identifier(&self) -> Identifier {
        Identifier::new(self.uuid, self.version)
    }

    pub fn is_schema(&self) -> bool {
        is_schema_name(&self.name)
    }

    pub fn is_schema_object(&self) -> bool {
        self.is_schema() && self.format == SCHEMA_MIMETYPE
    }

    /// `uuid ∥ version:u64 ∥ name.utf8 ∥ format.utf8 ∥ size:u64 ∥
    /// hash_type:u8 ∥ hash_bytes`.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(self.uuid.as_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(self.name.as_bytes());
        bytes.extend_from_slice(self.format.as_bytes());
        bytes.extend_from_slice(&self.size.to_le_bytes());
        bytes.push(self.hash_type as u8);
        if let Ok(hash_bytes) = hex::decode(&self.hash) {
            bytes.extend_from_slice(&hash_bytes);
        }
        bytes
    }
}
