use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Names one specific version of an object or annotation. Two identifiers
/// are equal iff both the UUID and the version match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub uuid: Uuid,
    pub version: u64,
}

impl Identifier {
    pub fn new(uuid: Uuid, version: u64) -> Self {
        Self { uuid, version }
    }

    /// 16 bytes of UUID followed by the version as a little-endian u64.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24);
        bytes.extend_from_slice(self.uuid.as_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes
    }
}
