use serde_repr::{Deserialize_repr, Serialize_repr};

/// Discriminant for object/annotation mutation events. Values are powers of
/// two in the source implementation this crate was grounded on, preserved
/// here for on-the-wire compatibility even though nothing in this crate
/// combines them as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ActionT {
    Create = 1,
    Update = 2,
    Delete = 4,
}

/// Discriminant for review outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum DecisionT {
    Accept = 1,
    Reject = 2,
}

/// Discriminant for owner roster mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum OwnerActionT {
    Add = 1,
    Remove = 2,
}

/// Hash algorithm used for a blob's content hash. Currently only SHA-256 is
/// supported; the discriminant is kept distinct from a plain bool so a
/// second algorithm can be added without an on-disk migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum HashTypeT {
    Sha256 = 1,
}
