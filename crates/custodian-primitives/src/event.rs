use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::annotation::Annotation;
use crate::enums::{ActionT, DecisionT, OwnerActionT};
use crate::identifier::Identifier;
use crate::object::Object;

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}

/// `f"{datetime.utcnow().isoformat('T')}Z"` — ISO-8601 UTC with a literal
/// trailing `Z`, matching how timestamps are produced across this dataset
/// engine's host-facing boundary.
pub fn now_timestamp() -> String {
    format!("{}Z", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f"))
}

/// The payload-specific part of an event. The discriminant (`type`) doubles
/// as the persisted-format type tag from §6.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventBody {
    ObjectCreate { object: Object },
    ObjectUpdate { object: Object },
    ObjectDelete { object_identifier: Identifier },
    AnnotationCreate { object_identifiers: Vec<Identifier>, annotation: Annotation },
    AnnotationUpdate { annotation: Annotation },
    AnnotationDelete { annotation_identifier: Identifier },
    ReviewAccept { event_uuid: Uuid },
    ReviewReject { event_uuid: Uuid },
    OwnerAdd { owner: String },
    OwnerRemove { owner: String },
}

impl EventBody {
    pub fn kind(&self) -> &'static str {
        match self {
            EventBody::ObjectCreate { .. } => "ObjectCreate",
            EventBody::ObjectUpdate { .. } => "ObjectUpdate",
            EventBody::ObjectDelete { .. } => "ObjectDelete",
            EventBody::AnnotationCreate { .. } => "AnnotationCreate",
            EventBody::AnnotationUpdate { .. } => "AnnotationUpdate",
            EventBody::AnnotationDelete { .. } => "AnnotationDelete",
            EventBody::ReviewAccept { .. } => "ReviewAccept",
            EventBody::ReviewReject { .. } => "ReviewReject",
            EventBody::OwnerAdd { .. } => "OwnerAdd",
            EventBody::OwnerRemove { .. } => "OwnerRemove",
        }
    }

    /// True for the ten-kind table's ObjectEvent/AnnotationEvent rows — the
    /// ones that can be pending review targets.
    pub fn is_object_or_annotation_event(&self) -> bool {
        matches!(
            self,
            EventBody::ObjectCreate { .. }
                | EventBody::ObjectUpdate { .. }
                | EventBody::ObjectDelete { .. }
                | EventBody::AnnotationCreate { .. }
                | EventBody::AnnotationUpdate { .. }
                | EventBody::AnnotationDelete { .. }
        )
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, EventBody::ObjectDelete { .. } | EventBody::AnnotationDelete { .. })
    }
}

fn signing_bytes_for(uuid: Uuid, timestamp: &str, body: &EventBody) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(uuid.as_bytes());
    bytes.extend_from_slice(timestamp.as_bytes());

    match body {
        EventBody::ObjectCreate { object } => {
            bytes.push(ActionT::Create as u8);
            bytes.extend(object.signing_bytes());
        }
        EventBody::ObjectUpdate { object } => {
            bytes.push(ActionT::Update as u8);
            bytes.extend(object.signing_bytes());
        }
        EventBody::ObjectDelete { object_identifier } => {
            bytes.push(ActionT::Delete as u8);
            bytes.extend(object_identifier.signing_bytes());
        }
        EventBody::AnnotationCreate { object_identifiers, annotation } => {
            bytes.push(ActionT::Create as u8);
            for identifier in object_identifiers {
                bytes.extend(identifier.signing_bytes());
            }
            bytes.extend(annotation.signing_bytes());
        }
        EventBody::AnnotationUpdate { annotation } => {
            bytes.push(ActionT::Update as u8);
            bytes.extend(annotation.signing_bytes());
        }
        EventBody::AnnotationDelete { annotation_identifier } => {
            bytes.push(ActionT::Delete as u8);
            bytes.extend(annotation_identifier.signing_bytes());
        }
        EventBody::ReviewAccept { event_uuid } => {
            bytes.push(DecisionT::Accept as u8);
            bytes.extend_from_slice(event_uuid.as_bytes());
        }
        EventBody::ReviewReject { event_uuid } => {
            bytes.push(DecisionT::Reject as u8);
            bytes.extend_from_slice(event_uuid.as_bytes());
        }
        EventBody::OwnerAdd { owner } => {
            bytes.extend_from_slice(owner.as_bytes());
            bytes.push(OwnerActionT::Add as u8);
        }
        EventBody::OwnerRemove { owner } => {
            bytes.extend_from_slice(owner.as_bytes());
            bytes.push(OwnerActionT::Remove as u8);
        }
    }

    bytes
}

/// An event before it has been signed or chained. Exists only in memory —
/// the JSON schema requires `author`/`integrity`, so an `UnsignedEvent`
/// never round-trips through serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsignedEvent {
    pub uuid: Uuid,
    pub timestamp: String,
    pub body: EventBody,
}

impl UnsignedEvent {
    pub fn new(body: EventBody) -> Self {
        Self { uuid: Uuid::new_v4(), timestamp: now_timestamp(), body }
    }

    pub fn signing_bytes(&self) -> Vec<u8> {
        signing_bytes_for(self.uuid, &self.timestamp, &self.body)
    }

    pub fn into_event(self, author: String, integrity: Vec<u8>) -> Event {
        Event { uuid: self.uuid, timestamp: self.timestamp, author, integrity, body: self.body }
    }
}

/// A fully linked event: constructed, signed/chained, ready for
/// `process_event`. Immutable once persisted (§3.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uuid: Uuid,
    pub timestamp: String,
    pub author: String,
    #[serde(with = "hex_bytes")]
    pub integrity: Vec<u8>,
    #[serde(flatten)]
    pub body: EventBody,
}

impl Event {
    pub fn signing_bytes(&self) -> Vec<u8> {
        signing_bytes_for(self.uuid, &self.timestamp, &self.body)
    }

    pub fn kind(&self) -> &'static str {
        self.body.kind()
    }

    /// Validates `value` against [`crate::schema::event_json_schema`] before
    /// constructing the in-memory form, per §4.2: "Deserialization MUST
    /// validate each payload against a JSON Schema derived structurally from
    /// the types above before constructing the in-memory form." Every path
    /// that turns persisted JSON back into an `Event` (a `RecordKeeper`
    /// reading a record, a host parsing an incoming event) must go through
    /// this constructor rather than `serde_json::from_value` directly.
    pub fn from_validated_json(value: serde_json::Value) -> Result<Self, crate::error::ValidationError> {
        crate::schema::validate_event_json(&value)?;
        serde_json::from_value(value)
            .map_err(|err| crate::error::ValidationError::schema(format!("malformed event JSON: {err}")))
    }

    pub fn from_validated_str(text: &str) -> Result<Self, crate::error::ValidationError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|err| crate::error::ValidationError::schema(format!("invalid JSON: {err}")))?;
        Self::from_validated_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::HashTypeT;

    fn object() -> Object {
        Object {
            uuid: Uuid::from_u128(1),
            version: 0,
            name: "scan.png".to_string(),
            format: "image/png".to_string(),
            size: 10,
            hash_type: HashTypeT::Sha256,
            hash: "c".repeat(64),
        }
    }

    #[test]
    fn object_create_signing_bytes_include_action_byte() {
        let unsigned = UnsignedEvent::new(EventBody::ObjectCreate { object: object() });
        let bytes = unsigned.signing_bytes();
        assert_eq!(bytes[16 + unsigned.timestamp.len()], ActionT::Create as u8);
    }

    #[test]
    fn event_round_trips_through_json() {
        let unsigned = UnsignedEvent::new(EventBody::ObjectCreate { object: object() });
        let event = unsigned.into_event("alice".to_string(), vec![1, 2, 3, 4]);
        let json = serde_json::to_string(&event).unwrap();
        let restored: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, restored);
        assert!(json.contains("\"type\":\"ObjectCreate\""));
    }

    #[test]
    fn review_events_carry_bare_event_uuid_not_identifier() {
        let target = Uuid::from_u128(42);
        let unsigned = UnsignedEvent::new(EventBody::ReviewAccept { event_uuid: target });
        let bytes = unsigned.signing_bytes();
        // uuid(16) + timestamp + decision(1) + target uuid(16)
        let tail = &bytes[bytes.len() - 16..];
        assert_eq!(tail, target.as_bytes());
    }

    #[test]
    fn from_validated_str_round_trips_a_well_formed_event() {
        let unsigned = UnsignedEvent::new(EventBody::ObjectCreate { object: object() });
        let event = unsigned.into_event("alice".to_string(), vec![1, 2, 3, 4]);
        let json = serde_json::to_string(&event).unwrap();
        let restored = Event::from_validated_str(&json).unwrap();
        assert_eq!(event, restored);
    }

    #[test]
    fn from_validated_str_rejects_a_variant_missing_its_required_field() {
        let json = serde_json::json!({
            "uuid": "00000000-0000-0000-0000-000000000001",
            "timestamp": "2024-01-01T00:00:00Z",
            "author": "alice",
            "integrity": "00",
            "type": "ObjectCreate"
        })
        .to_string();
        assert!(Event::from_validated_str(&json).is_err());
    }
}
