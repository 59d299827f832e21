use serde_json::{json, Value};

use crate::error::ValidationError;

fn envelope_properties() -> Value {
    json!({
        "uuid": {"type": "string", "format": "uuid"},
        "timestamp": {"type": "string", "minLength": 1},
        "author": {"type": "string", "minLength": 1},
        "integrity": {"type": "string"}
    })
}

fn envelope_required() -> Vec<Value> {
    vec![json!("uuid"), json!("timestamp"), json!("author"), json!("integrity"), json!("type")]
}

fn identifier_schema() -> Value {
    json!({
        "type": "object",
        "required": ["uuid", "version"],
        "properties": {
            "uuid": {"type": "string", "format": "uuid"},
            "version": {"type": "integer", "minimum": 0}
        }
    })
}

fn object_schema() -> Value {
    json!({
        "type": "object",
        "required": ["uuid", "version", "name", "format", "size", "hash_type", "hash"],
        "properties": {
            "uuid": {"type": "string", "format": "uuid"},
            "version": {"type": "integer", "minimum": 0},
            "name": {"type": "string", "minLength": 1},
            "format": {"type": "string", "minLength": 1},
            "size": {"type": "integer", "minimum": 0},
            "hash_type": {"const": 1},
            "hash": {"type": "string", "pattern": "^[0-9a-f]{64}$"}
        }
    })
}

fn annotation_schema() -> Value {
    json!({
        "type": "object",
        "required": ["uuid", "version", "schema", "size", "hash_type", "hash"],
        "properties": {
            "uuid": {"type": "string", "format": "uuid"},
            "version": {"type": "integer", "minimum": 0},
            "schema": identifier_schema(),
            "size": {"type": "integer", "minimum": 0},
            "hash_type": {"const": 1},
            "hash": {"type": "string", "pattern": "^[0-9a-f]{64}$"}
        }
    })
}

fn variant_schema(type_name: &str, required: &[&str], mut properties: Value) -> Value {
    properties["type"] = json!({ "const": type_name });
    let envelope = envelope_properties();
    for (key, value) in envelope.as_object().unwrap() {
        properties[key] = value.clone();
    }
    let mut required_list = envelope_required();
    required_list.extend(required.iter().map(|name| json!(*name)));
    json!({
        "type": "object",
        "required": required_list,
        "properties": properties
    })
}

/// Built structurally from the `EventBody` variants in `event.rs` — every
/// new field there needs a matching entry here.
pub fn event_json_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "oneOf": [
            variant_schema("ObjectCreate", &["object"], json!({"object": object_schema()})),
            variant_schema("ObjectUpdate", &["object"], json!({"object": object_schema()})),
            variant_schema(
                "ObjectDelete",
                &["object_identifier"],
                json!({"object_identifier": identifier_schema()}),
            ),
            variant_schema(
                "AnnotationCreate",
                &["object_identifiers", "annotation"],
                json!({
                    "object_identifiers": {"type": "array", "items": identifier_schema()},
                    "annotation": annotation_schema(),
                }),
            ),
            variant_schema(
                "AnnotationUpdate",
                &["annotation"],
                json!({"annotation": annotation_schema()}),
            ),
            variant_schema(
                "AnnotationDelete",
                &["annotation_identifier"],
                json!({"annotation_identifier": identifier_schema()}),
            ),
            variant_schema(
                "ReviewAccept",
                &["event_uuid"],
                json!({"event_uuid": {"type": "string", "format": "uuid"}}),
            ),
            variant_schema(
                "ReviewReject",
                &["event_uuid"],
                json!({"event_uuid": {"type": "string", "format": "uuid"}}),
            ),
            variant_schema(
                "OwnerAdd",
                &["owner"],
                json!({"owner": {"type": "string", "minLength": 1}}),
            ),
            variant_schema(
                "OwnerRemove",
                &["owner"],
                json!({"owner": {"type": "string", "minLength": 1}}),
            ),
        ]
    })
}

/// Validates `instance` against the event schema before a caller attempts
/// to deserialize it into an `Event`.
pub fn validate_event_json(instance: &Value) -> Result<(), ValidationError> {
    let validator = jsonschema::validator_for(&event_json_schema())
        .map_err(|err| ValidationError::schema(err.to_string()))?;
    validator.validate(instance).map_err(|err| ValidationError::schema(err.to_string()))
}

/// Checks that `candidate` is itself a well-formed JSON Schema document —
/// used when an object is published under the `schema-` name prefix.
pub fn validate_is_json_schema(candidate: &Value) -> Result<(), ValidationError> {
    jsonschema::validator_for(candidate)
        .map(|_| ())
        .map_err(|err| ValidationError::schema(format!("not a valid JSON Schema: {err}")))
}

/// Checks that an annotation payload conforms to its referenced schema
/// document.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidationError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|err| ValidationError::schema(err.to_string()))?;
    validator.validate(payload).map_err(|err| ValidationError::schema(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_add_requires_envelope_and_owner_fields() {
        let instance = json!({
            "uuid": "00000000-0000-0000-0000-000000000001",
            "timestamp": "2024-01-01T00:00:00Z",
            "author": "alice",
            "integrity": "00",
            "type": "OwnerAdd",
            "owner": "bob"
        });
        assert!(validate_event_json(&instance).is_ok());
    }

    #[test]
    fn missing_variant_field_is_rejected() {
        let instance = json!({
            "uuid": "00000000-0000-0000-0000-000000000001",
            "timestamp": "2024-01-01T00:00:00Z",
            "author": "alice",
            "integrity": "00",
            "type": "ObjectCreate"
        });
        assert!(validate_event_json(&instance).is_err());
    }

    #[test]
    fn malformed_schema_document_is_rejected() {
        let candidate = json!({"type": "not-a-real-type"});
        assert!(validate_is_json_schema(&candidate).is_err());
    }

    #[test]
    fn payload_conforming_to_schema_is_accepted() {
        let schema = json!({
            "type": "object",
            "required": ["label"],
            "properties": {"label": {"type": "string"}}
        });
        let payload = json!({"label": "cat"});
        assert!(validate_against_schema(&schema, &payload).is_ok());
    }
}
