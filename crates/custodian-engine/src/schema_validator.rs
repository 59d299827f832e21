use std::collections::HashSet;
use std::sync::Mutex;

use custodian_primitives::{schema, Annotation, Event, EventBody, Identifier, Object, ValidationError};
use custodian_store::{Depot, State};

/// Validates that schema objects carry a well-formed JSON Schema payload and
/// that annotation payloads conform to the schema version they reference.
/// Tracks which identifiers are recognized schema objects, built up as
/// object events are consumed — an annotation's `schema` is only checked
/// once the schema it names has itself been accepted into this set.
#[derive(Default)]
pub struct SchemaValidator {
    schemas: Mutex<HashSet<Identifier>>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self, event: &Event, state: &dyn State, depot: &dyn Depot) -> Result<(), ValidationError> {
        match &event.body {
            EventBody::ObjectCreate { object } | EventBody::ObjectUpdate { object } => {
                self.validate_object(object, depot)
            }
            EventBody::AnnotationCreate { annotation, .. } | EventBody::AnnotationUpdate { annotation } => {
                self.validate_annotation(annotation, state, depot)
            }
            _ => Ok(()),
        }
    }

    pub fn consume(&self, event: &Event) {
        if let EventBody::ObjectCreate { object } | EventBody::ObjectUpdate { object } = &event.body {
            if object.is_schema_object() {
                self.schemas.lock().unwrap().insert(object.identifier());
            }
        }
    }

    fn validate_object(&self, object: &Object, depot: &dyn Depot) -> Result<(), ValidationError> {
        if !object.is_schema_object() {
            return Ok(());
        }
        let bytes = depot
            .read(object.identifier(), 0, object.size)
            .map_err(|err| ValidationError::schema(err.to_string()))?;
        let payload: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|err| ValidationError::schema(format!("schema payload is not valid JSON: {err}")))?;
        schema::validate_is_json_schema(&payload)
    }

    fn validate_annotation(
        &self,
        annotation: &Annotation,
        state: &dyn State,
        depot: &dyn Depot,
    ) -> Result<(), ValidationError> {
        if !self.schemas.lock().unwrap().contains(&annotation.schema) {
            return Ok(());
        }

        let schema_object = state
            .object(annotation.schema)
            .ok_or_else(|| ValidationError::schema("referenced schema object missing from state"))?;
        let schema_bytes = depot
            .read(annotation.schema, 0, schema_object.size)
            .map_err(|err| ValidationError::schema(err.to_string()))?;
        let schema_doc: serde_json::Value = serde_json::from_slice(&schema_bytes)
            .map_err(|err| ValidationError::schema(format!("schema payload is not valid JSON: {err}")))?;

        let annotation_bytes = depot
            .read(annotation.identifier(), 0, annotation.size)
            .map_err(|err| ValidationError::schema(err.to_string()))?;
        let instance: serde_json::Value = serde_json::from_slice(&annotation_bytes).map_err(|err| {
            ValidationError::schema(format!("annotation payload is not valid JSON: {err}"))
        })?;

        schema::validate_against_schema(&schema_doc, &instance)
    }
}
