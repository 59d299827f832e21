use custodian_primitives::{Annotation, Event, EventBody, Object, ValidationError};

/// Shape checks on `Object`/`Annotation` fields that never depend on
/// dataset state — name/format non-empty, hash well-formed, name charset
/// restricted per the edge-validation note in §6.3.
pub fn validate(event: &Event) -> Result<(), ValidationError> {
    match &event.body {
        EventBody::ObjectCreate { object } | EventBody::ObjectUpdate { object } => {
            validate_object(object)
        }
        EventBody::AnnotationCreate { annotation, .. } | EventBody::AnnotationUpdate { annotation } => {
            validate_annotation(annotation)
        }
        _ => Ok(()),
    }
}

fn validate_object(object: &Object) -> Result<(), ValidationError> {
    validate_name(&object.name)?;
    if object.format.is_empty() {
        return Err(ValidationError::field_shape("object format cannot be empty"));
    }
    validate_hash(&object.hash)
}

fn validate_annotation(annotation: &Annotation) -> Result<(), ValidationError> {
    validate_hash(&annotation.hash)
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::field_shape("object name cannot be empty"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        return Err(ValidationError::field_shape("name contains characters outside [A-Za-z0-9._-]"));
    }
    Ok(())
}

fn validate_hash(hash: &str) -> Result<(), ValidationError> {
    if hash.len() != 64 {
        return Err(ValidationError::field_shape("hash should be a hex encoded SHA256"));
    }
    if !hash.bytes().all(|b| b.is_ascii_digit() || (b.is_ascii_lowercase() && b.is_ascii_hexdigit())) {
        return Err(ValidationError::field_shape("hash must be lowercase hex"));
    }
    Ok(())
}
