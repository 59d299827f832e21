use custodian_primitives::{Event, EventBody, Identifier, ValidationError};
use custodian_store::{State, StatusT};

/// Business rules from §4.5, read against the current projection. Runs
/// after field-shape, chain-integrity, and schema validation have already
/// passed for this event.
pub fn validate(event: &Event, state: &dyn State) -> Result<(), ValidationError> {
    match &event.body {
        EventBody::ObjectCreate { object } => {
            if !state.object_versions(object.uuid).is_empty() {
                return Err(ValidationError::state_rule("object UUID already in use"));
            }
            if object.version != 0 {
                return Err(ValidationError::state_rule("create must start at version 0"));
            }
            if object.is_schema() && state.schema_uuid_by_name(&object.name).is_some() {
                return Err(ValidationError::state_rule("schema name already in use"));
            }
            reject_duplicate_hash(state, object.uuid, &object.hash)
        }
        EventBody::ObjectUpdate { object } => {
            let versions = state.object_versions(object.uuid);
            if versions.is_empty() {
                return Err(ValidationError::state_rule("object does not exist"));
            }
            if object.version as usize != versions.len() {
                return Err(ValidationError::state_rule("version must equal the prior version count"));
            }
            let prior_name = &versions[0].name;
            let prior_is_schema = custodian_primitives::is_schema_name(prior_name);
            if prior_is_schema {
                if &object.name != prior_name {
                    return Err(ValidationError::state_rule("a schema's name cannot change across versions"));
                }
            } else if object.is_schema() {
                return Err(ValidationError::state_rule(
                    "a non-schema object cannot acquire the schema- prefix",
                ));
            }
            let tail = versions.last().expect("checked non-empty above");
            if object.hash == tail.hash {
                return Err(ValidationError::state_rule("hash must differ from the prior version"));
            }
            reject_duplicate_hash(state, object.uuid, &object.hash)
        }
        EventBody::ObjectDelete { object_identifier } => {
            let object = lookup_object(state, *object_identifier)
                .ok_or_else(|| ValidationError::state_rule("object identifier does not exist"))?;
            if object.is_schema() {
                return Err(ValidationError::state_rule("schema objects cannot be deleted"));
            }
            reject_unless_deletable(state, *object_identifier)
        }
        EventBody::AnnotationCreate { object_identifiers, annotation } => {
            if !state.annotation_versions(annotation.uuid).is_empty() {
                return Err(ValidationError::state_rule("annotation UUID already in use"));
            }
            if annotation.version != 0 {
                return Err(ValidationError::state_rule("create must start at version 0"));
            }
            for identifier in object_identifiers {
                let object = lookup_object(state, *identifier).ok_or_else(|| {
                    ValidationError::state_rule("referenced object identifier does not exist")
                })?;
                let status = state.entity_status(*identifier);
                if status.contains(StatusT::CreateRejected) {
                    return Err(ValidationError::state_rule("referenced object version was rejected"));
                }
                if status.contains(StatusT::DeleteAccepted) {
                    return Err(ValidationError::state_rule("referenced object version was deleted"));
                }
                if object.is_schema() {
                    return Err(ValidationError::state_rule("cannot annotate a schema object"));
                }
            }
            Ok(())
        }
        EventBody::AnnotationUpdate { annotation } => {
            let versions = state.annotation_versions(annotation.uuid);
            if versions.is_empty() {
                return Err(ValidationError::state_rule("annotation does not exist"));
            }
            if annotation.version as usize != versions.len() {
                return Err(ValidationError::state_rule("version must equal the prior version count"));
            }
            Ok(())
        }
        EventBody::AnnotationDelete { annotation_identifier } => {
            if lookup_annotation(state, *annotation_identifier).is_none() {
                return Err(ValidationError::state_rule("annotation identifier does not exist"));
            }
            reject_unless_deletable(state, *annotation_identifier)
        }
        EventBody::ReviewAccept { event_uuid } | EventBody::ReviewReject { event_uuid } => {
            validate_review(event, *event_uuid, state)
        }
        EventBody::OwnerAdd { owner } => {
            let owners = state.owners();
            if owners.is_empty() {
                if &event.author != owner {
                    return Err(ValidationError::state_rule("the bootstrap owner must self-sign"));
                }
            } else {
                if state.owner_rank(owner).is_some() {
                    return Err(ValidationError::state_rule("owner already present"));
                }
                if state.owner_rank(&event.author).is_none() {
                    return Err(ValidationError::state_rule("author is not a current owner"));
                }
            }
            Ok(())
        }
        EventBody::OwnerRemove { owner } => {
            let target_rank = state
                .owner_rank(owner)
                .ok_or_else(|| ValidationError::state_rule("target owner is not present"))?;
            let author_rank = state
                .owner_rank(&event.author)
                .ok_or_else(|| ValidationError::state_rule("author is not a current owner"))?;
            if state.owners().len() <= 1 {
                return Err(ValidationError::state_rule("cannot remove the last remaining owner"));
            }
            if author_rank > target_rank {
                return Err(ValidationError::state_rule("cannot remove a higher ranking owner"));
            }
            Ok(())
        }
    }
}

fn lookup_object(state: &dyn State, identifier: Identifier) -> Option<custodian_primitives::Object> {
    state.object(identifier)
}

fn lookup_annotation(state: &dyn State, identifier: Identifier) -> Option<custodian_primitives::Annotation> {
    state.annotation(identifier)
}

fn reject_duplicate_hash(state: &dyn State, uuid: uuid::Uuid, hash: &str) -> Result<(), ValidationError> {
    match state.hash_owner(hash) {
        Some(owner) if owner != uuid => Err(ValidationError::state_rule("hash already used by another object")),
        _ => Ok(()),
    }
}

fn reject_unless_deletable(state: &dyn State, identifier: Identifier) -> Result<(), ValidationError> {
    let status = state.entity_status(identifier);
    if status.contains(StatusT::CreateRejected) {
        return Err(ValidationError::state_rule("cannot delete a rejected version"));
    }
    if status.contains(StatusT::DeletePending) || status.contains(StatusT::DeleteAccepted) {
        return Err(ValidationError::state_rule("already deleted"));
    }
    Ok(())
}

fn validate_review(event: &Event, target: uuid::Uuid, state: &dyn State) -> Result<(), ValidationError> {
    if !state.is_pending(target) {
        return Err(ValidationError::state_rule("target event is not pending review"));
    }
    if state.review_link(target).is_some() {
        return Err(ValidationError::state_rule("target event already has a review"));
    }
    if state.owner_rank(&event.author).is_none() {
        return Err(ValidationError::state_rule("author is not a current owner"));
    }
    Ok(())
}
