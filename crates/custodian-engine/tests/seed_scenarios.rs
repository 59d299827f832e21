//! Integration tests for the six seed scenarios in spec.md §8, run against
//! an in-memory `Dataset` wired for hash-chain integrity.

use custodian_crypto::{HashChainLinker, IntegrityLinker};
use custodian_engine::{Dataset, DatasetConfig, IntegrityMode};
use custodian_primitives::{Annotation, Event, EventBody, HashTypeT, Identifier, Object, ValidationErrorKind};
use custodian_store::StatusT;
use sha2::{Digest, Sha256};
use uuid::Uuid;

fn hash_of(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn dataset() -> Dataset {
    Dataset::new(DatasetConfig::in_memory(IntegrityMode::HashChain)).unwrap()
}

fn put_blob(dataset: &Dataset, identifier: Identifier, bytes: &[u8]) {
    let depot = dataset.depot();
    depot.reserve(identifier, bytes.len() as u64).unwrap();
    depot.write(identifier, 0, bytes).unwrap();
    depot.finalize(identifier).unwrap();
}

fn object(uuid: Uuid, version: u64, name: &str, format: &str, bytes: &[u8]) -> Object {
    Object {
        uuid,
        version,
        name: name.to_string(),
        format: format.to_string(),
        size: bytes.len() as u64,
        hash_type: HashTypeT::Sha256,
        hash: hash_of(bytes),
    }
}

fn submit_owner_add(dataset: &Dataset, author: &str, owner: &str) -> Result<Uuid, custodian_engine::ProcessError> {
    dataset.submit(EventBody::OwnerAdd { owner: owner.to_string() }, &HashChainLinker::new(author))
}

fn bootstrap(dataset: &Dataset, owner: &str) {
    submit_owner_add(dataset, owner, owner).expect("bootstrap self-sign should succeed");
}

#[test]
fn scenario_1_bootstrap_owner_rank() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");

    // "eve" signing her own addition fails: alice is the sole owner and must
    // author every OwnerAdd once the roster is non-empty.
    let err = submit_owner_add(&dataset, "eve", "eve").unwrap_err();
    assert!(matches!(err, custodian_engine::ProcessError::Validation(_)));

    submit_owner_add(&dataset, "alice", "eve").expect("alice may add eve");

    assert_eq!(dataset.state().owners(), vec!["alice".to_string(), "eve".to_string()]);
}

#[test]
fn scenario_2_schema_create_validates_payload() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");

    let valid_schema = br#"{"type":"object","required":["label","points"],"properties":{"label":{"type":"string"},"points":{"type":"array","minItems":2,"maxItems":2}}}"#;
    let uuid = Uuid::new_v4();
    let identifier = Identifier::new(uuid, 0);
    put_blob(&dataset, identifier, valid_schema);
    let object = object(uuid, 0, "schema-box", "application/schema+json", valid_schema);
    dataset
        .submit(EventBody::ObjectCreate { object }, &HashChainLinker::new("alice"))
        .expect("well-formed schema should be accepted");

    let bad_schema = br#"{"type": "not-a-real-type"}"#;
    let bad_uuid = Uuid::new_v4();
    let bad_identifier = Identifier::new(bad_uuid, 0);
    put_blob(&dataset, bad_identifier, bad_schema);
    let bad_object = object(bad_uuid, 0, "schema-bad", "application/schema+json", bad_schema);
    let err = dataset
        .submit(EventBody::ObjectCreate { object: bad_object }, &HashChainLinker::new("alice"))
        .unwrap_err();
    match err {
        custodian_engine::ProcessError::Validation(validation) => {
            assert_eq!(validation.kind(), ValidationErrorKind::Schema);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn scenario_3_annotation_conformance() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");

    let schema_bytes = br#"{"type":"object","required":["label","points"],"properties":{"label":{"type":"string"},"points":{"type":"array","minItems":2,"maxItems":2}}}"#;
    let schema_uuid = Uuid::new_v4();
    let schema_identifier = Identifier::new(schema_uuid, 0);
    put_blob(&dataset, schema_identifier, schema_bytes);
    let schema_object = object(schema_uuid, 0, "schema-box", "application/schema+json", schema_bytes);
    let create_event = dataset
        .submit(EventBody::ObjectCreate { object: schema_object }, &HashChainLinker::new("alice"))
        .unwrap();
    dataset
        .submit(EventBody::ReviewAccept { event_uuid: create_event }, &HashChainLinker::new("alice"))
        .unwrap();

    let underlying_bytes = b"photo bytes";
    let underlying_uuid = Uuid::new_v4();
    let underlying_identifier = Identifier::new(underlying_uuid, 0);
    put_blob(&dataset, underlying_identifier, underlying_bytes);
    let underlying = object(underlying_uuid, 0, "scan.png", "image/png", underlying_bytes);
    let underlying_event = dataset
        .submit(EventBody::ObjectCreate { object: underlying }, &HashChainLinker::new("alice"))
        .unwrap();
    dataset
        .submit(EventBody::ReviewAccept { event_uuid: underlying_event }, &HashChainLinker::new("alice"))
        .unwrap();

    let one_point_payload = br#"{"label":"cat","points":[1]}"#;
    let one_point_uuid = Uuid::new_v4();
    let one_point_identifier = Identifier::new(one_point_uuid, 0);
    put_blob(&dataset, one_point_identifier, one_point_payload);
    let bad_annotation = Annotation {
        uuid: one_point_uuid,
        version: 0,
        schema: schema_identifier,
        size: one_point_payload.len() as u64,
        hash_type: HashTypeT::Sha256,
        hash: hash_of(one_point_payload),
    };
    let err = dataset
        .submit(
            EventBody::AnnotationCreate {
                object_identifiers: vec![underlying_identifier],
                annotation: bad_annotation,
            },
            &HashChainLinker::new("alice"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        custodian_engine::ProcessError::Validation(ref validation)
            if validation.kind() == ValidationErrorKind::Schema
    ));

    let two_point_payload = br#"{"label":"cat","points":[1,2]}"#;
    let two_point_uuid = Uuid::new_v4();
    let two_point_identifier = Identifier::new(two_point_uuid, 0);
    put_blob(&dataset, two_point_identifier, two_point_payload);
    let good_annotation = Annotation {
        uuid: two_point_uuid,
        version: 0,
        schema: schema_identifier,
        size: two_point_payload.len() as u64,
        hash_type: HashTypeT::Sha256,
        hash: hash_of(two_point_payload),
    };
    dataset
        .submit(
            EventBody::AnnotationCreate {
                object_identifiers: vec![underlying_identifier],
                annotation: good_annotation,
            },
            &HashChainLinker::new("alice"),
        )
        .expect("two-point payload conforms to the schema");
}

#[test]
fn scenario_4_delete_lifecycle() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");

    let bytes = b"blob contents";
    let uuid = Uuid::new_v4();
    let identifier = Identifier::new(uuid, 0);
    put_blob(&dataset, identifier, bytes);
    dataset
        .submit(
            EventBody::ObjectCreate { object: object(uuid, 0, "scan.png", "image/png", bytes) },
            &HashChainLinker::new("alice"),
        )
        .unwrap();

    dataset
        .submit(EventBody::ObjectDelete { object_identifier: identifier }, &HashChainLinker::new("alice"))
        .unwrap();

    let status = dataset.state().entity_status(identifier);
    assert!(status.contains(StatusT::CreatePending));
    assert!(status.contains(StatusT::DeletePending));

    let delete_event = dataset
        .record_keeper()
        .tail()
        .unwrap()
        .expect("the delete event should be the current tail");
    dataset
        .submit(EventBody::ReviewAccept { event_uuid: delete_event }, &HashChainLinker::new("alice"))
        .unwrap();

    let status = dataset.state().entity_status(identifier);
    assert!(status.contains(StatusT::CreatePending));
    assert!(status.contains(StatusT::DeleteAccepted));

    let err = dataset
        .submit(EventBody::ObjectDelete { object_identifier: identifier }, &HashChainLinker::new("alice"))
        .unwrap_err();
    assert!(matches!(err, custodian_engine::ProcessError::Validation(_)));
}

#[test]
fn scenario_5_duplicate_hash_rejected() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");

    let bytes = b"shared payload";
    let first_uuid = Uuid::new_v4();
    let first_identifier = Identifier::new(first_uuid, 0);
    put_blob(&dataset, first_identifier, bytes);
    dataset
        .submit(
            EventBody::ObjectCreate { object: object(first_uuid, 0, "first.png", "image/png", bytes) },
            &HashChainLinker::new("alice"),
        )
        .unwrap();

    let second_uuid = Uuid::new_v4();
    let second_identifier = Identifier::new(second_uuid, 0);
    put_blob(&dataset, second_identifier, bytes);
    let err = dataset
        .submit(
            EventBody::ObjectCreate { object: object(second_uuid, 0, "second.png", "image/png", bytes) },
            &HashChainLinker::new("alice"),
        )
        .unwrap_err();
    assert!(matches!(err, custodian_engine::ProcessError::Validation(_)));
}

#[test]
fn scenario_6_owner_removal_respects_rank() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");
    submit_owner_add(&dataset, "alice", "bob").unwrap();

    // bob (rank 1) cannot remove alice (rank 0): a lower-ranked owner cannot
    // remove a higher-ranked one.
    let err = dataset
        .submit(EventBody::OwnerRemove { owner: "alice".to_string() }, &HashChainLinker::new("bob"))
        .unwrap_err();
    assert!(matches!(err, custodian_engine::ProcessError::Validation(_)));

    dataset
        .submit(EventBody::OwnerRemove { owner: "alice".to_string() }, &HashChainLinker::new("alice"))
        .expect("alice may remove herself");
    assert_eq!(dataset.state().owners(), vec!["bob".to_string()]);

    // Removing the last remaining owner must fail.
    let err = dataset
        .submit(EventBody::OwnerRemove { owner: "bob".to_string() }, &HashChainLinker::new("bob"))
        .unwrap_err();
    assert!(matches!(err, custodian_engine::ProcessError::Validation(_)));
}

#[test]
fn replaying_an_accepted_event_uuid_is_rejected() {
    let dataset = dataset();
    bootstrap(&dataset, "alice");

    let event = Event {
        uuid: Uuid::new_v4(),
        timestamp: custodian_primitives::now_timestamp(),
        author: "alice".to_string(),
        integrity: vec![],
        body: EventBody::OwnerAdd { owner: "carol".to_string() },
    };
    // Link it by hand so the same UUID can be replayed verbatim.
    let tail = dataset.record_keeper().tail().unwrap();
    let prev_event = tail.map(|uuid| dataset.record_keeper().read(uuid).unwrap());
    let prev_integrity = prev_event.as_ref().map(|event| event.integrity.clone());
    let linker = HashChainLinker::new("alice");
    let linked = linker.link(&event.signing_bytes(), prev_integrity.as_deref());
    let first = Event { integrity: linked.integrity, ..event.clone() };
    dataset.process_event(first.clone()).expect("first submission should succeed");

    let err = dataset.process_event(first).unwrap_err();
    assert!(matches!(err, custodian_engine::ProcessError::Validation(_)));
}
