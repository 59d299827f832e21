//! Core data model for custodian event logs: identifiers, objects,
//! annotations, and the event envelope, together with their canonical
//! signing-byte encodings and JSON codec.

pub mod annotation;
pub mod enums;
pub mod error;
pub mod event;
pub mod identifier;
pub mod object;
pub mod schema;

pub use annotation::Annotation;
pub use enums::{ActionT, DecisionT, HashTypeT, OwnerActionT};
pub use error::{ValidationError, ValidationErrorKind};
pub use event::{now_timestamp, Event, EventBody, UnsignedEvent};
pub use identifier::Identifier;
pub use object::{is_schema_name, Object, SCHEMA_MIMETYPE, SCHEMA_NAME_PREFIX};
pub use schema::{event_json_schema, validate_against_schema, validate_event_json, validate_is_json_schema};
