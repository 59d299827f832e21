//! Validator/consumer wiring and the `Machine` pipeline: the single
//! `Dataset::process_event` entrypoint a host calls after constructing and
//! linking an event (§5, §6.2).

mod field_validator;
mod state_rules;

pub mod config;
pub mod error;
pub mod machine;
pub mod schema_validator;

pub use config::{DatasetConfig, IntegrityMode};
pub use error::ProcessError;
pub use machine::Dataset;
pub use schema_validator::SchemaValidator;
