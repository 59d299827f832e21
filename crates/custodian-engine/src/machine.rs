use std::sync::Arc;

use custodian_crypto::{HashChainValidator, IntegrityLinker, IntegrityValidator, SignatureValidator};
use custodian_primitives::{Event, EventBody, UnsignedEvent};
use custodian_store::{
    Depot, FileDepot, FileRecordKeeper, MemDepot, MemRecordKeeper, MemState, RecordKeeper, State,
};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::{DatasetConfig, IntegrityMode};
use crate::error::ProcessError;
use crate::schema_validator::SchemaValidator;
use crate::{field_validator, state_rules};

/// One dataset: a Depot, a RecordKeeper, a State, and the validator stack,
/// wired into a single `process_event` entrypoint. Event processing is
/// serialized by `process_lock`; the Depot has no such requirement since
/// blob ownership is exclusive to the producer between `reserve` and
/// `finalize` (§5).
pub struct Dataset {
    depot: Arc<dyn Depot>,
    record_keeper: Arc<dyn RecordKeeper>,
    state: Arc<dyn State>,
    schema_validator: SchemaValidator,
    integrity_validator: Box<dyn IntegrityValidator>,
    process_lock: Mutex<()>,
}

impl Dataset {
    pub fn new(config: DatasetConfig) -> std::io::Result<Self> {
        let depot: Arc<dyn Depot> = match &config.depot_root {
            Some(root) => Arc::new(FileDepot::new(root)?),
            None => Arc::new(MemDepot::new()),
        };
        let record_keeper: Arc<dyn RecordKeeper> = match &config.record_keeper_root {
            Some(root) => Arc::new(FileRecordKeeper::new(root)?),
            None => Arc::new(MemRecordKeeper::new()),
        };
        let integrity_validator: Box<dyn IntegrityValidator> = match config.integrity_mode {
            IntegrityMode::Signed => Box::new(SignatureValidator),
            IntegrityMode::HashChain => Box::new(HashChainValidator),
        };
        Ok(Self {
            depot,
            record_keeper,
            state: Arc::new(MemState::new()),
            schema_validator: SchemaValidator::new(),
            integrity_validator,
            process_lock: Mutex::new(()),
        })
    }

    pub fn depot(&self) -> &dyn Depot {
        self.depot.as_ref()
    }

    pub fn state(&self) -> &dyn State {
        self.state.as_ref()
    }

    pub fn record_keeper(&self) -> &dyn RecordKeeper {
        self.record_keeper.as_ref()
    }

    /// Builds, links, and processes a new event in one step: fetches the
    /// current tail for hash-chain linkage, asks `linker` to attach
    /// `author`/`integrity`, and runs the full validation/consumption
    /// pipeline. Hosts that construct and sign events themselves (e.g.
    /// replaying a log) should call `process_event` directly instead.
    pub fn submit(&self, body: EventBody, linker: &dyn IntegrityLinker) -> Result<Uuid, ProcessError> {
        let _guard = self.process_lock.lock();
        let unsigned = UnsignedEvent::new(body);
        let prev_event = match self.record_keeper.tail()? {
            Some(uuid) => Some(self.record_keeper.read(uuid)?),
            None => None,
        };
        let prev_integrity = prev_event.as_ref().map(|event| event.integrity.as_slice());
        let signing_bytes = unsigned.signing_bytes();
        let linked = linker.link(&signing_bytes, prev_integrity);
        let event = unsigned.into_event(linked.author, linked.integrity);
        self.process_locked(event)
    }

    pub fn process_event(&self, event: Event) -> Result<Uuid, ProcessError> {
        let _guard = self.process_lock.lock();
        self.process_locked(event)
    }

    fn process_locked(&self, event: Event) -> Result<Uuid, ProcessError> {
        let span = tracing::info_span!("process_event", event_uuid = %event.uuid, kind = event.kind());
        let _enter = span.enter();

        if let Err(err) = self.validate(&event) {
            tracing::warn!(error = %err, "event rejected");
            return Err(err.into());
        }

        self.record_keeper.add(event.clone())?;
        self.consume(&event);
        tracing::info!("event accepted");
        Ok(event.uuid)
    }

    fn validate(&self, event: &Event) -> Result<(), custodian_primitives::ValidationError> {
        field_validator::validate(event)?;
        self.validate_chain_integrity(event)?;
        self.schema_validator.validate(event, self.state.as_ref(), self.depot.as_ref())?;
        state_rules::validate(event, self.state.as_ref())?;
        Ok(())
    }

    fn validate_chain_integrity(
        &self,
        event: &Event,
    ) -> Result<(), custodian_primitives::ValidationError> {
        use custodian_primitives::ValidationError;

        if self.record_keeper.exists(event.uuid).map_err(|err| ValidationError::chain_integrity(err.to_string()))? {
            return Err(ValidationError::chain_integrity("event UUID already exists"));
        }
        let prev_event = match self
            .record_keeper
            .tail()
            .map_err(|err| ValidationError::chain_integrity(err.to_string()))?
        {
            Some(uuid) => Some(
                self.record_keeper
                    .read(uuid)
                    .map_err(|err| ValidationError::chain_integrity(err.to_string()))?,
            ),
            None => None,
        };
        let prev_integrity = prev_event.as_ref().map(|event| event.integrity.as_slice());
        self.integrity_validator
            .validate(&event.author, &event.signing_bytes(), &event.integrity, prev_integrity)
            .map_err(|err| ValidationError::chain_integrity(err.to_string()))
    }

    fn consume(&self, event: &Event) {
        self.schema_validator.consume(event);

        let related = match &event.body {
            EventBody::ObjectCreate { object } => {
                let identifier = object.identifier();
                self.state.apply_object_create(event.uuid, object.clone());
                vec![identifier]
            }
            EventBody::ObjectUpdate { object } => {
                let identifier = object.identifier();
                self.state.apply_object_update(event.uuid, object.clone());
                vec![identifier]
            }
            EventBody::ObjectDelete { object_identifier } => {
                self.state.apply_object_delete(event.uuid, *object_identifier);
                vec![*object_identifier]
            }
            EventBody::AnnotationCreate { object_identifiers, annotation } => {
                let identifier = annotation.identifier();
                self.state.apply_annotation_create(
                    event.uuid,
                    object_identifiers.clone(),
                    annotation.clone(),
                );
                let mut related = object_identifiers.clone();
                related.push(identifier);
                related
            }
            EventBody::AnnotationUpdate { annotation } => {
                let identifier = annotation.identifier();
                self.state.apply_annotation_update(event.uuid, annotation.clone());
                vec![identifier]
            }
            EventBody::AnnotationDelete { annotation_identifier } => {
                self.state.apply_annotation_delete(event.uuid, *annotation_identifier);
                vec![*annotation_identifier]
            }
            EventBody::ReviewAccept { event_uuid } => {
                self.state.apply_review(event.uuid, *event_uuid, true);
                vec![]
            }
            EventBody::ReviewReject { event_uuid } => {
                self.state.apply_review(event.uuid, *event_uuid, false);
                vec![]
            }
            EventBody::OwnerAdd { owner } => {
                self.state.apply_owner_add(owner.clone());
                vec![]
            }
            EventBody::OwnerRemove { owner } => {
                self.state.apply_owner_remove(owner);
                vec![]
            }
        };
        self.state.record_event(event.uuid, event.kind(), &related);
    }
}
