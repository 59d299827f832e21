/// Discriminates the rule family behind a `ValidationError` so hosts can
/// map failures to response codes without string-matching the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A field of an `Object`/`Annotation` failed a basic shape check
    /// (empty name, negative size, wrong hash length, ...).
    FieldShape,
    /// The event's canonical JSON did not match the schema derived from the
    /// event type hierarchy, or failed to parse at all.
    Schema,
    /// The event's `integrity`/`author` pair failed signature or hash-chain
    /// verification.
    ChainIntegrity,
    /// The event violates a §4.5 state-projection business rule (version
    /// counting, lifecycle status, ownership rank, duplicate hash, ...).
    StateRule,
}

/// The event is well-formed JSON but violates a rule the engine enforces.
/// Refusal is atomic: no log entry, no state change, no blob side effects.
#[derive(Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ValidationError {
    kind: ValidationErrorKind,
    message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn field_shape(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::FieldShape, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::Schema, message)
    }

    pub fn chain_integrity(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::ChainIntegrity, message)
    }

    pub fn state_rule(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::StateRule, message)
    }

    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
