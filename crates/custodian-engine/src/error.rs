use custodian_primitives::ValidationError;
use custodian_store::StorageError;

/// The two error families a `Dataset` can raise from `process_event`
/// (§7). Both are atomic: no log entry, no state change, no blob side
/// effects on failure.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
