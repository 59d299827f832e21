/// Failure modes for `Depot` and `RecordKeeper` operations (§4.1, §4.4).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("identifier not found")]
    NotFound,
    #[error("identifier already exists")]
    AlreadyExists,
    #[error("blob is not finalized")]
    NotFinalized,
    #[error("blob is already finalized")]
    AlreadyFinalized,
    #[error("write or read would cross the reserved boundary")]
    BoundaryExceeded,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
