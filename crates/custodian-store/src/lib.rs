//! Durable and in-memory backings for the dataset engine: the content
//! addressed blob store (`Depot`), the append-only event log
//! (`RecordKeeper`), and the derived query indexes (`State`).

pub mod depot;
pub mod error;
pub mod record_keeper;
pub mod state;

pub use depot::{Depot, FileDepot, MemDepot};
pub use error::StorageError;
pub use record_keeper::{FileRecordKeeper, MemRecordKeeper, RecordKeeper};
pub use state::{
    AnnotationInfo, EntityStatus, EventInfo, MemState, ObjectInfo, Page, SchemaInfo, State, StatusFilter,
    StatusT, PAGE_SIZE,
};
