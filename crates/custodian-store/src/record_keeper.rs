use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use custodian_primitives::Event;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;

/// Append-only, hash-chained event log: random access by UUID plus forward
/// iteration in insertion order.
pub trait RecordKeeper: Send + Sync {
    fn add(&self, event: Event) -> Result<(), StorageError>;
    fn read(&self, uuid: Uuid) -> Result<Event, StorageError>;
    fn exists(&self, uuid: Uuid) -> Result<bool, StorageError>;
    fn next(&self, uuid: Option<Uuid>) -> Result<Option<Uuid>, StorageError>;
    fn tail(&self) -> Result<Option<Uuid>, StorageError>;
}

#[derive(Debug, Default)]
struct MemInner {
    events: Vec<Event>,
    index: HashMap<Uuid, usize>,
}

/// In-memory `RecordKeeper` backed by an insertion-ordered `Vec` plus a UUID
/// index.
#[derive(Debug, Default)]
pub struct MemRecordKeeper {
    inner: Mutex<MemInner>,
}

impl MemRecordKeeper {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordKeeper for MemRecordKeeper {
    fn add(&self, event: Event) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.index.contains_key(&event.uuid) {
            return Err(StorageError::AlreadyExists);
        }
        let position = inner.events.len();
        inner.index.insert(event.uuid, position);
        inner.events.push(event);
        Ok(())
    }

    fn read(&self, uuid: Uuid) -> Result<Event, StorageError> {
        let inner = self.inner.lock().unwrap();
        let position = *inner.index.get(&uuid).ok_or(StorageError::NotFound)?;
        Ok(inner.events[position].clone())
    }

    fn exists(&self, uuid: Uuid) -> Result<bool, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.index.contains_key(&uuid))
    }

    fn next(&self, uuid: Option<Uuid>) -> Result<Option<Uuid>, StorageError> {
        let inner = self.inner.lock().unwrap();
        match uuid {
            None => Ok(inner.events.first().map(|event| event.uuid)),
            Some(uuid) => {
                let position = *inner.index.get(&uuid).ok_or(StorageError::NotFound)?;
                Ok(inner.events.get(position + 1).map(|event| event.uuid))
            }
        }
    }

    fn tail(&self) -> Result<Option<Uuid>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events.last().map(|event| event.uuid))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkedRecord {
    event: Event,
    next: Option<Uuid>,
}

/// Filesystem-backed `RecordKeeper`: one JSON file per event under a
/// fan-out directory, a per-event `next` back-pointer, and `head`/`tail`
/// pointer files.
#[derive(Debug)]
pub struct FileRecordKeeper {
    root: PathBuf,
    guard: Mutex<()>,
}

impl FileRecordKeeper {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, guard: Mutex::new(()) })
    }

    fn fan_out_dir(&self, uuid: Uuid) -> PathBuf {
        let hex = uuid.simple().to_string();
        self.root.join(&hex[0..3])
    }

    fn record_path(&self, uuid: Uuid) -> PathBuf {
        self.fan_out_dir(uuid).join(format!("{uuid}.json"))
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("head")
    }

    fn tail_path(&self) -> PathBuf {
        self.root.join("tail")
    }

    fn read_pointer(&self, path: &PathBuf) -> std::io::Result<Option<Uuid>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Uuid::parse_str(text.trim()).ok()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write_pointer(&self, path: &PathBuf, uuid: Uuid) -> std::io::Result<()> {
        fs::write(path, uuid.to_string())
    }

    fn read_record(&self, uuid: Uuid) -> Result<LinkedRecord, StorageError> {
        let text = match fs::read_to_string(self.record_path(uuid)) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(err) => return Err(err.into()),
        };
        // §4.2 requires every JSON -> Event deserialization to pass through
        // schema validation first, so the nested `event` field is pulled out
        // and validated on its own rather than deserializing `LinkedRecord`
        // (and its flattened `Event`) directly via serde.
        let mut raw: serde_json::Value = serde_json::from_str(&text)
            .map_err(|err| StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
        let event_value = raw.get_mut("event").map(serde_json::Value::take).ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "record is missing the event field",
            ))
        })?;
        let next = raw.get("next").and_then(|v| serde_json::from_value(v.clone()).ok());
        let event = Event::from_validated_json(event_value)
            .map_err(|err| StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())))?;
        Ok(LinkedRecord { event, next })
    }

    fn write_record(&self, record: &LinkedRecord) -> Result<(), StorageError> {
        let dir = self.fan_out_dir(record.event.uuid);
        fs::create_dir_all(&dir)?;
        let text = serde_json::to_string(record)
            .map_err(|err| StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
        fs::write(self.record_path(record.event.uuid), text)?;
        Ok(())
    }
}

impl RecordKeeper for FileRecordKeeper {
    fn add(&self, event: Event) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap();
        if self.record_path(event.uuid).exists() {
            return Err(StorageError::AlreadyExists);
        }

        let tail = self.read_pointer(&self.tail_path())?;
        if let Some(tail_uuid) = tail {
            let mut tail_record = self.read_record(tail_uuid)?;
            tail_record.next = Some(event.uuid);
            self.write_record(&tail_record)?;
        }

        let uuid = event.uuid;
        self.write_record(&LinkedRecord { event, next: None })?;
        self.write_pointer(&self.tail_path(), uuid)?;
        if tail.is_none() {
            self.write_pointer(&self.head_path(), uuid)?;
        }
        Ok(())
    }

    fn read(&self, uuid: Uuid) -> Result<Event, StorageError> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.read_record(uuid)?.event)
    }

    fn exists(&self, uuid: Uuid) -> Result<bool, StorageError> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.record_path(uuid).exists())
    }

    fn next(&self, uuid: Option<Uuid>) -> Result<Option<Uuid>, StorageError> {
        let _guard = self.guard.lock().unwrap();
        match uuid {
            None => Ok(self.read_pointer(&self.head_path())?),
            Some(uuid) => Ok(self.read_record(uuid)?.next),
        }
    }

    fn tail(&self) -> Result<Option<Uuid>, StorageError> {
        let _guard = self.guard.lock().unwrap();
        Ok(self.read_pointer(&self.tail_path())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodian_primitives::EventBody;

    fn sample_event(uuid: Uuid) -> Event {
        Event {
            uuid,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            author: "alice".to_string(),
            integrity: vec![1, 2, 3],
            body: EventBody::OwnerAdd { owner: "alice".to_string() },
        }
    }

    #[test]
    fn mem_record_keeper_iterates_in_insertion_order() {
        let keeper = MemRecordKeeper::new();
        let first = Uuid::from_u128(1);
        let second = Uuid::from_u128(2);
        keeper.add(sample_event(first)).unwrap();
        keeper.add(sample_event(second)).unwrap();
        assert_eq!(keeper.next(None).unwrap(), Some(first));
        assert_eq!(keeper.next(Some(first)).unwrap(), Some(second));
        assert_eq!(keeper.next(Some(second)).unwrap(), None);
        assert_eq!(keeper.tail().unwrap(), Some(second));
    }

    #[test]
    fn mem_record_keeper_rejects_duplicate_uuid() {
        let keeper = MemRecordKeeper::new();
        let uuid = Uuid::from_u128(1);
        keeper.add(sample_event(uuid)).unwrap();
        assert!(matches!(keeper.add(sample_event(uuid)), Err(StorageError::AlreadyExists)));
    }

    #[test]
    fn file_record_keeper_persists_next_pointers() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = FileRecordKeeper::new(dir.path()).unwrap();
        let first = Uuid::from_u128(1);
        let second = Uuid::from_u128(2);
        keeper.add(sample_event(first)).unwrap();
        keeper.add(sample_event(second)).unwrap();
        assert_eq!(keeper.next(None).unwrap(), Some(first));
        assert_eq!(keeper.next(Some(first)).unwrap(), Some(second));
        assert_eq!(keeper.tail().unwrap(), Some(second));
        assert_eq!(keeper.read(second).unwrap().uuid, second);
    }

    #[test]
    fn file_record_keeper_rejects_a_record_with_a_malformed_event() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = FileRecordKeeper::new(dir.path()).unwrap();
        let uuid = Uuid::from_u128(1);
        let fan_out = keeper.fan_out_dir(uuid);
        fs::create_dir_all(&fan_out).unwrap();
        // `owner` is required on an `OwnerAdd` event; this record is missing it.
        let malformed = serde_json::json!({
            "event": {
                "uuid": uuid.to_string(),
                "timestamp": "2024-01-01T00:00:00Z",
                "author": "alice",
                "integrity": "010203",
                "type": "OwnerAdd"
            },
            "next": null
        });
        fs::write(keeper.record_path(uuid), serde_json::to_string(&malformed).unwrap()).unwrap();
        assert!(matches!(keeper.read(uuid), Err(StorageError::Io(_))));
    }
}
