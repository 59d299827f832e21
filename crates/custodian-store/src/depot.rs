use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use custodian_primitives::Identifier;

use crate::error::StorageError;

/// Content-addressed blob storage with a three-state lifecycle per
/// identifier: `NONEXISTENT -> WRITABLE -> READABLE -> NONEXISTENT`.
pub trait Depot: Send + Sync {
    fn reserve(&self, id: Identifier, size: u64) -> Result<(), StorageError>;
    fn write(&self, id: Identifier, offset: u64, buf: &[u8]) -> Result<(), StorageError>;
    fn finalize(&self, id: Identifier) -> Result<(), StorageError>;
    fn read(&self, id: Identifier, offset: u64, size: u64) -> Result<Vec<u8>, StorageError>;
    fn purge(&self, id: Identifier) -> Result<(), StorageError>;
    fn exists(&self, id: Identifier) -> Result<bool, StorageError>;
}

#[derive(Debug)]
enum BlobSlot {
    Writable(Vec<u8>),
    Readable(Vec<u8>),
}

/// In-memory `Depot`, used by the test suite and by hosts with no durability
/// requirement.
#[derive(Debug, Default)]
pub struct MemDepot {
    slots: Mutex<HashMap<Identifier, BlobSlot>>,
}

impl MemDepot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Depot for MemDepot {
    fn reserve(&self, id: Identifier, size: u64) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap();
        if slots.contains_key(&id) {
            return Err(StorageError::AlreadyExists);
        }
        slots.insert(id, BlobSlot::Writable(vec![0u8; size as usize]));
        tracing::debug!(?id, size, "depot slot reserved");
        Ok(())
    }

    fn write(&self, id: Identifier, offset: u64, buf: &[u8]) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap();
        match slots.get_mut(&id) {
            Some(BlobSlot::Writable(bytes)) => {
                let start = offset as usize;
                let end = start
                    .checked_add(buf.len())
                    .ok_or(StorageError::BoundaryExceeded)?;
                if end > bytes.len() {
                    return Err(StorageError::BoundaryExceeded);
                }
                bytes[start..end].copy_from_slice(buf);
                Ok(())
            }
            Some(BlobSlot::Readable(_)) => Err(StorageError::AlreadyFinalized),
            None => Err(StorageError::NotFound),
        }
    }

    fn finalize(&self, id: Identifier) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap();
        match slots.remove(&id) {
            Some(BlobSlot::Writable(bytes)) => {
                slots.insert(id, BlobSlot::Readable(bytes));
                tracing::debug!(?id, "depot slot finalized");
                Ok(())
            }
            Some(other @ BlobSlot::Readable(_)) => {
                slots.insert(id, other);
                Err(StorageError::AlreadyFinalized)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn read(&self, id: Identifier, offset: u64, size: u64) -> Result<Vec<u8>, StorageError> {
        let slots = self.slots.lock().unwrap();
        match slots.get(&id) {
            Some(BlobSlot::Readable(bytes)) => {
                let start = offset as usize;
                let end = start.checked_add(size as usize).ok_or(StorageError::BoundaryExceeded)?;
                if end > bytes.len() {
                    return Err(StorageError::BoundaryExceeded);
                }
                Ok(bytes[start..end].to_vec())
            }
            Some(BlobSlot::Writable(_)) => Err(StorageError::NotFinalized),
            None => Err(StorageError::NotFound),
        }
    }

    fn purge(&self, id: Identifier) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap();
        if slots.remove(&id).is_some() {
            tracing::debug!(?id, "depot slot purged");
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }

    fn exists(&self, id: Identifier) -> Result<bool, StorageError> {
        let slots = self.slots.lock().unwrap();
        Ok(matches!(slots.get(&id), Some(BlobSlot::Readable(_))))
    }
}

/// Filesystem-backed `Depot`. Blobs fan out into subdirectories keyed by the
/// first three hex characters of the identifier's UUID; the writable and
/// readable forms of a blob are distinct filenames so a crash mid-finalize
/// leaves no half-visible blob.
#[derive(Debug)]
pub struct FileDepot {
    root: PathBuf,
    guard: Mutex<()>,
}

const WRITABLE_SUFFIX: &str = ".writable";

impl FileDepot {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, guard: Mutex::new(()) })
    }

    fn fan_out_dir(&self, id: &Identifier) -> PathBuf {
        let hex = id.uuid.simple().to_string();
        self.root.join(&hex[0..3])
    }

    fn stem(id: &Identifier) -> String {
        format!("{}.{}", id.uuid, id.version)
    }

    fn readable_path(&self, id: &Identifier) -> PathBuf {
        self.fan_out_dir(id).join(Self::stem(id))
    }

    fn writable_path(&self, id: &Identifier) -> PathBuf {
        self.fan_out_dir(id).join(format!("{}{WRITABLE_SUFFIX}", Self::stem(id)))
    }
}

fn exists_at(path: &Path) -> std::io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

impl Depot for FileDepot {
    fn reserve(&self, id: Identifier, size: u64) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap();
        let dir = self.fan_out_dir(&id);
        fs::create_dir_all(&dir)?;
        if exists_at(&self.readable_path(&id))? || exists_at(&self.writable_path(&id))? {
            return Err(StorageError::AlreadyExists);
        }
        let file = File::create(self.writable_path(&id))?;
        file.set_len(size)?;
        tracing::debug!(?id, size, "depot slot reserved");
        Ok(())
    }

    fn write(&self, id: Identifier, offset: u64, buf: &[u8]) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap();
        if exists_at(&self.readable_path(&id))? {
            return Err(StorageError::AlreadyFinalized);
        }
        let path = self.writable_path(&id);
        if !exists_at(&path)? {
            return Err(StorageError::NotFound);
        }
        let mut file = OpenOptions::new().write(true).open(&path)?;
        let len = file.metadata()?.len();
        let end = offset.checked_add(buf.len() as u64).ok_or(StorageError::BoundaryExceeded)?;
        if end > len {
            return Err(StorageError::BoundaryExceeded);
        }
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn finalize(&self, id: Identifier) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap();
        if exists_at(&self.readable_path(&id))? {
            return Err(StorageError::AlreadyFinalized);
        }
        let writable = self.writable_path(&id);
        if !exists_at(&writable)? {
            return Err(StorageError::NotFound);
        }
        fs::rename(&writable, self.readable_path(&id))?;
        tracing::debug!(?id, "depot slot finalized");
        Ok(())
    }

    fn read(&self, id: Identifier, offset: u64, size: u64) -> Result<Vec<u8>, StorageError> {
        let _guard = self.guard.lock().unwrap();
        let readable = self.readable_path(&id);
        if !exists_at(&readable)? {
            if exists_at(&self.writable_path(&id))? {
                return Err(StorageError::NotFinalized);
            }
            return Err(StorageError::NotFound);
        }
        let mut file = File::open(&readable)?;
        let len = file.metadata()?.len();
        let end = offset.checked_add(size).ok_or(StorageError::BoundaryExceeded)?;
        if end > len {
            return Err(StorageError::BoundaryExceeded);
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn purge(&self, id: Identifier) -> Result<(), StorageError> {
        let _guard = self.guard.lock().unwrap();
        let readable = self.readable_path(&id);
        let writable = self.writable_path(&id);
        let had_readable = exists_at(&readable)?;
        let had_writable = exists_at(&writable)?;
        if had_readable {
            fs::remove_file(&readable)?;
        }
        if had_writable {
            fs::remove_file(&writable)?;
        }
        if !had_readable && !had_writable {
            return Err(StorageError::NotFound);
        }
        tracing::debug!(?id, "depot slot purged");
        Ok(())
    }

    fn exists(&self, id: Identifier) -> Result<bool, StorageError> {
        let _guard = self.guard.lock().unwrap();
        Ok(exists_at(&self.readable_path(&id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id() -> Identifier {
        Identifier::new(Uuid::from_u128(1), 0)
    }

    #[test]
    fn mem_depot_round_trips_a_blob() {
        let depot = MemDepot::new();
        depot.reserve(id(), 4).unwrap();
        depot.write(id(), 0, b"abcd").unwrap();
        depot.finalize(id()).unwrap();
        assert!(depot.exists(id()).unwrap());
        assert_eq!(depot.read(id(), 0, 4).unwrap(), b"abcd");
    }

    #[test]
    fn mem_depot_rejects_write_past_boundary() {
        let depot = MemDepot::new();
        depot.reserve(id(), 4).unwrap();
        assert!(matches!(
            depot.write(id(), 2, b"abcd"),
            Err(StorageError::BoundaryExceeded)
        ));
    }

    #[test]
    fn mem_depot_rejects_read_before_finalize() {
        let depot = MemDepot::new();
        depot.reserve(id(), 4).unwrap();
        assert!(matches!(depot.read(id(), 0, 4), Err(StorageError::NotFinalized)));
    }

    #[test]
    fn file_depot_round_trips_a_blob() {
        let dir = tempfile::tempdir().unwrap();
        let depot = FileDepot::new(dir.path()).unwrap();
        depot.reserve(id(), 5).unwrap();
        depot.write(id(), 0, b"hello").unwrap();
        depot.finalize(id()).unwrap();
        assert_eq!(depot.read(id(), 0, 5).unwrap(), b"hello");
        depot.purge(id()).unwrap();
        assert!(!depot.exists(id()).unwrap());
    }

    #[test]
    fn file_depot_rejects_double_reserve() {
        let dir = tempfile::tempdir().unwrap();
        let depot = FileDepot::new(dir.path()).unwrap();
        depot.reserve(id(), 5).unwrap();
        assert!(matches!(depot.reserve(id(), 5), Err(StorageError::AlreadyExists)));
    }
}
