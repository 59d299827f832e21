use std::path::PathBuf;

/// Which integrity regime a dataset uses. Fixed for the dataset's lifetime;
/// §4.3 treats the two regimes as mutually exclusive per dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityMode {
    Signed,
    HashChain,
}

/// Construction parameters for a `Dataset`. `depot_root`/`record_keeper_root`
/// select the filesystem-backed components; omitting both runs the dataset
/// fully in memory.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub integrity_mode: IntegrityMode,
    pub depot_root: Option<PathBuf>,
    pub record_keeper_root: Option<PathBuf>,
}

impl DatasetConfig {
    pub fn in_memory(integrity_mode: IntegrityMode) -> Self {
        Self { integrity_mode, depot_root: None, record_keeper_root: None }
    }

    pub fn file_backed(
        integrity_mode: IntegrityMode,
        depot_root: impl Into<PathBuf>,
        record_keeper_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            integrity_mode,
            depot_root: Some(depot_root.into()),
            record_keeper_root: Some(record_keeper_root.into()),
        }
    }
}
