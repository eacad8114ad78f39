use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use crate::pack::ClassifiedPack;

/// Identity of an archive file on disk at classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: SystemTime,
    pub len: u64,
}

impl FileStamp {
    /// `None` when the platform reports no modification time; such files are never cached.
    pub fn of(metadata: &Metadata) -> Option<Self> {
        Some(Self {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}

/// Classified packs keyed by archive path, valid while the file's stamp is unchanged.
///
/// Owned by a [`Scanner`](super::Scanner); there is no process-wide cache.
#[derive(Debug, Default)]
pub struct PackCache {
    packs: Mutex<HashMap<PathBuf, (FileStamp, ClassifiedPack)>>,
}

impl PackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached classification for `path`, if recorded under the same stamp.
    pub fn get(&self, path: &Path, stamp: FileStamp) -> Option<ClassifiedPack> {
        let packs = self.packs.lock().unwrap_or_else(PoisonError::into_inner);
        packs
            .get(path)
            .filter(|(cached, _)| *cached == stamp)
            .map(|(_, pack)| pack.clone())
    }

    pub fn insert(&self, path: &Path, stamp: FileStamp, pack: ClassifiedPack) {
        let mut packs = self.packs.lock().unwrap_or_else(PoisonError::into_inner);
        packs.insert(path.to_path_buf(), (stamp, pack));
    }

    /// Drop the entry for `path`; returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut packs = self.packs.lock().unwrap_or_else(PoisonError::into_inner);
        packs.remove(path).is_some()
    }

    /// Keep only entries whose path satisfies `keep`; returns how many were dropped.
    pub fn retain(&self, mut keep: impl FnMut(&Path) -> bool) -> usize {
        let mut packs = self.packs.lock().unwrap_or_else(PoisonError::into_inner);
        let before = packs.len();
        packs.retain(|path, _| keep(path));
        before - packs.len()
    }

    pub fn clear(&self) {
        self.packs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.packs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
