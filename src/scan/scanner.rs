use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::io::ReadAt;
use crate::pack::{
    MAX_METADATA_SIZE, METADATA_ENTRY, NormalizedMediaItem, PosterpackMetadata, classify,
};
use crate::zip::ArchiveIndex;

use super::cache::{FileStamp, PackCache};

/// An archive skipped during a scan, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub reason: String,
}

/// Items and warnings from one complete scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub items: Vec<NormalizedMediaItem>,
    pub warnings: Vec<ScanWarning>,
}

/// Discovers posterpacks under the configured roots.
///
/// Scanning never mutates anything but the scanner's own [`PackCache`], so
/// several scans may run at once.
pub struct Scanner {
    config: StoreConfig,
    cache: PackCache,
}

impl Scanner {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            cache: PackCache::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cache(&self) -> &PackCache {
        &self.cache
    }

    /// Start a fresh walk over every root.
    ///
    /// Items are produced one at a time by [`ScanRun::next_item`]; calling
    /// `scan` again re-walks the filesystem from the beginning.
    pub fn scan(&self) -> ScanRun<'_> {
        ScanRun {
            scanner: self,
            roots: self.config.roots.iter(),
            current: None,
            produced: 0,
            warnings: Vec::new(),
            seen: HashSet::new(),
            prune_on_finish: true,
        }
    }

    /// Run a scan to completion.
    pub async fn scan_all(&self) -> ScanReport {
        let mut run = self.scan();
        let mut items = Vec::new();
        while let Some(item) = run.next_item().await {
            items.push(item);
        }
        let warnings = run.into_warnings();
        info!(
            items = items.len(),
            skipped = warnings.len(),
            "posterpack scan finished"
        );
        ScanReport { items, warnings }
    }

    /// Open, classify and normalize one archive found under `root`.
    async fn load(&self, root: &Path, path: &Path) -> Result<NormalizedMediaItem> {
        let archive_path = relative_archive_path(root, path);
        let stamp = FileStamp::of(&tokio::fs::metadata(path).await?);

        if let Some(pack) = stamp.and_then(|stamp| self.cache.get(path, stamp)) {
            debug!(archive = %archive_path, "posterpack served from cache");
            return Ok(NormalizedMediaItem::from_pack(
                &pack,
                &archive_path,
                &self.config.endpoint,
            ));
        }

        let index = ArchiveIndex::open(path).await?;
        let metadata = read_metadata(&index, path).await;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive_path.clone());
        let pack = classify(&index, &metadata, &filename)?;

        debug!(
            archive = %archive_path,
            pack_type = ?pack.pack_type,
            title = %pack.title,
            "classified posterpack"
        );

        if let Some(stamp) = stamp {
            self.cache.insert(path, stamp, pack.clone());
        }
        Ok(NormalizedMediaItem::from_pack(
            &pack,
            &archive_path,
            &self.config.endpoint,
        ))
    }
}

/// A single lazy pass over the scanner's roots.
///
/// A run that walks every root to the end also drops cache entries for
/// archives it did not see. Runs cut short by the limit leave the cache alone.
pub struct ScanRun<'a> {
    scanner: &'a Scanner,
    roots: std::slice::Iter<'a, PathBuf>,
    current: Option<(&'a Path, walkdir::IntoIter)>,
    produced: usize,
    warnings: Vec<ScanWarning>,
    seen: HashSet<PathBuf>,
    prune_on_finish: bool,
}

impl<'a> ScanRun<'a> {
    /// Next item accepted by the media-type filter, or `None` once the walk
    /// is exhausted or the limit is reached.
    pub async fn next_item(&mut self) -> Option<NormalizedMediaItem> {
        let scanner = self.scanner;
        let config = &scanner.config;
        loop {
            if config.limit.is_some_and(|limit| self.produced >= limit) {
                return None;
            }

            let (root, path) = self.next_candidate().await?;
            match scanner.load(root, &path).await {
                Ok(item) if config.media_type_filter.accepts(item.media_type) => {
                    self.produced += 1;
                    return Some(item);
                }
                Ok(item) => {
                    debug!(archive = %item.archive_path, "filtered out by media type");
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping posterpack");
                    self.warnings.push(ScanWarning {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ScanWarning> {
        self.warnings
    }

    /// Next archive file in deterministic (name-sorted) walk order.
    ///
    /// Each directory step runs on the blocking pool.
    async fn next_candidate(&mut self) -> Option<(&'a Path, PathBuf)> {
        loop {
            let (root, mut walker) = match self.current.take() {
                Some(current) => current,
                None => {
                    let Some(root) = self.roots.next() else {
                        self.finish_walk();
                        return None;
                    };
                    let walker = WalkDir::new(root)
                        .follow_links(true)
                        .sort_by_file_name()
                        .into_iter();
                    (root.as_path(), walker)
                }
            };

            let stepped = tokio::task::spawn_blocking(move || {
                let next = walker.next();
                (walker, next)
            })
            .await;
            let (walker, next) = match stepped {
                Ok(stepped) => stepped,
                Err(err) => {
                    // Part of this root went unseen; keep its cached packs
                    self.prune_on_finish = false;
                    warn!(root = %root.display(), error = %err, "posterpack directory walk aborted");
                    self.warnings.push(ScanWarning {
                        path: root.to_path_buf(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            match next {
                None => {}
                Some(Err(err)) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    warn!(path = %path.display(), error = %err, "cannot walk posterpack directory");
                    self.warnings.push(ScanWarning {
                        path,
                        reason: err.to_string(),
                    });
                    self.current = Some((root, walker));
                }
                Some(Ok(entry)) => {
                    self.current = Some((root, walker));
                    if entry.file_type().is_file() && self.scanner.config.is_archive(entry.path()) {
                        let path = entry.into_path();
                        self.seen.insert(path.clone());
                        return Some((root, path));
                    }
                }
            }
        }
    }

    /// Forget cached packs whose archives this completed walk did not find.
    fn finish_walk(&mut self) {
        if !self.prune_on_finish {
            return;
        }
        self.prune_on_finish = false;
        let seen = std::mem::take(&mut self.seen);
        let dropped = self.scanner.cache.retain(|path| seen.contains(path));
        if dropped > 0 {
            debug!(dropped, "dropped cached posterpacks no longer on disk");
        }
    }
}

/// Parse `metadata.json`, falling back to an empty descriptor when it is
/// missing or unusable.
async fn read_metadata<R: ReadAt>(index: &ArchiveIndex<R>, path: &Path) -> PosterpackMetadata {
    let Some(entry) = index.find_basename(METADATA_ENTRY) else {
        debug!(path = %path.display(), "no metadata.json, using filename");
        return PosterpackMetadata::default();
    };

    if entry.uncompressed_size > MAX_METADATA_SIZE {
        warn!(
            path = %path.display(),
            size = entry.uncompressed_size,
            "metadata.json too large, ignoring"
        );
        return PosterpackMetadata::default();
    }

    let parsed = match index.read_entry(entry).await {
        Ok(raw) => PosterpackMetadata::from_slice(&raw),
        Err(err) => Err(err),
    };
    parsed.unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "unusable metadata.json, using filename");
        PosterpackMetadata::default()
    })
}

/// `path` relative to `root`, joined with `/` regardless of platform.
pub fn relative_archive_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_uses_forward_slashes() {
        let root = Path::new("/media/packs");
        assert_eq!(
            relative_archive_path(root, Path::new("/media/packs/movies/Heat (1995).zip")),
            "movies/Heat (1995).zip"
        );
        assert_eq!(
            relative_archive_path(root, Path::new("/media/packs/a.zip")),
            "a.zip"
        );
    }
}
