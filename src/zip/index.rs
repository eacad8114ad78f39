use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::io::{LocalFileReader, ReadAt};

use super::parser::ZipParser;
use super::structures::ArchiveEntry;

/// Name-addressable view of an archive's central directory.
///
/// Built once per open archive and read-only afterwards. When a name occurs
/// more than once, the later central-directory record wins, matching how
/// appending ZIP writers supersede entries.
pub struct ArchiveIndex<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ArchiveEntry>,
    by_name: HashMap<String, usize>,
}

impl ArchiveIndex<LocalFileReader> {
    /// Open an archive on disk and index its central directory.
    pub async fn open(path: &Path) -> Result<Self> {
        let reader = LocalFileReader::open(path).await.map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::ArchiveNotFound(path.to_path_buf())
            } else {
                StoreError::Io(err)
            }
        })?;
        Self::from_reader(Arc::new(reader)).await
    }
}

impl<R: ReadAt> ArchiveIndex<R> {
    pub async fn from_reader(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let listed = parser.list_entries().await?;

        let mut entries: Vec<ArchiveEntry> = Vec::with_capacity(listed.len());
        let mut by_name = HashMap::with_capacity(listed.len());
        for entry in listed {
            match by_name.get(&entry.name) {
                Some(&slot) => {
                    debug!(entry = %entry.name, "duplicate entry name, later record wins");
                    entries[slot] = entry;
                }
                None => {
                    by_name.insert(entry.name.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        Ok(Self {
            parser,
            entries,
            by_name,
        })
    }

    /// Look up an entry by its exact name.
    pub fn lookup(&self, name: &str) -> Result<&ArchiveEntry> {
        self.by_name
            .get(name)
            .map(|&slot| &self.entries[slot])
            .ok_or_else(|| StoreError::EntryNotFound(name.to_string()))
    }

    /// Unique entries in first-seen order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// File entries whose lowercased basename stem equals `stem`.
    pub fn files_with_stem<'a>(&'a self, stem: &'a str) -> impl Iterator<Item = &'a ArchiveEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| !e.is_directory && e.stem() == stem)
    }

    /// First file entry whose basename matches `basename`, ignoring case.
    pub fn find_basename(&self, basename: &str) -> Option<&ArchiveEntry> {
        self.entries
            .iter()
            .find(|e| !e.is_directory && e.basename().eq_ignore_ascii_case(basename))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn parser(&self) -> &ZipParser<R> {
        &self.parser
    }

    pub fn reader(&self) -> &Arc<R> {
        self.parser.reader()
    }
}
