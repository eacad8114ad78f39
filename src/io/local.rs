use super::ReadAt;
use async_trait::async_trait;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Local archive reader with positional reads.
///
/// Every read runs on tokio's blocking pool, so a slow disk never stalls
/// the async workers. The file handle is closed when the last reader and
/// in-flight read are dropped.
pub struct LocalFileReader {
    file: Arc<File>,
    path: PathBuf,
    size: u64,
}

impl LocalFileReader {
    pub async fn open(path: &Path) -> io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        Ok(Self {
            file: Arc::new(file.into_std().await),
            path: path.to_path_buf(),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.size || buf.is_empty() {
            return Ok(0);
        }

        let file = Arc::clone(&self.file);
        let len = buf.len();
        let (n, data) = tokio::task::spawn_blocking(move || {
            let mut data = vec![0u8; len];
            let n = read_at_blocking(&file, &mut data, offset)?;
            Ok::<_, io::Error>((n, data))
        })
        .await
        .map_err(io::Error::other)??;

        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

fn read_at_blocking(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.read_at(buf, offset)
    }

    #[cfg(windows)]
    {
        // seek_read moves the handle's cursor, but every read passes its own offset
        use std::os::windows::fs::FileExt;
        file.seek_read(buf, offset)
    }

    #[cfg(not(any(unix, windows)))]
    {
        use std::io::{Read, Seek, SeekFrom};
        let mut file = file;
        file.seek(SeekFrom::Start(offset))?;
        file.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn positional_reads_from_the_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let contents: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        std::fs::write(&path, &contents).unwrap();

        let reader = LocalFileReader::open(&path).await.unwrap();
        assert_eq!(reader.size(), 10_000);

        let mut head = [0u8; 16];
        let mut tail = [0u8; 16];
        let (a, b) = tokio::join!(
            reader.read_exact_at(0, &mut head),
            reader.read_exact_at(9_984, &mut tail)
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(head, contents[..16]);
        assert_eq!(tail, contents[9_984..]);

        let mut past = [0u8; 4];
        assert_eq!(reader.read_at(10_000, &mut past).await.unwrap(), 0);
        let err = reader.read_exact_at(9_998, &mut past).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalFileReader::open(&dir.path().join("absent.zip"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
