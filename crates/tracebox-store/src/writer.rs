use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::id::TraceId;
use crate::store::TraceStore;

/// Bytes moved per read/write step. Memory use per upload is bounded by this.
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Identifiers drawn before giving up on finding an unused file name.
pub const MAX_ID_ATTEMPTS: usize = 4;

/// A trace that has been written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredTrace {
    pub id: TraceId,
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
}

impl TraceStore {
    /// Stream `reader` into a new file under a freshly generated identifier.
    ///
    /// The file is created with `create_new`, so an existing blob is never
    /// overwritten: on the (astronomically unlikely) collision another
    /// identifier is drawn. If the copy fails, the partial file is removed.
    pub async fn write<R>(&self, reader: &mut R) -> StoreResult<StoredTrace>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.write_with_ids(reader, TraceId::generate).await
    }

    pub(crate) async fn write_with_ids<R>(
        &self,
        reader: &mut R,
        next_id: impl FnMut() -> TraceId,
    ) -> StoreResult<StoredTrace>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let (id, path, file) = self.create_blob_file(next_id).await?;
        debug!(%id, "receiving trace");

        match copy_chunks(reader, file, &path).await {
            Ok(size) => {
                info!(%id, size, path = %path.display(), "stored trace");
                Ok(StoredTrace { id, path, size })
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&path).await {
                    warn!(%id, error = %rm, "failed to remove partial trace");
                }
                Err(e)
            }
        }
    }

    async fn create_blob_file(
        &self,
        mut next_id: impl FnMut() -> TraceId,
    ) -> StoreResult<(TraceId, PathBuf, File)> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = next_id();
            let path = self.root.blob_path(&id);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((id, path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(%id, "identifier collision, drawing another");
                }
                Err(source) => return Err(StoreError::Write { path, source }),
            }
        }
        Err(StoreError::IdentifierExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

async fn copy_chunks<R>(reader: &mut R, mut file: File, path: &Path) -> StoreResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => return Err(StoreError::Upload { source }),
        };
        file.write_all(&buf[..n]).await.map_err(write_err)?;
        written += n as u64;
    }
    file.flush().await.map_err(write_err)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use tokio::io::ReadBuf;

    use super::*;

    /// Yields `good` bytes, then fails.
    struct FailingReader {
        good: usize,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.good == 0 {
                let err = io::Error::new(ErrorKind::ConnectionReset, "client went away");
                return Poll::Ready(Err(err));
            }
            let n = self.good.min(buf.remaining());
            buf.put_slice(&vec![7u8; n]);
            self.good -= n;
            Poll::Ready(Ok(()))
        }
    }

    fn temp_store() -> (tempfile::TempDir, TraceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TraceStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn writes_exact_bytes() {
        let (_dir, store) = temp_store();
        let stored = store.write(&mut &b"hello-trace"[..]).await.unwrap();
        assert_eq!(stored.size, 11);
        assert_eq!(stored.path, store.root().blob_path(&stored.id));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"hello-trace");
    }

    #[tokio::test]
    async fn empty_stream_creates_empty_file() {
        let (_dir, store) = temp_store();
        let stored = store.write(&mut tokio::io::empty()).await.unwrap();
        assert_eq!(stored.size, 0);
        assert!(stored.path.is_file());
    }

    #[tokio::test]
    async fn failed_upload_removes_partial_file() {
        let (dir, store) = temp_store();
        let mut reader = FailingReader { good: COPY_CHUNK_SIZE * 2 };
        let err = store.write(&mut reader).await.unwrap_err();
        assert!(matches!(err, StoreError::Upload { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn removed_root_surfaces_write_error() {
        let (dir, store) = temp_store();
        std::fs::remove_dir(dir.path()).unwrap();
        let err = store.write(&mut &b"x"[..]).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn collision_keeps_existing_blob_and_draws_again() {
        let (_dir, store) = temp_store();
        let taken = TraceId::generate();
        let fresh = TraceId::generate();
        std::fs::write(store.root().blob_path(&taken), b"existing").unwrap();

        let mut ids = vec![taken.clone(), fresh.clone()].into_iter();
        let stored = store
            .write_with_ids(&mut &b"new upload"[..], || ids.next().unwrap())
            .await
            .unwrap();

        assert_eq!(stored.id, fresh);
        assert_eq!(std::fs::read(store.root().blob_path(&taken)).unwrap(), b"existing");
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"new upload");
    }

    #[tokio::test]
    async fn exhausted_identifiers_are_reported() {
        let (dir, store) = temp_store();
        let taken = TraceId::generate();
        std::fs::write(store.root().blob_path(&taken), b"existing").unwrap();

        let mut draws = 0;
        let err = store
            .write_with_ids(&mut &b"new upload"[..], || {
                draws += 1;
                taken.clone()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::IdentifierExhausted { attempts: 4 }));
        assert_eq!(draws, MAX_ID_ATTEMPTS);
        assert_eq!(std::fs::read(store.root().blob_path(&taken)).unwrap(), b"existing");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
