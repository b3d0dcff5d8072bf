use std::path::PathBuf;

use tokio::fs::{self, File};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::id::TraceId;
use crate::store::TraceStore;

/// A stored trace located by identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTrace {
    pub id: TraceId,
    pub path: PathBuf,
    /// Suggested filename for downloads (`<id>.trace`). Presentation only.
    pub download_name: String,
}

impl TraceStore {
    /// Locate the trace named by untrusted input `raw_id`.
    ///
    /// Anything that is not a well-formed identifier is treated as absent
    /// before a path is ever built, so traversal sequences and separators
    /// cannot reach the filesystem. Returns `None` when no regular file
    /// exists for the identifier.
    pub async fn resolve(&self, raw_id: &str) -> Option<ResolvedTrace> {
        let id = match TraceId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "rejected malformed trace id");
                return None;
            }
        };

        let path = self.root.blob_path(&id);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                let download_name = id.download_name();
                Some(ResolvedTrace { id, path, download_name })
            }
            _ => {
                debug!(%id, "trace not found");
                None
            }
        }
    }

    /// Open a resolved trace for streaming, returning the handle and its length.
    pub async fn open_blob(&self, trace: &ResolvedTrace) -> StoreResult<(File, u64)> {
        let read_err = |source| StoreError::Read {
            path: trace.path.clone(),
            source,
        };
        let file = File::open(&trace.path).await.map_err(read_err)?;
        let len = file.metadata().await.map_err(read_err)?.len();
        Ok((file, len))
    }
}
