use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::id::TraceId;

/// The single flat directory holding every trace file.
///
/// Construct it once with [`StorageRoot::ensure`] and hand it to the store;
/// it is read-only afterwards and cheap to clone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    /// Create `path` (and its parents) if absent, then confirm the process
    /// can write into it.
    ///
    /// Writability is checked by creating and removing a probe file, which
    /// reflects ACLs and read-only mounts that permission bits alone miss.
    /// This runs once; later permission changes surface as write errors.
    pub fn ensure(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        fs::create_dir_all(&path)
            .map_err(|e| configuration(&path, format!("cannot create directory: {e}")))?;

        let metadata = fs::metadata(&path).map_err(|e| configuration(&path, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(configuration(&path, "not a directory".into()));
        }

        let probe = tempfile::Builder::new()
            .prefix(".tracebox-probe-")
            .tempfile_in(&path)
            .map_err(|e| configuration(&path, format!("not writable: {e}")))?;
        debug!(probe = %probe.path().display(), "storage root write probe succeeded");
        drop(probe);

        info!(path = %path.display(), "storage root ready");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage location for `id`. The mapping is a single flat join.
    pub fn blob_path(&self, id: &TraceId) -> PathBuf {
        self.path.join(id.as_str())
    }
}

fn configuration(path: &Path, reason: String) -> StoreError {
    StoreError::Configuration {
        path: path.to_path_buf(),
        reason,
    }
}
