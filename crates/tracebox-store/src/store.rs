use std::path::Path;

use crate::error::StoreResult;
use crate::root::StorageRoot;

/// Handle to a trace store rooted at one directory.
///
/// Holds no mutable state: writes and reads for different identifiers never
/// contend, so clones may be shared freely across concurrent requests. Each
/// operation opens its own file handle.
#[derive(Clone, Debug)]
pub struct TraceStore {
    pub(crate) root: StorageRoot,
}

impl TraceStore {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    /// Validate (creating if needed) the directory at `path` and open a store on it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        StorageRoot::ensure(path).map(Self::new)
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }
}
