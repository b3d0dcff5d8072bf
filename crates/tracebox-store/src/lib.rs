//! Trace blob storage for tracebox.
//!
//! Uploaded traces are opaque byte sequences stored one file per blob in a
//! single flat directory. Each file is named by a [`TraceId`]: 120 bits of
//! OS randomness in URL-safe base64, so names are unguessable and collisions
//! are negligible.
//!
//! # Components
//!
//! - [`TraceId`] -- identifier generation and validation of untrusted input
//! - [`StorageRoot`] -- creates the storage directory and checks it is writable
//! - [`TraceStore::write`] -- streams an upload to disk under a fresh identifier
//! - [`TraceStore::resolve`] -- maps an identifier back to a stored file
//!
//! # Rules
//!
//! 1. Blobs are immutable once written; an existing file is never overwritten.
//! 2. Identifiers are validated before any path is constructed.
//! 3. Uploads are copied in bounded chunks, never buffered whole.
//! 4. The store holds no shared mutable state; operations on different
//!    identifiers never contend.

pub mod error;
pub mod id;
pub mod resolver;
pub mod root;
pub mod store;
pub mod writer;

pub use error::{IdError, StoreError, StoreResult};
pub use id::TraceId;
pub use resolver::ResolvedTrace;
pub use root::StorageRoot;
pub use store::TraceStore;
pub use writer::{StoredTrace, COPY_CHUNK_SIZE, MAX_ID_ATTEMPTS};
