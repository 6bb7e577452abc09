//! # dbrefactor-storage
//!
//! Persistence of applied sets, partitioned by root key.
//!
//! Every root key owns one record stored under `dbrefactor.applied.<root key>` whose
//! value is a JSON array of fingerprint strings. The contract is [`AppliedStore`]:
//!
//! ```ignore
//! use dbrefactor_core::{mark_applied, pending};
//! use dbrefactor_storage::{AppliedStore, FileStore};
//!
//! let store = FileStore::new(state_dir);
//! let mut applied = store.load("SOLUTION");
//! let todo = pending(plan.entries(), &applied);
//! backend_apply(&todo).await?;
//! mark_applied(todo, &mut applied);
//! store.save("SOLUTION", &applied)?;
//! ```
//!
//! Loading never fails; absence and corruption both read as "nothing applied yet".

mod error;
mod file;
mod memory;
mod traits;

pub use error::StorageError;
pub use file::FileStore;
pub use memory::{MemoryStore, NullStore};
pub use traits::{AppliedStore, STORAGE_PREFIX, storage_key};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a boxed store trait object.
pub type DynStore = std::sync::Arc<dyn AppliedStore>;
