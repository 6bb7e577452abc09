//! The persistence contract for applied sets.

use dbrefactor_core::AppliedSet;

use crate::error::StorageError;

/// Namespace prefix of every stored record.
pub const STORAGE_PREFIX: &str = "dbrefactor.applied";

/// Storage key of the record holding `root_key`'s applied set.
pub fn storage_key(root_key: &str) -> String {
    format!("{STORAGE_PREFIX}.{root_key}")
}

/// Durable home of the applied sets, one record per root key.
///
/// Implementations must be thread-safe (`Send + Sync`). There is no locking across a
/// load/modify/save cycle: when two writers interleave, the last save wins.
pub trait AppliedStore: Send + Sync {
    /// Loads the applied set for `root_key`.
    ///
    /// Never fails. A missing record, an unavailable backend or a payload that does not
    /// parse all yield an empty set.
    fn load(&self, root_key: &str) -> AppliedSet;

    /// Replaces the stored set for `root_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written.
    fn save(&self, root_key: &str, applied: &AppliedSet) -> Result<(), StorageError>;

    /// Removes the record for `root_key`. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record could not be removed.
    fn clear(&self, root_key: &str) -> Result<bool, StorageError>;

    /// Returns a short name for logging.
    fn backend_name(&self) -> &'static str;
}
