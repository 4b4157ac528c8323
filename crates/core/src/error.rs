//! Storage error types
//!
//! Errors returned by the fixed-capacity item storages.

/// Errors from item storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is at capacity
    Full,
    /// Index is past the end of the stored items
    IndexOutOfBounds,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageError::Full => write!(f, "item storage full"),
            StorageError::IndexOutOfBounds => write!(f, "item index out of bounds"),
        }
    }
}
