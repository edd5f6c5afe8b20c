//! # Error Types: Registry Failures
//!
//! Lookup is the only fallible registry operation. Registration and
//! removal are total: overwriting a key and removing an absent key are
//! both well-defined outcomes, not failures.

use thiserror::Error;

/// Error raised by [`TypeRegistry`](crate::TypeRegistry) lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No record type is registered under the requested key.
    #[error("no record type registered under key '{key}'")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },
}
