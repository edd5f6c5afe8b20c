//! # polyrec-core: Type Registry for Polymorphic Records
//!
//! This crate is the leaf of the polyrec workspace. It owns the mapping
//! from wire-level type keys to concrete Rust record types, which is what
//! lets a consumer decode a message without knowing at compile time which
//! type it holds.
//!
//! ## Key Design Principles
//!
//! 1. **`RegistryKey` newtype.** Keys default to `<namespace>.<TypeName>`
//!    derived from `module_path!()`; explicit keys are accepted verbatim.
//!
//! 2. **Declaration-time registration.** [`polymorphic_record!`] implements
//!    [`Record`] and submits the type to a link-time collection, so a
//!    declared type cannot be forgotten at registration time.
//!
//! 3. **Injectable registry.** [`TypeRegistry`] is an ordinary value.
//!    [`global()`] exists for the top-level convenience API; tests and
//!    plugins build their own.
//!
//! 4. **Factories, not reflection.** Each [`RecordType`] carries a function
//!    pointer that builds the concrete type from a field mapping via serde.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `polyrec-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests. The single exception is the
//!   `unreachable!` in `downcast`, which follows a successful type check.

pub mod error;
pub mod key;
pub mod record;
pub mod registry;

// Re-export primary types for ergonomic imports.
pub use error::RegistryError;
pub use key::{derive_key, RegistryKey};
pub use record::{declared_types, ConstructFn, DynRecord, FieldMapping, Record, RecordDecl, RecordType};
pub use registry::{global, RecordSelector, TypeRegistry};

#[doc(hidden)]
pub use inventory;
