//! # polyrec-envelope: Self-Describing Record Messages
//!
//! Serializes any registered record into a JSON object tagged with the
//! record's type key, and deserializes such objects back into the exact
//! original type through a [`TypeRegistry`].
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//!     dob: Option<String>,
//! }
//!
//! polyrec_envelope::polymorphic_record!(Person);
//!
//! fn main() {
//!     let john = Person { first_name: "John".into(), last_name: "Doe".into(), dob: None };
//!     let msg = polyrec_envelope::encode(&john).unwrap();
//!
//!     // The consumer needs no compile-time knowledge of `Person`.
//!     let decoded = polyrec_envelope::decode(&msg).unwrap();
//!     assert_eq!(decoded.downcast_ref::<Person>(), Some(&john));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`envelope`]: [`Envelope`], tagged encode and registry-resolved decode.
//! - [`options`]: tag field name and output text format.
//! - [`canonical`]: RFC 8785 canonical rendering.
//! - [`error`]: one variant per decode step.
//!
//! The free functions [`encode`], [`decode`] and [`decode_as`] use the
//! process-wide registry from [`polyrec_core::global`] and default options.

pub mod canonical;
pub mod envelope;
pub mod error;
pub mod options;

use std::sync::LazyLock;

use polyrec_core::{DynRecord, Record};

pub use canonical::CanonicalText;
pub use envelope::Envelope;
pub use error::{EnvelopeError, ErrorKind};
pub use options::{EnvelopeOptions, TextFormat, DEFAULT_TAG_FIELD};
pub use polyrec_core::{
    derive_key, global, polymorphic_record, RecordSelector, RecordType, RegistryError, RegistryKey,
    TypeRegistry,
};

static DEFAULT_ENVELOPE: LazyLock<Envelope> = LazyLock::new(|| Envelope::new(global().clone()));

/// Encode a record with the global registry and default options.
pub fn encode(record: &dyn DynRecord) -> Result<String, EnvelopeError> {
    DEFAULT_ENVELOPE.to_text(record)
}

/// Decode a text or UTF-8 byte message with the global registry.
pub fn decode(msg: impl AsRef<[u8]>) -> Result<Box<dyn DynRecord>, EnvelopeError> {
    DEFAULT_ENVELOPE.from_bytes(msg.as_ref())
}

/// Decode a message that must hold a `T`, with the global registry.
pub fn decode_as<T: Record>(msg: impl AsRef<[u8]>) -> Result<T, EnvelopeError> {
    DEFAULT_ENVELOPE.decode_as(msg)
}
