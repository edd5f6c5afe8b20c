//! # Polymorphic Envelope
//!
//! Encodes a record as a JSON object carrying one extra field, the type
//! tag, whose value is the registry key of the record's runtime type.
//! Decoding reverses this: the tag is removed, resolved through a
//! [`TypeRegistry`], and the remaining fields are handed to the resolved
//! type's factory.
//!
//! ## Decode Pipeline
//!
//! 1. bytes → UTF-8 text ([`EnvelopeError::Encoding`])
//! 2. text → JSON object ([`EnvelopeError::Parse`], [`EnvelopeError::NotAMapping`])
//! 3. remove tag ([`EnvelopeError::MissingTag`], [`EnvelopeError::InvalidTag`])
//! 4. tag → record type ([`EnvelopeError::UnknownType`])
//! 5. fields → record ([`EnvelopeError::Validation`])
//!
//! Each step either succeeds or aborts the whole decode; nothing is retried.
//! Field validation belongs to the record's `Deserialize` impl and is not
//! repeated here.
//!
//! ## Tag Value
//!
//! The tag always holds the *derived* key of the record's runtime type,
//! regardless of any extra keys that type is registered under. A type
//! registered only under an explicit key therefore encodes fine but will
//! not decode unless its derived key is registered too.

use polyrec_core::{derive_key, DynRecord, FieldMapping, Record, RegistryKey, TypeRegistry};
use serde_json::Value;

use crate::canonical::CanonicalText;
use crate::error::{json_kind, EnvelopeError};
use crate::options::{EnvelopeOptions, TextFormat};

/// Encoder/decoder bound to a registry and a set of options.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Envelope {
    registry: TypeRegistry,
    options: EnvelopeOptions,
}

impl Envelope {
    /// Envelope with default options.
    pub fn new(registry: TypeRegistry) -> Self {
        Self::with_options(registry, EnvelopeOptions::default())
    }

    /// Envelope with explicit options.
    pub fn with_options(registry: TypeRegistry, options: EnvelopeOptions) -> Self {
        Self { registry, options }
    }

    /// Registry used to resolve tags on decode.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Options this envelope encodes and decodes with.
    pub fn options(&self) -> &EnvelopeOptions {
        &self.options
    }

    /// Name of the reserved tag field.
    pub fn tag_field(&self) -> &str {
        &self.options.tag_field
    }

    /// Render a record as its field mapping plus the type tag.
    ///
    /// Top-level fields are filtered by the `exclude_none`, `include` and
    /// `exclude` options before the tag is added; the tag itself is never
    /// filtered.
    ///
    /// # Errors
    ///
    /// - [`EnvelopeError::Serialization`] if the record's `Serialize` impl fails.
    /// - [`EnvelopeError::NotAMapping`] if the record does not serialize to an object.
    /// - [`EnvelopeError::TagCollision`] if the record already has a field
    ///   named like the tag.
    pub fn to_mapping(&self, record: &dyn DynRecord) -> Result<FieldMapping, EnvelopeError> {
        let key = record.record_key();
        let mut mapping = match record.to_value().map_err(EnvelopeError::Serialization)? {
            Value::Object(map) => map,
            other => {
                return Err(EnvelopeError::NotAMapping {
                    found: json_kind(&other),
                })
            }
        };

        let tag = self.tag_field();
        if mapping.contains_key(tag) {
            return Err(EnvelopeError::TagCollision {
                key,
                tag: tag.to_string(),
            });
        }
        mapping.retain(|name, value| self.options.keeps_field(name, value));
        mapping.insert(tag.to_string(), Value::String(key.into_inner()));
        Ok(mapping)
    }

    /// Encode a record as text in the configured [`TextFormat`].
    pub fn to_text(&self, record: &dyn DynRecord) -> Result<String, EnvelopeError> {
        let mapping = self.to_mapping(record)?;
        let text = match self.options.format {
            TextFormat::Compact => serde_json::to_string(&mapping),
            TextFormat::Pretty => serde_json::to_string_pretty(&mapping),
            TextFormat::Canonical => CanonicalText::new(&mapping).map(CanonicalText::into_string),
        }
        .map_err(EnvelopeError::Serialization)?;
        tracing::trace!(key = %record.record_key(), len = text.len(), "record encoded");
        Ok(text)
    }

    /// Encode a record as UTF-8 bytes in the configured [`TextFormat`].
    pub fn to_bytes(&self, record: &dyn DynRecord) -> Result<Vec<u8>, EnvelopeError> {
        self.to_text(record).map(String::into_bytes)
    }

    /// Encode a record as canonical text, whatever the configured format.
    pub fn to_canonical(&self, record: &dyn DynRecord) -> Result<CanonicalText, EnvelopeError> {
        let mapping = self.to_mapping(record)?;
        CanonicalText::new(&mapping).map_err(EnvelopeError::Serialization)
    }

    /// Decode a UTF-8 byte message.
    pub fn from_bytes(&self, msg: &[u8]) -> Result<Box<dyn DynRecord>, EnvelopeError> {
        let text = std::str::from_utf8(msg)?;
        self.from_text(text)
    }

    /// Decode a text message into a record of its tagged type.
    pub fn from_text(&self, msg: &str) -> Result<Box<dyn DynRecord>, EnvelopeError> {
        let mapping = match serde_json::from_str::<Value>(msg).map_err(EnvelopeError::Parse)? {
            Value::Object(map) => map,
            other => {
                return Err(EnvelopeError::NotAMapping {
                    found: json_kind(&other),
                })
            }
        };
        self.from_mapping(mapping)
    }

    /// Decode an already-parsed mapping. The tag field is consumed.
    pub fn from_mapping(&self, mut mapping: FieldMapping) -> Result<Box<dyn DynRecord>, EnvelopeError> {
        let tag = self.tag_field();
        let key = match mapping.remove(tag) {
            Some(Value::String(key)) => RegistryKey::from(key),
            Some(other) => {
                return Err(EnvelopeError::InvalidTag {
                    tag: tag.to_string(),
                    found: json_kind(&other),
                })
            }
            None => {
                tracing::trace!(tag, "message has no type tag");
                return Err(EnvelopeError::MissingTag {
                    tag: tag.to_string(),
                });
            }
        };

        let ty = self.registry.lookup(&key)?;
        let record = ty
            .construct(mapping)
            .map_err(|source| EnvelopeError::Validation {
                key: key.clone(),
                source,
            })?;
        tracing::trace!(key = %key, record_type = ty.rust_name(), "record decoded");
        Ok(record)
    }

    /// Decode a message that must hold a `T`.
    ///
    /// # Errors
    ///
    /// Any decode error, or [`EnvelopeError::TypeMismatch`] when the
    /// message decodes to a different registered type.
    pub fn decode_as<T: Record>(&self, msg: impl AsRef<[u8]>) -> Result<T, EnvelopeError> {
        let record = self.from_bytes(msg.as_ref())?;
        match record.downcast::<T>() {
            Ok(record) => Ok(*record),
            Err(other) => Err(EnvelopeError::TypeMismatch {
                expected: derive_key::<T>(),
                found: other.record_key(),
            }),
        }
    }
}
