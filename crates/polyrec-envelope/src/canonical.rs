//! # Canonical Text: JCS Envelope Rendering
//!
//! `CanonicalText` is the deterministic text form of a tagged mapping.
//! Equal records always produce byte-identical canonical text, which makes
//! the output suitable for hashing, signing, or byte-wise comparison.
//!
//! ## Invariants
//!
//! - The only constructor is [`CanonicalText::new`].
//! - Object keys are sorted, including the tag field and nested objects.
//! - Separators are compact; there is no trailing whitespace.
//! - Output is UTF-8 with non-ASCII characters passed through unescaped.
//!
//! Serialization is delegated to `serde_jcs` (RFC 8785).

use polyrec_core::FieldMapping;

/// Text produced exclusively by RFC 8785 canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalText(String);

impl CanonicalText {
    /// Canonicalize a field mapping.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a value cannot be represented
    /// (for example a non-finite float).
    pub fn new(mapping: &FieldMapping) -> Result<Self, serde_json::Error> {
        serde_jcs::to_string(mapping).map(Self)
    }

    /// Access the canonical text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Access the canonical UTF-8 bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the text is empty. Never true for a canonical mapping.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for CanonicalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for CanonicalText {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
