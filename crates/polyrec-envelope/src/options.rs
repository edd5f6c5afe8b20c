//! # Envelope Options
//!
//! Options are plain serde data so a host application can embed them in
//! its own configuration file. Every field has a default; an empty table
//! deserializes to [`EnvelopeOptions::default()`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Reserved field name carrying the registry key in every message.
pub const DEFAULT_TAG_FIELD: &str = "DECODER_MODEL_TYPE";

/// How an envelope renders its mapping as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    /// Compact JSON.
    #[default]
    Compact,
    /// Indented JSON for humans.
    Pretty,
    /// RFC 8785 canonical JSON: sorted keys, compact separators,
    /// byte-identical output for equal records.
    Canonical,
}

/// Envelope configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvelopeOptions {
    /// Field holding the registry key. Must not be a field of any record.
    pub tag_field: String,
    /// Output text format. Decoding accepts any well-formed JSON.
    pub format: TextFormat,
    /// Drop top-level fields whose value is `null` before tagging.
    pub exclude_none: bool,
    /// When set, only these top-level fields are encoded.
    pub include: Option<BTreeSet<String>>,
    /// Top-level fields never encoded.
    pub exclude: BTreeSet<String>,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            tag_field: DEFAULT_TAG_FIELD.to_string(),
            format: TextFormat::default(),
            exclude_none: false,
            include: None,
            exclude: BTreeSet::new(),
        }
    }
}

impl EnvelopeOptions {
    /// Use `tag_field` as the reserved tag field.
    pub fn with_tag_field(mut self, tag_field: impl Into<String>) -> Self {
        self.tag_field = tag_field.into();
        self
    }

    /// Render encoded mappings as `format`.
    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    /// Omit `null` fields from encoded mappings.
    pub fn with_exclude_none(mut self, exclude_none: bool) -> Self {
        self.exclude_none = exclude_none;
        self
    }

    /// Encode only the named fields.
    pub fn with_include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Never encode the named fields.
    pub fn with_exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if a field survives the include/exclude/null filters.
    pub(crate) fn keeps_field(&self, name: &str, value: &serde_json::Value) -> bool {
        if self.exclude_none && value.is_null() {
            return false;
        }
        if self.exclude.contains(name) {
            return false;
        }
        self.include.as_ref().map_or(true, |include| include.contains(name))
    }
}
