//! # Registry Keys
//!
//! `RegistryKey` is the string that names a concrete record type on the
//! wire. The default key is derived from the type's declaring module and
//! its declared name: `<namespace>.<TypeName>`.
//!
//! Rust module paths separate segments with `::`. Derivation rewrites them
//! to `.` so a type `Person` declared in `app::models` is keyed
//! `app.models.Person`, the dotted form that travels in messages.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// String key identifying a concrete record type.
///
/// Keys compare by exact string equality. There is no normalization beyond
/// what [`RegistryKey::from_parts`] applies during derivation; a key
/// supplied explicitly by a caller is stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryKey(String);

impl RegistryKey {
    /// Wrap an explicit key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Build the default key from a declaring namespace and a type name.
    pub fn from_parts(namespace: &str, name: &str) -> Self {
        Self(format!("{}.{}", namespace.replace("::", "."), name))
    }

    /// Access the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegistryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RegistryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegistryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RegistryKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Derive the default registry key for `T`.
///
/// Pure and deterministic: depends only on `T::NAMESPACE` and
/// `T::TYPE_NAME`, so two types with the same name in different modules
/// never share a derived key.
pub fn derive_key<T: Record>() -> RegistryKey {
    RegistryKey::from_parts(T::NAMESPACE, T::TYPE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_joins_with_dot() {
        let key = RegistryKey::from_parts("app", "Person");
        assert_eq!(key.as_str(), "app.Person");
    }

    #[test]
    fn test_module_separators_become_dots() {
        let key = RegistryKey::from_parts("app::models::people", "Person");
        assert_eq!(key.as_str(), "app.models.people.Person");
    }

    #[test]
    fn test_explicit_key_is_verbatim() {
        let key = RegistryKey::new("Model2");
        assert_eq!(key.to_string(), "Model2");
        assert_eq!(RegistryKey::from("a::b"), RegistryKey::new("a::b"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = RegistryKey::new("app.Person");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"app.Person\"");
        let back: RegistryKey = serde_json::from_str("\"app.Person\"").unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_borrow_allows_str_lookups() {
        let mut map = std::collections::HashMap::new();
        map.insert(RegistryKey::new("app.Person"), 1);
        assert_eq!(map.get("app.Person"), Some(&1));
    }
}
