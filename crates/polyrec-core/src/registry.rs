//! # Type Registry
//!
//! Maps [`RegistryKey`]s to [`RecordType`] descriptors so a decoder can
//! turn a key read off the wire into a concrete type.
//!
//! ## Policy
//!
//! - **Last writer wins.** Registering under an existing key replaces the
//!   previous entry without error. Two threads racing to register the same
//!   key resolve in real-time order; this is accepted, not guarded against.
//! - **Removal is best effort.** Unregistering a key or type that is not
//!   present is a no-op.
//! - **Lookup is the only failure.** An absent key yields
//!   [`RegistryError::NotFound`]; there is no fallback type.
//!
//! ## Concurrency
//!
//! Entries live behind a `parking_lot::RwLock`. A new entry becomes
//! visible only once the write lock is released, so readers never see a
//! half-written entry. `parking_lot` locks are non-poisoning: a panic in
//! one caller cannot wedge the registry for the rest of the process.
//! Cloning a `TypeRegistry` yields another handle to the same entries.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::error::RegistryError;
use crate::key::RegistryKey;
use crate::record::{declared_types, Record, RecordType};

/// Shared, thread-safe key → record type mapping.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: Arc<RwLock<HashMap<RegistryKey, RecordType>>>,
}

/// What [`TypeRegistry::unregister`] should remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSelector {
    /// The entry stored under exactly this key.
    Key(RegistryKey),
    /// One entry (any one) whose stored type is this type.
    Type(RecordType),
}

impl From<RegistryKey> for RecordSelector {
    fn from(key: RegistryKey) -> Self {
        Self::Key(key)
    }
}

impl From<&RegistryKey> for RecordSelector {
    fn from(key: &RegistryKey) -> Self {
        Self::Key(key.clone())
    }
}

impl From<&str> for RecordSelector {
    fn from(key: &str) -> Self {
        Self::Key(RegistryKey::new(key))
    }
}

impl From<String> for RecordSelector {
    fn from(key: String) -> Self {
        Self::Key(RegistryKey::new(key))
    }
}

impl From<RecordType> for RecordSelector {
    fn from(ty: RecordType) -> Self {
        Self::Type(ty)
    }
}

impl From<&RecordType> for RecordSelector {
    fn from(ty: &RecordType) -> Self {
        Self::Type(*ty)
    }
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every type declared with
    /// [`polymorphic_record!`](crate::polymorphic_record), each under its
    /// derived key.
    pub fn with_declared() -> Self {
        let registry = Self::new();
        let mut count = 0usize;
        for ty in declared_types() {
            registry.register_type(ty);
            count += 1;
        }
        tracing::debug!(count, "registry populated from declared record types");
        registry
    }

    /// Store `ty` under `key`, or under its derived key when `key` is `None`.
    ///
    /// Overwrites any existing entry for the key. Returns `ty` unchanged.
    pub fn register(&self, key: Option<RegistryKey>, ty: RecordType) -> RecordType {
        let key = key.unwrap_or_else(|| ty.derived_key());
        let previous = self.entries.write().insert(key.clone(), ty);
        tracing::debug!(
            key = %key,
            record_type = ty.rust_name(),
            replaced = previous.is_some(),
            "record type registered"
        );
        ty
    }

    /// Store `ty` under its derived key.
    pub fn register_type(&self, ty: RecordType) -> RecordType {
        self.register(None, ty)
    }

    /// Register `T` under its derived key.
    pub fn register_record<T: Record>(&self) -> RecordType {
        self.register_type(RecordType::of::<T>())
    }

    /// Two-phase registration: bind the key now, supply the type later.
    ///
    /// The returned closure stores the type exactly as
    /// [`register`](Self::register) would and returns it unchanged.
    pub fn register_under(
        &self,
        key: impl Into<RegistryKey>,
    ) -> impl FnOnce(RecordType) -> RecordType + '_ {
        let key = key.into();
        move |ty| self.register(Some(key), ty)
    }

    /// Resolve a key to its record type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if nothing is registered under `key`.
    pub fn lookup(&self, key: impl AsRef<str>) -> Result<RecordType, RegistryError> {
        let key = key.as_ref();
        self.entries
            .read()
            .get(key)
            .copied()
            .ok_or_else(|| RegistryError::NotFound {
                key: key.to_string(),
            })
    }

    /// Remove an entry by key, or one entry holding a given type.
    ///
    /// Never fails. Returns the removed entry, or `None` when nothing
    /// matched. Removing by type removes at most one entry even if the
    /// type is registered under several keys.
    pub fn unregister(&self, target: impl Into<RecordSelector>) -> Option<(RegistryKey, RecordType)> {
        let mut entries = self.entries.write();
        let removed = match target.into() {
            RecordSelector::Key(key) => entries.remove_entry(&key),
            RecordSelector::Type(ty) => {
                let key = entries
                    .iter()
                    .find(|(_, stored)| **stored == ty)
                    .map(|(key, _)| key.clone());
                key.and_then(|key| entries.remove_entry(&key))
            }
        };
        drop(entries);

        if let Some((key, ty)) = &removed {
            tracing::debug!(key = %key, record_type = ty.rust_name(), "record type unregistered");
        }
        removed
    }

    /// Returns true if an entry exists for `key`.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.entries.read().contains_key(key.as_ref())
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered keys, sorted.
    pub fn keys(&self) -> Vec<RegistryKey> {
        let mut keys: Vec<RegistryKey> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Every key `ty` is registered under, sorted.
    pub fn keys_for(&self, ty: &RecordType) -> Vec<RegistryKey> {
        let mut keys: Vec<RegistryKey> = self
            .entries
            .read()
            .iter()
            .filter(|(_, stored)| *stored == ty)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

static GLOBAL: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::with_declared);

/// Process-wide registry, built on first use from every declared record type.
///
/// Intended for the top-level convenience entry points. Components that
/// need isolation (tests, plugins with their own type sets) should own a
/// [`TypeRegistry`] instead.
pub fn global() -> &'static TypeRegistry {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use std::thread;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::key::derive_key;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct MyModel {
        value: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct MyModel2 {
        value: u32,
    }

    /// Registered only by hand, never through the macro.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Undeclared {
        value: u32,
    }

    crate::polymorphic_record!(MyModel, MyModel2);

    impl Record for Undeclared {
        const TYPE_NAME: &'static str = "Undeclared";
        const NAMESPACE: &'static str = "manual";
    }

    #[test]
    fn test_register_with_explicit_key() {
        let registry = TypeRegistry::new();
        let ty = RecordType::of::<MyModel>();
        let returned = registry.register(Some("MyModel".into()), ty);
        assert_eq!(returned, ty);
        assert_eq!(registry.lookup("MyModel").unwrap(), ty);
    }

    #[test]
    fn test_register_derives_key_when_omitted() {
        let registry = TypeRegistry::new();
        registry.register(None, RecordType::of::<MyModel>());
        let key = derive_key::<MyModel>();
        assert!(registry.lookup(&key).unwrap().is::<MyModel>());
    }

    #[test]
    fn test_register_forms_store_the_same_entry() {
        let single = TypeRegistry::new();
        single.register(Some("app.Model".into()), RecordType::of::<MyModel>());

        let two_phase = TypeRegistry::new();
        let bind = two_phase.register_under("app.Model");
        let returned = bind(RecordType::of::<MyModel>());
        assert!(returned.is::<MyModel>());

        assert_eq!(single.keys(), two_phase.keys());
        assert_eq!(
            single.lookup("app.Model").unwrap(),
            two_phase.lookup("app.Model").unwrap()
        );

        let sole = TypeRegistry::new();
        sole.register_type(RecordType::of::<MyModel>());
        let auto = TypeRegistry::new();
        auto.register_record::<MyModel>();
        assert_eq!(sole.keys(), auto.keys());
        assert_eq!(sole.keys(), vec![derive_key::<MyModel>()]);
    }

    #[test]
    fn test_registering_twice_is_idempotent() {
        let registry = TypeRegistry::new();
        registry.register(Some("k".into()), RecordType::of::<MyModel>());
        registry.register(Some("k".into()), RecordType::of::<MyModel>());
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("k").unwrap().is::<MyModel>());
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = TypeRegistry::new();
        registry.register(Some("k".into()), RecordType::of::<MyModel>());
        registry.register(Some("k".into()), RecordType::of::<MyModel2>());
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("k").unwrap().is::<MyModel2>());
    }

    #[test]
    fn test_lookup_missing_key_fails() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.lookup("no.such.Type").unwrap_err(),
            RegistryError::NotFound {
                key: "no.such.Type".into()
            }
        );
    }

    #[test]
    fn test_unregister_by_key() {
        let registry = TypeRegistry::new();
        registry.register(Some("MyModel".into()), RecordType::of::<MyModel>());
        let removed = registry.unregister("MyModel");
        assert_eq!(
            removed,
            Some((RegistryKey::new("MyModel"), RecordType::of::<MyModel>()))
        );
        assert!(registry.lookup("MyModel").is_err());
    }

    #[test]
    fn test_unregister_by_type() {
        let registry = TypeRegistry::new();
        registry.register(Some("MyModel".into()), RecordType::of::<MyModel>());
        registry.unregister(RecordType::of::<MyModel>());
        assert!(registry.lookup("MyModel").is_err());
    }

    #[test]
    fn test_unregister_derived_key_by_key_and_by_type() {
        let registry = TypeRegistry::new();
        let key = derive_key::<MyModel>();

        registry.register_record::<MyModel>();
        registry.unregister(&key);
        assert!(registry.lookup(&key).is_err());

        registry.register_record::<MyModel>();
        registry.unregister(&RecordType::of::<MyModel>());
        assert!(registry.lookup(&key).is_err());
    }

    #[test]
    fn test_unregister_absent_key_is_noop() {
        let registry = TypeRegistry::new();
        registry.register(Some("keep".into()), RecordType::of::<MyModel>());
        assert_eq!(registry.unregister("nonexistent-key"), None);
        assert_eq!(registry.keys(), vec![RegistryKey::new("keep")]);
    }

    #[test]
    fn test_unregister_absent_type_is_noop() {
        let registry = TypeRegistry::new();
        registry.register(Some("keep".into()), RecordType::of::<MyModel>());
        assert_eq!(registry.unregister(RecordType::of::<MyModel2>()), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_by_type_removes_exactly_one() {
        let registry = TypeRegistry::new();
        let ty = RecordType::of::<MyModel>();
        registry.register(Some("a".into()), ty);
        registry.register(Some("b".into()), ty);
        registry.register(Some("other".into()), RecordType::of::<MyModel2>());

        let (removed_key, removed_ty) = registry.unregister(ty).expect("one entry removed");
        assert_eq!(removed_ty, ty);
        assert!(removed_key.as_str() == "a" || removed_key.as_str() == "b");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.keys_for(&ty).len(), 1);
        assert!(registry.contains("other"));
    }

    #[test]
    fn test_with_declared_contains_macro_types_only() {
        let registry = TypeRegistry::with_declared();
        assert!(registry.lookup(derive_key::<MyModel>()).unwrap().is::<MyModel>());
        assert!(registry.lookup(derive_key::<MyModel2>()).unwrap().is::<MyModel2>());
        assert!(!registry.contains(derive_key::<Undeclared>()));
    }

    #[test]
    fn test_global_is_populated_from_declarations() {
        assert!(global().contains(derive_key::<MyModel>()));
    }

    #[test]
    fn test_independent_registries_do_not_leak() {
        let a = TypeRegistry::new();
        let b = TypeRegistry::new();
        a.register_record::<Undeclared>();
        assert!(a.contains("manual.Undeclared"));
        assert!(!b.contains("manual.Undeclared"));
    }

    #[test]
    fn test_clones_share_entries() {
        let a = TypeRegistry::new();
        let b = a.clone();
        a.register_record::<MyModel>();
        assert!(b.contains(derive_key::<MyModel>()));
    }

    #[test]
    fn test_concurrent_registration_under_distinct_keys() {
        let registry = TypeRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        registry.register(
                            Some(format!("k{i}.{j}").into()),
                            RecordType::of::<MyModel>(),
                        );
                        assert!(registry.lookup(format!("k{i}.{j}")).is_ok());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8 * 50);
    }

    #[test]
    fn test_concurrent_same_key_resolves_to_one_writer() {
        let registry = TypeRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let ty = if i % 2 == 0 {
                        RecordType::of::<MyModel>()
                    } else {
                        RecordType::of::<MyModel2>()
                    };
                    registry.register(Some("shared".into()), ty);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let ty = registry.lookup("shared").unwrap();
        assert!(ty.is::<MyModel>() || ty.is::<MyModel2>());
        assert_eq!(registry.len(), 1);
    }
}
