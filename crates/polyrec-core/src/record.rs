//! # Records and Type Descriptors
//!
//! A *record* is any serde-serializable value type that takes part in
//! polymorphic decode. Field schemas, coercion, defaults and validation
//! are entirely serde's business; this module only attaches an identity
//! to each record type and a factory that builds it from a field mapping.
//!
//! ## Declaration
//!
//! Record types are declared with [`polymorphic_record!`]:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct Person {
//!     first_name: String,
//!     last_name: String,
//! }
//!
//! polyrec_core::polymorphic_record!(Person);
//!
//! fn main() {
//!     let registry = polyrec_core::TypeRegistry::with_declared();
//!     let key = polyrec_core::derive_key::<Person>();
//!     assert!(registry.lookup(&key).is_ok());
//! }
//! ```
//!
//! The macro implements [`Record`] and submits a [`RecordDecl`] to a
//! link-time collection. Every registry built with
//! [`TypeRegistry::with_declared`](crate::TypeRegistry::with_declared)
//! therefore contains every declared type without any call at the use
//! site. A type that skips the macro must be registered by hand or it
//! cannot be decoded.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::key::{derive_key, RegistryKey};

/// Intermediate key-value form of a record, independent of text format.
pub type FieldMapping = Map<String, Value>;

/// Factory that builds a boxed record from its field mapping.
pub type ConstructFn = fn(FieldMapping) -> Result<Box<dyn DynRecord>, serde_json::Error>;

/// A concrete record type that can be registered and decoded by key.
///
/// Implemented by [`polymorphic_record!`]; manual implementations must
/// keep `NAMESPACE` and `TYPE_NAME` stable, since they form the default
/// wire key.
pub trait Record: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Declared type name, e.g. `Person`.
    const TYPE_NAME: &'static str;

    /// Declaring namespace, normally `module_path!()`.
    const NAMESPACE: &'static str;
}

/// Object-safe view of a record whose concrete type is known only at runtime.
pub trait DynRecord: Any + fmt::Debug + Send + Sync {
    /// Default registry key of this value's concrete type.
    fn record_key(&self) -> RegistryKey;

    /// Descriptor of this value's concrete type.
    fn record_type(&self) -> RecordType;

    /// Serialize the record's own fields (without any envelope tag).
    fn to_value(&self) -> Result<Value, serde_json::Error>;

    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed `Any` for by-value downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Record> DynRecord for T {
    fn record_key(&self) -> RegistryKey {
        derive_key::<T>()
    }

    fn record_type(&self) -> RecordType {
        RecordType::of::<T>()
    }

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn DynRecord {
    /// Returns true if the concrete type is `T`.
    pub fn is<T: Record>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow as `T` if the concrete type is `T`.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Convert into a `Box<T>`, handing the original box back on mismatch.
    pub fn downcast<T: Record>(self: Box<Self>) -> Result<Box<T>, Box<Self>> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.into_any().downcast::<T>() {
            Ok(record) => Ok(record),
            Err(_) => unreachable!("concrete type checked before downcast"),
        }
    }
}

/// Descriptor of a concrete record type.
///
/// Carries the identity used for equality (`TypeId`), the naming parts
/// used for key derivation, and the factory used by decode. Two
/// descriptors are equal exactly when they describe the same Rust type.
#[derive(Clone, Copy)]
pub struct RecordType {
    type_id: TypeId,
    rust_name: &'static str,
    name: &'static str,
    namespace: &'static str,
    construct: ConstructFn,
}

impl RecordType {
    /// Describe the record type `T`.
    pub fn of<T: Record>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
            name: T::TYPE_NAME,
            namespace: T::NAMESPACE,
            construct: construct_record::<T>,
        }
    }

    /// `TypeId` of the described type; the basis of descriptor equality.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full Rust type path as reported by `std::any::type_name`.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Declared type name, [`Record::TYPE_NAME`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declaring namespace, [`Record::NAMESPACE`].
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// The key this type is registered under when no explicit key is given.
    pub fn derived_key(&self) -> RegistryKey {
        RegistryKey::from_parts(self.namespace, self.name)
    }

    /// Returns true if this descriptor describes `T`.
    pub fn is<T: Record>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Build an instance from its field mapping.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the mapping does not satisfy the
    /// type's field contract (missing field, wrong type, custom
    /// validation in a `Deserialize` impl).
    pub fn construct(&self, fields: FieldMapping) -> Result<Box<dyn DynRecord>, serde_json::Error> {
        (self.construct)(fields)
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("rust_name", &self.rust_name)
            .finish()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name)
    }
}

fn construct_record<T: Record>(fields: FieldMapping) -> Result<Box<dyn DynRecord>, serde_json::Error> {
    let record: T = serde_json::from_value(Value::Object(fields))?;
    Ok(Box::new(record))
}

/// Link-time declaration of a record type, submitted by [`polymorphic_record!`].
pub struct RecordDecl {
    describe: fn() -> RecordType,
}

impl RecordDecl {
    /// Declaration whose descriptor is produced by `describe`.
    pub const fn new(describe: fn() -> RecordType) -> Self {
        Self { describe }
    }

    /// Descriptor of the declared type.
    pub fn record_type(&self) -> RecordType {
        (self.describe)()
    }
}

inventory::collect!(RecordDecl);

/// Every record type declared with [`polymorphic_record!`] in the linked binary.
pub fn declared_types() -> Vec<RecordType> {
    let mut types = Vec::new();
    for decl in inventory::iter::<RecordDecl> {
        types.push(decl.record_type());
    }
    types
}

/// Declare one or more record types for polymorphic decode.
///
/// Implements [`Record`] with the type's name and `module_path!()` as its
/// namespace, and submits the type for declaration-time registration.
/// The type must already implement `Serialize`, `Deserialize`, `Debug`,
/// `Send` and `Sync`.
#[macro_export]
macro_rules! polymorphic_record {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::Record for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);
                const NAMESPACE: &'static str = module_path!();
            }

            $crate::inventory::submit! {
                $crate::RecordDecl::new($crate::RecordType::of::<$ty>)
            }
        )+
    };
}
