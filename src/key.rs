//! Type keys and cache slots.
//!
//! A [`TypeKey`] identifies the type an injector is asked for. It is either a
//! plain type or a parameterized type that also carries its raw (erased)
//! form; lookups that miss on the parameterized key retry with the raw one.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Descriptor of a requested or bound type.
///
/// Equality and hashing use only the exact type identity; the raw form is
/// lookup metadata.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::TypeKey;
///
/// struct AnyList;
///
/// let plain = TypeKey::of::<String>();
/// assert!(!plain.is_parameterized());
///
/// let list = TypeKey::parameterized::<Vec<String>, AnyList>();
/// assert_eq!(list.raw(), Some(TypeKey::of::<AnyList>()));
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    type_name: &'static str,
    raw: Option<(TypeId, &'static str)>,
}

impl TypeKey {
    /// Key for a plain type
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            raw: None,
        }
    }

    /// Key for a parameterized type `T` whose raw form is `R`.
    ///
    /// A binding registered for `R` satisfies a request for `T` when nothing
    /// is bound to `T` itself.
    #[inline]
    pub fn parameterized<T: ?Sized + 'static, R: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            raw: Some((TypeId::of::<R>(), std::any::type_name::<R>())),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn is_parameterized(&self) -> bool {
        self.raw.is_some()
    }

    /// The raw form of a parameterized key
    #[inline]
    pub fn raw(&self) -> Option<TypeKey> {
        self.raw.map(|(id, type_name)| TypeKey {
            id,
            type_name,
            raw: None,
        })
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw {
            Some((_, raw)) => write!(f, "TypeKey({} as {})", self.type_name, raw),
            None => write!(f, "TypeKey({})", self.type_name),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Cache slot for one (type, name) pair.
///
/// The unnamed slot is distinct from every named slot, including `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct SlotKey {
    type_id: TypeId,
    name: Option<Box<str>>,
}

impl SlotKey {
    #[inline]
    pub(crate) fn new(key: &TypeKey, name: Option<&str>) -> Self {
        Self {
            type_id: key.id(),
            name: name.map(Box::from),
        }
    }

    #[inline]
    pub(crate) fn matches(&self, key: &TypeKey, name: Option<&str>) -> bool {
        self.type_id == key.id() && self.name.as_deref() == name
    }
}
