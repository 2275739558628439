//! Binding storage
//!
//! [`Module`] is the declarative side of the engine: a concurrent registry
//! from (type, name) to [`Binding`], consulted read-only by injectors.

use crate::key::SlotKey;
use crate::{Binding, BindingSource, Injectable, Result, TypeKey};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

/// A registry of bindings keyed by (type, name).
///
/// Uses `DashMap` with `ahash`, so registration and lookup can run
/// concurrently. Binding the same (type, name) twice replaces the earlier
/// binding.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Injectable, Injector, Module};
///
/// struct Config { port: u16 }
///
/// #[derive(Default)]
/// struct Request;
/// impl Injectable for Request {}
///
/// let module = Module::new();
/// module.singleton(Config { port: 8080 });
/// module.named_singleton("admin", Config { port: 9090 });
/// module.prototype(Request::default);
///
/// let injector = Injector::new(module);
/// let admin = injector.get_named_instance::<Config>("admin").unwrap().unwrap();
/// assert_eq!(admin.port, 9090);
/// ```
pub struct Module {
    bindings: DashMap<SlotKey, Binding, RandomState>,
}

impl Module {
    /// Create an empty module.
    ///
    /// Uses 8 shards; modules rarely hold more than a few dozen bindings.
    #[inline]
    pub fn new() -> Self {
        Self {
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Create with pre-allocated capacity and scaled shards.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self {
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    /// Bind `key` (qualified by `name`) to `binding`.
    ///
    /// This is the only way to register under a raw key whose values are
    /// served to parameterized requests. Returns the replaced binding.
    pub fn bind(&self, key: TypeKey, name: Option<&str>, binding: Binding) -> Option<Binding> {
        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_injector",
            service = key.type_name(),
            name = name,
            implementation = binding.type_name(),
            lifetime = binding.lifetime().as_str(),
            "Registering binding"
        );

        self.bindings.insert(SlotKey::new(&key, name), binding)
    }

    /// Bind a singleton value
    #[inline]
    pub fn singleton<T: Send + Sync + 'static>(&self, value: T) {
        self.bind(TypeKey::of::<T>(), None, Binding::singleton(value));
    }

    /// Bind a singleton that is already shared elsewhere
    #[inline]
    pub fn singleton_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        self.bind(TypeKey::of::<T>(), None, Binding::singleton_arc(value));
    }

    /// Bind a named singleton value
    #[inline]
    pub fn named_singleton<T: Send + Sync + 'static>(&self, name: &str, value: T) {
        self.bind(TypeKey::of::<T>(), Some(name), Binding::singleton(value));
    }

    /// Bind a singleton created on first request
    #[inline]
    pub fn lazy<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), None, Binding::lazy(factory));
    }

    /// Bind a named singleton created on first request
    #[inline]
    pub fn named_lazy<T, F>(&self, name: &str, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), Some(name), Binding::lazy(factory));
    }

    /// Bind a singleton created on first request by a fallible initializer
    #[inline]
    pub fn try_lazy<T, E, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        E: Into<crate::BoxError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), None, Binding::try_lazy(factory));
    }

    /// Bind a prototype: a fresh, field-injected instance per resolution
    #[inline]
    pub fn prototype<T, F>(&self, factory: F)
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), None, Binding::prototype(factory));
    }

    /// Bind a named prototype
    #[inline]
    pub fn named_prototype<T, F>(&self, name: &str, factory: F)
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), Some(name), Binding::prototype(factory));
    }

    /// Bind a prototype whose factory can fail
    #[inline]
    pub fn try_prototype<T, E, F>(&self, factory: F)
    where
        T: Injectable,
        E: Into<crate::BoxError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        self.bind(TypeKey::of::<T>(), None, Binding::try_prototype(factory));
    }

    /// Check if (key, name) is bound in this module
    #[inline]
    pub fn contains(&self, key: &TypeKey, name: Option<&str>) -> bool {
        self.bindings.contains_key(&SlotKey::new(key, name))
    }

    /// Check if `T` has an unnamed binding
    #[inline]
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&TypeKey::of::<T>(), None)
    }

    /// Remove a binding
    #[inline]
    pub fn remove(&self, key: &TypeKey, name: Option<&str>) -> Option<Binding> {
        self.bindings.remove(&SlotKey::new(key, name)).map(|(_, b)| b)
    }

    /// Eagerly initialize every lazy singleton.
    ///
    /// Only singleton values are touched; prototypes and injection points are
    /// still resolved lazily, when an object is actually injected.
    pub fn warm(&self) -> Result<()> {
        let singletons: Vec<Binding> = self
            .bindings
            .iter()
            .filter(|entry| entry.value().is_singleton())
            .map(|entry| entry.value().clone())
            .collect();

        for binding in singletons {
            binding.value()?;
        }
        Ok(())
    }

    /// Get number of bindings
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Remove all bindings
    #[inline]
    pub fn clear(&self) {
        self.bindings.clear();
    }
}

impl BindingSource for Module {
    #[inline]
    fn binding(&self, key: &TypeKey, name: Option<&str>) -> Option<Binding> {
        self.bindings.get(&SlotKey::new(key, name)).map(|b| b.value().clone())
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lifetime;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Config {
        value: i32,
    }

    struct Job;
    impl Injectable for Job {}

    #[test]
    fn test_module_bind_and_lookup() {
        let module = Module::new();
        module.singleton(Config { value: 42 });

        let binding = module.binding(&TypeKey::of::<Config>(), None).unwrap();
        let value = binding.value().unwrap();
        assert_eq!(value.downcast_ref::<Config>().unwrap().value, 42);
    }

    #[test]
    fn test_named_and_unnamed_are_separate() {
        let module = Module::new();
        module.singleton(Config { value: 1 });
        module.named_singleton("", Config { value: 2 });
        module.named_singleton("backup", Config { value: 3 });

        let key = TypeKey::of::<Config>();
        let value_of = |name: Option<&str>| {
            let instance = module.binding(&key, name).unwrap().value().unwrap();
            instance.downcast_ref::<Config>().unwrap().value
        };
        assert_eq!(value_of(None), 1);
        assert_eq!(value_of(Some("")), 2);
        assert_eq!(value_of(Some("backup")), 3);
        assert!(module.binding(&key, Some("missing")).is_none());
        assert_eq!(module.len(), 3);
    }

    #[test]
    fn test_rebinding_replaces() {
        let module = Module::new();
        module.singleton(Config { value: 1 });
        let replaced = module.bind(TypeKey::of::<Config>(), None, Binding::singleton(Config { value: 2 }));

        assert!(replaced.is_some());
        assert_eq!(module.len(), 1);
        let value = module.binding(&TypeKey::of::<Config>(), None).unwrap().value().unwrap();
        assert_eq!(value.downcast_ref::<Config>().unwrap().value, 2);
    }

    #[test]
    fn test_module_contains_and_remove() {
        let module = Module::new();
        assert!(!module.contains_type::<Job>());

        module.prototype(|| Job);
        assert!(module.contains_type::<Job>());
        assert_eq!(
            module.binding(&TypeKey::of::<Job>(), None).unwrap().lifetime(),
            Lifetime::Prototype
        );

        assert!(module.remove(&TypeKey::of::<Job>(), None).is_some());
        assert!(module.is_empty());
    }

    #[test]
    fn test_warm_initializes_lazy_singletons() {
        static CREATED: AtomicU32 = AtomicU32::new(0);

        let module = Module::with_capacity(4);
        module.lazy(|| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Config { value: 7 }
        });
        module.prototype(|| Job);
        assert_eq!(CREATED.load(Ordering::SeqCst), 0);

        module.warm().unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);

        module.binding(&TypeKey::of::<Config>(), None).unwrap().value().unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_lazy_surfaces_from_warm_and_resolution() {
        let module = Module::new();
        module.try_lazy(|| Err::<Config, _>("no config file"));

        assert!(matches!(
            module.warm(),
            Err(crate::DiError::CreationFailed { .. })
        ));

        let injector = crate::Injector::new(module);
        match injector.get_instance::<Config>() {
            Err(crate::DiError::CreationFailed { reason, .. }) => {
                assert_eq!(reason, "no config file")
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.is_some())),
        }
        assert_eq!(injector.cached_len(), 0);
    }
}
