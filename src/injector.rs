//! Hierarchical injector
//!
//! The [`Injector`] is one resolution scope: a local cache of resolved
//! instances keyed by (type, name), a binding source, and an optional parent.
//! Requests that find neither a cached instance nor a binding locally are
//! delegated up the parent chain.

use crate::factory::Instance;
use crate::key::SlotKey;
use crate::scope::{Resolution, ScopeId};
use crate::{
    Binding, BindingSource, DiError, Injectable, InjectionPoint, InjectionPoints, Lifetime, Result,
    TypeKey,
};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

struct Resolved {
    instance: Instance,
    lifetime: Lifetime,
    /// Key the instance is bound under; the raw key after a raw fallback
    key: TypeKey,
}

struct ScopeState {
    id: ScopeId,
    source: Arc<dyn BindingSource>,
    /// Resolved singletons, including ones obtained from ancestors
    instances: DashMap<SlotKey, Instance, RandomState>,
    parent: Option<Weak<ScopeState>>,
    depth: u32,
}

/// A resolution scope with its own instance cache.
///
/// Cloning is cheap and yields a handle to the same scope. A child holds
/// only a weak reference to its parent; keep the parent alive for as long as
/// its children resolve through it.
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Inject, Injectable, InjectionPoints, Injector, Module};
/// use std::sync::Arc;
///
/// struct Logger;
///
/// #[derive(Default)]
/// struct Worker {
///     logger: Inject<Logger>,
/// }
///
/// impl Injectable for Worker {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("logger", |w: &Worker| &w.logger);
///     }
/// }
///
/// let module = Module::new();
/// module.singleton(Logger);
/// module.prototype(Worker::default);
///
/// let injector = Injector::new(module);
/// let a = injector.get::<Worker>().unwrap();
/// let b = injector.get::<Worker>().unwrap();
///
/// assert!(!Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&a.logger.get().unwrap(), &b.logger.get().unwrap()));
/// ```
#[derive(Clone)]
pub struct Injector {
    state: Arc<ScopeState>,
}

impl Injector {
    /// Create a root injector over `source`.
    pub fn new<S: BindingSource + 'static>(source: S) -> Self {
        Self::build(Arc::new(source), None)
    }

    /// Create an injector that falls back to `parent`.
    pub fn with_parent<S: BindingSource + 'static>(source: S, parent: &Injector) -> Self {
        Self::build(Arc::new(source), Some(parent))
    }

    /// Create an injector over a source shared with other injectors.
    pub fn from_shared(source: Arc<dyn BindingSource>, parent: Option<&Injector>) -> Self {
        Self::build(source, parent)
    }

    /// Create a child scope of this injector.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scoped_injector::{Injector, Module};
    ///
    /// struct AppConfig { name: &'static str }
    /// struct RequestId(u64);
    ///
    /// let app = Module::new();
    /// app.singleton(AppConfig { name: "app" });
    /// let root = Injector::new(app);
    ///
    /// let request = Module::new();
    /// request.singleton(RequestId(7));
    /// let scope = root.child(request);
    ///
    /// assert_eq!(scope.get::<AppConfig>().unwrap().name, "app");
    /// assert!(root.get_instance::<RequestId>().unwrap().is_none());
    /// ```
    pub fn child<S: BindingSource + 'static>(&self, source: S) -> Self {
        Self::with_parent(source, self)
    }

    fn build(source: Arc<dyn BindingSource>, parent: Option<&Injector>) -> Self {
        let depth = parent.map_or(0, |p| p.depth() + 1);
        let id = ScopeId::new();

        #[cfg(feature = "logging")]
        debug!(
            target: "scoped_injector",
            scope = id.id(),
            depth = depth,
            has_parent = parent.is_some(),
            "Creating injector scope"
        );

        Self {
            state: Arc::new(ScopeState {
                id,
                source,
                instances: DashMap::with_capacity_and_hasher_and_shard_amount(
                    0,
                    RandomState::new(),
                    8,
                ),
                parent: parent.map(|p| Arc::downgrade(&p.state)),
                depth,
            }),
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve the unnamed instance of `T`.
    ///
    /// Returns `Ok(None)` when nothing in the scope chain is bound to `T`.
    #[inline]
    pub fn get_instance<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
        self.get_keyed_instance(TypeKey::of::<T>(), None)
    }

    /// Resolve the instance of `T` bound under `name`.
    #[inline]
    pub fn get_named_instance<T: Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<T>>> {
        self.get_keyed_instance(TypeKey::of::<T>(), Some(name))
    }

    /// Resolve `key` and downcast the result to `T`.
    ///
    /// Use this for parameterized keys: a binding for the raw form satisfies
    /// the request when the exact key is unbound, so long as it produces a `T`.
    pub fn get_keyed_instance<T: Send + Sync + 'static>(
        &self,
        key: TypeKey,
        name: Option<&str>,
    ) -> Result<Option<Arc<T>>> {
        match self.resolve_instance(&key, name)? {
            Some(instance) => instance
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::type_mismatch::<T>(key.type_name())),
            None => Ok(None),
        }
    }

    /// Resolve the unnamed instance of `T`, failing if it is unbound.
    #[inline]
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_instance::<T>()?
            .ok_or_else(|| DiError::not_found::<T>(None))
    }

    /// Resolve the instance of `T` named `name`, failing if it is unbound.
    #[inline]
    pub fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get_named_instance::<T>(name)?
            .ok_or_else(|| DiError::not_found::<T>(Some(name)))
    }

    /// Type-erased resolution of (key, name).
    pub fn resolve_instance(&self, key: &TypeKey, name: Option<&str>) -> Result<Option<Instance>> {
        let mut resolution = Resolution::new();
        Ok(self
            .resolve(key, name, &mut resolution)?
            .map(|resolved| resolved.instance))
    }

    /// Wire every injection point of `target`.
    ///
    /// Optional points that cannot be resolved are left empty. The first
    /// required point that cannot be resolved here or in any ancestor aborts
    /// the call with [`DiError::Unsatisfied`]; points before it stay wired.
    pub fn inject<T: Injectable>(&self, target: &T) -> Result<()> {
        let points = crate::cache::injection_points::<T>();
        let mut resolution = Resolution::new();
        self.inject_points(&points, target, &mut resolution)
    }

    fn resolve(&self, key: &TypeKey, name: Option<&str>, resolution: &mut Resolution) -> Result<Option<Resolved>> {
        if let Some(found) = self.lookup_local(key, name, resolution) {
            return Ok(Some(found));
        }

        // a raw-type entry also satisfies a parameterized request
        let raw = key.raw();
        if let Some(raw) = &raw {
            if let Some(found) = self.lookup_local(raw, name, resolution) {
                return Ok(Some(found));
            }
        }

        let source = &self.state.source;
        let bound = match source.binding(key, name) {
            Some(binding) => Some((*key, binding)),
            None => raw.and_then(|raw| source.binding(&raw, name).map(|binding| (raw, binding))),
        };

        if let Some((bound_key, binding)) = bound {
            return self.instantiate(&bound_key, name, &binding, resolution).map(Some);
        }

        let Some(parent) = self.parent()? else {
            #[cfg(feature = "logging")]
            debug!(
                target: "scoped_injector",
                service = key.type_name(),
                name = name,
                depth = self.state.depth,
                "No binding in scope chain"
            );
            return Ok(None);
        };

        #[cfg(feature = "logging")]
        trace!(
            target: "scoped_injector",
            service = key.type_name(),
            name = name,
            depth = self.state.depth,
            "Not bound in this scope, delegating to parent"
        );

        match parent.resolve(key, name, resolution)? {
            Some(Resolved {
                instance,
                lifetime: Lifetime::Singleton,
                key: bound,
            }) => Ok(Some(Resolved {
                instance: self.remember(SlotKey::new(&bound, name), instance),
                lifetime: Lifetime::Singleton,
                key: bound,
            })),
            other => Ok(other),
        }
    }

    fn lookup_local(&self, key: &TypeKey, name: Option<&str>, resolution: &Resolution) -> Option<Resolved> {
        let cached = self
            .state
            .instances
            .get(&SlotKey::new(key, name))
            .map(|entry| entry.value().clone());

        if let Some(instance) = cached {
            #[cfg(feature = "logging")]
            trace!(
                target: "scoped_injector",
                service = key.type_name(),
                depth = self.state.depth,
                location = "cache",
                "Instance resolved from scope cache"
            );
            return Some(Resolved {
                instance,
                lifetime: Lifetime::Singleton,
                key: *key,
            });
        }

        resolution
            .find(self.state.id, key, name)
            .map(|instance| {
                #[cfg(feature = "logging")]
                trace!(
                    target: "scoped_injector",
                    service = key.type_name(),
                    depth = self.state.depth,
                    location = "in_progress",
                    "Instance resolved from in-progress wiring"
                );
                Resolved {
                    instance,
                    lifetime: Lifetime::Prototype,
                    key: *key,
                }
            })
    }

    fn instantiate(
        &self,
        key: &TypeKey,
        name: Option<&str>,
        binding: &Binding,
        resolution: &mut Resolution,
    ) -> Result<Resolved> {
        let slot = SlotKey::new(key, name);

        if binding.is_singleton() {
            let instance = self.remember(slot, binding.value()?);
            return Ok(Resolved {
                instance,
                lifetime: Lifetime::Singleton,
                key: *key,
            });
        }

        let instance = binding.new_instance()?;

        #[cfg(feature = "logging")]
        trace!(
            target: "scoped_injector",
            service = key.type_name(),
            implementation = binding.type_name(),
            depth = self.state.depth,
            nesting = resolution.depth(),
            "Wiring new prototype instance"
        );

        // visible to cycles before its own fields are wired
        let mark = resolution.enter(self.state.id, slot, instance.clone());
        let wired = binding.wire(&instance, self, resolution);
        resolution.leave(mark);
        wired?;

        Ok(Resolved {
            instance,
            lifetime: Lifetime::Prototype,
            key: *key,
        })
    }

    /// Cache a singleton; the first entry for a slot wins.
    fn remember(&self, slot: SlotKey, instance: Instance) -> Instance {
        self.state.instances.entry(slot).or_insert(instance).value().clone()
    }

    pub(crate) fn inject_points<T: Injectable>(
        &self,
        points: &InjectionPoints<T>,
        target: &T,
        resolution: &mut Resolution,
    ) -> Result<()> {
        for point in points.iter() {
            if !self.inject_point(point, target, resolution)? {
                return Err(point.unsatisfied());
            }
        }
        Ok(())
    }

    fn inject_point<T: Injectable>(
        &self,
        point: &InjectionPoint<T>,
        target: &T,
        resolution: &mut Resolution,
    ) -> Result<bool> {
        match self.resolve(point.key(), point.name(), resolution)? {
            Some(resolved) => {
                point.assign(target, resolved.instance)?;
                Ok(true)
            }
            None if point.is_optional() => Ok(true),
            None => match self.parent()? {
                Some(parent) => parent.inject_point(point, target, resolution),
                None => Ok(false),
            },
        }
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// The parent scope, if this injector has one.
    ///
    /// Fails with [`DiError::ParentDropped`] if the parent no longer exists.
    pub fn parent(&self) -> Result<Option<Injector>> {
        match &self.state.parent {
            None => Ok(None),
            Some(weak) => weak
                .upgrade()
                .map(|state| Some(Injector { state }))
                .ok_or(DiError::ParentDropped),
        }
    }

    #[inline]
    pub fn id(&self) -> ScopeId {
        self.state.id
    }

    /// Number of ancestors
    #[inline]
    pub fn depth(&self) -> u32 {
        self.state.depth
    }

    /// Number of instances cached in this scope
    #[inline]
    pub fn cached_len(&self) -> usize {
        self.state.instances.len()
    }

    /// Check if (key, name) is cached in this scope, without resolving
    #[inline]
    pub fn contains_cached(&self, key: &TypeKey, name: Option<&str>) -> bool {
        self.state.instances.contains_key(&SlotKey::new(key, name))
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.state.id)
            .field("cached", &self.cached_len())
            .field("depth", &self.state.depth)
            .field("has_parent", &self.state.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Inject, Module};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Logger {
        prefix: &'static str,
    }

    struct Metrics;

    #[derive(Default)]
    struct Worker {
        logger: Inject<Logger>,
        metrics: Inject<Metrics>,
    }

    impl Injectable for Worker {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("logger", |w: &Worker| &w.logger);
            points.field("metrics", |w: &Worker| &w.metrics).optional();
        }
    }

    #[derive(Default)]
    struct A {
        b: Inject<B>,
    }

    #[derive(Default)]
    struct B {
        a: Inject<A>,
    }

    impl Injectable for A {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("b", |a: &A| &a.b);
        }
    }

    impl Injectable for B {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("a", |b: &B| &b.a);
        }
    }

    #[derive(Debug, Default)]
    struct NeedsMetrics {
        logger: Inject<Logger>,
        metrics: Inject<Metrics>,
    }

    impl Injectable for NeedsMetrics {
        fn injection_points(points: &mut InjectionPoints<Self>) {
            points.field("logger", |n: &NeedsMetrics| &n.logger).optional();
            points.field("metrics", |n: &NeedsMetrics| &n.metrics);
        }
    }

    #[derive(Debug, Default)]
    struct Registry<T: Send + Sync + 'static> {
        items: Vec<T>,
    }

    impl<T: Send + Sync + 'static> Injectable for Registry<T> {}

    struct RawRegistry;

    fn logger_module() -> Module {
        let module = Module::new();
        module.singleton(Logger { prefix: "app" });
        module.prototype(Worker::default);
        module
    }

    #[test]
    fn test_singleton_identity() {
        let injector = Injector::new(logger_module());

        let a = injector.get::<Logger>().unwrap();
        let b = injector.get::<Logger>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(injector.contains_cached(&TypeKey::of::<Logger>(), None));

        let child = injector.child(Module::new());
        let c = child.get::<Logger>().unwrap();
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_prototype_distinctness() {
        let injector = Injector::new(logger_module());

        let w1 = injector.get::<Worker>().unwrap();
        let w2 = injector.get::<Worker>().unwrap();
        assert!(!Arc::ptr_eq(&w1, &w2));
        assert!(w1.logger.is_set());
        assert!(w2.logger.is_set());
        assert!(!injector.contains_cached(&TypeKey::of::<Worker>(), None));
    }

    #[test]
    fn test_end_to_end_worker_scenario() {
        let injector = Injector::new(logger_module());

        let w1 = injector.get_instance::<Worker>().unwrap().unwrap();
        let w2 = injector.get_instance::<Worker>().unwrap().unwrap();

        assert!(!Arc::ptr_eq(&w1, &w2));
        let l1 = w1.logger.get().unwrap();
        let l2 = w2.logger.get().unwrap();
        assert!(Arc::ptr_eq(&l1, &l2));
        assert_eq!(l1.prefix, "app");
        assert!(w1.metrics.get().is_none());
        assert!(w2.metrics.get().is_none());
    }

    #[test]
    fn test_parent_fallback_is_cached_in_child() {
        static LOOKUPS: AtomicU32 = AtomicU32::new(0);

        struct CountingModule(Module);

        impl BindingSource for CountingModule {
            fn binding(&self, key: &TypeKey, name: Option<&str>) -> Option<Binding> {
                LOOKUPS.fetch_add(1, Ordering::SeqCst);
                self.0.binding(key, name)
            }
        }

        let parent_module = Module::new();
        parent_module.named_singleton("x", Logger { prefix: "parent" });
        let parent = Injector::new(CountingModule(parent_module));
        let child = parent.child(Module::new());

        let first = child.get_named::<Logger>("x").unwrap();
        assert_eq!(first.prefix, "parent");
        let after_first = LOOKUPS.load(Ordering::SeqCst);

        let second = child.get_named::<Logger>("x").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(LOOKUPS.load(Ordering::SeqCst), after_first);
        assert!(child.contains_cached(&TypeKey::of::<Logger>(), Some("x")));

        // same as what the parent produces
        let from_parent = parent.get_named::<Logger>("x").unwrap();
        assert!(Arc::ptr_eq(&first, &from_parent));
    }

    #[test]
    fn test_child_never_writes_parent_cache() {
        let parent = Injector::new(Module::new());
        let child = parent.child(logger_module());

        child.get::<Logger>().unwrap();
        assert_eq!(parent.cached_len(), 0);
        assert!(parent.get_instance::<Logger>().unwrap().is_none());
    }

    #[test]
    fn test_child_binding_overrides_parent() {
        let parent = Injector::new(logger_module());
        let overrides = Module::new();
        overrides.singleton(Logger { prefix: "child" });
        let child = parent.child(overrides);

        assert_eq!(child.get::<Logger>().unwrap().prefix, "child");
        assert_eq!(parent.get::<Logger>().unwrap().prefix, "app");
    }

    #[test]
    fn test_raw_type_fallback() {
        let module = Module::new();
        module.bind(
            TypeKey::of::<RawRegistry>(),
            None,
            Binding::prototype(|| Registry::<String> {
                items: vec!["first".to_string()],
            }),
        );
        let injector = Injector::new(module);

        let key = TypeKey::parameterized::<Registry<String>, RawRegistry>();
        let registry = injector
            .get_keyed_instance::<Registry<String>>(key, None)
            .unwrap()
            .unwrap();
        assert_eq!(registry.items, vec!["first".to_string()]);

        // a plain request for the parameterized type has no raw form to fall back on
        assert!(injector.get_instance::<Registry<String>>().unwrap().is_none());
    }

    #[test]
    fn test_raw_singleton_cache_serves_parameterized_request() {
        let module = Module::new();
        module.bind(
            TypeKey::of::<RawRegistry>(),
            None,
            Binding::singleton(Registry::<u8> { items: vec![1, 2] }),
        );
        let injector = Injector::new(module);
        let key = TypeKey::parameterized::<Registry<u8>, RawRegistry>();

        let first = injector.get_keyed_instance::<Registry<u8>>(key, None).unwrap().unwrap();
        assert!(injector.contains_cached(&TypeKey::of::<RawRegistry>(), None));
        let second = injector.get_keyed_instance::<Registry<u8>>(key, None).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_exact_parameterized_binding_wins_over_raw() {
        let module = Module::new();
        module.bind(
            TypeKey::of::<RawRegistry>(),
            None,
            Binding::singleton(Registry::<u8> { items: vec![0] }),
        );
        module.singleton(Registry::<u8> { items: vec![9] });
        let injector = Injector::new(module);

        let key = TypeKey::parameterized::<Registry<u8>, RawRegistry>();
        let registry = injector.get_keyed_instance::<Registry<u8>>(key, None).unwrap().unwrap();
        assert_eq!(registry.items, vec![9]);
    }

    #[test]
    fn test_raw_binding_of_wrong_type_is_mismatch() {
        let module = Module::new();
        module.bind(TypeKey::of::<RawRegistry>(), None, Binding::singleton(Metrics));
        let injector = Injector::new(module);

        let key = TypeKey::parameterized::<Registry<u8>, RawRegistry>();
        let err = injector.get_keyed_instance::<Registry<u8>>(key, None).unwrap_err();
        assert!(matches!(err, DiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_cycle_safety() {
        let module = Module::new();
        module.prototype(A::default);
        module.prototype(B::default);
        let injector = Injector::new(module);

        let a = injector.get::<A>().unwrap();
        let b = a.b.get().unwrap();
        let back = b.a.get().unwrap();
        assert!(Arc::ptr_eq(&a, &back));

        let b2 = injector.get::<B>().unwrap();
        let a2 = b2.a.get().unwrap();
        assert!(Arc::ptr_eq(&b2, &a2.b.get().unwrap()));

        // break the cycles so the test does not leak
        a.b.take();
        b2.a.take();
    }

    #[test]
    fn test_optional_field_tolerance() {
        let module = Module::new();
        module.prototype(Worker::default);
        module.singleton(Logger { prefix: "p" });
        let injector = Injector::new(module);

        let worker = Worker::default();
        injector.inject(&worker).unwrap();
        assert!(worker.logger.is_set());
        assert!(!worker.metrics.is_set());
    }

    #[test]
    fn test_required_field_failure_names_field() {
        let module = Module::new();
        module.singleton(Logger { prefix: "p" });
        let injector = Injector::new(module);

        let target = NeedsMetrics::default();
        let err = injector.inject(&target).unwrap_err();
        match &err {
            DiError::Unsatisfied { field, type_name, name } => {
                assert!(field.ends_with("NeedsMetrics.metrics"));
                assert!(type_name.ends_with("Metrics"));
                assert!(name.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // points before the failing one were wired and are observable
        assert!(target.logger.is_set());
        assert!(!target.metrics.is_set());
    }

    #[test]
    fn test_required_field_failure_propagates_through_resolution() {
        let module = Module::new();
        module.prototype(NeedsMetrics::default);
        let injector = Injector::new(module);

        let err = injector.get_instance::<NeedsMetrics>().unwrap_err();
        assert!(err.is_unsatisfied());
    }

    #[test]
    fn test_required_field_satisfied_by_parent() {
        let parent_module = Module::new();
        parent_module.singleton(Metrics);
        let parent = Injector::new(parent_module);
        let child = parent.child(Module::new());

        let target = NeedsMetrics::default();
        child.inject(&target).unwrap();
        assert!(target.metrics.is_set());
    }

    #[test]
    fn test_prototype_resolved_through_parent() {
        let parent = Injector::new(logger_module());
        let overrides = Module::new();
        overrides.singleton(Logger { prefix: "child" });
        let child = parent.child(overrides);

        let w1 = child.get::<Worker>().unwrap();
        let w2 = child.get::<Worker>().unwrap();
        assert!(!Arc::ptr_eq(&w1, &w2));

        // wired by the scope that holds the binding
        let logger = parent.get::<Logger>().unwrap();
        assert_eq!(w1.logger.get().unwrap().prefix, "app");
        assert!(Arc::ptr_eq(&w1.logger.get().unwrap(), &logger));
        assert!(Arc::ptr_eq(&w2.logger.get().unwrap(), &logger));

        assert!(!child.contains_cached(&TypeKey::of::<Worker>(), None));
        assert!(!child.contains_cached(&TypeKey::of::<Logger>(), None));
    }

    #[test]
    fn test_raw_fallback_through_parent_caches_bound_key() {
        let parent_module = Module::new();
        parent_module.bind(
            TypeKey::of::<RawRegistry>(),
            None,
            Binding::singleton(Registry::<u8> { items: vec![1] }),
        );
        let parent = Injector::new(parent_module);
        let child = parent.child(Module::new());
        let key = TypeKey::parameterized::<Registry<u8>, RawRegistry>();

        let first = child.get_keyed_instance::<Registry<u8>>(key, None).unwrap().unwrap();
        assert!(child.contains_cached(&TypeKey::of::<RawRegistry>(), None));
        assert!(!child.contains_cached(&TypeKey::of::<Registry<u8>>(), None));

        // a plain request has no raw form, wherever it is asked
        assert!(child.get_instance::<Registry<u8>>().unwrap().is_none());
        assert!(parent.get_instance::<Registry<u8>>().unwrap().is_none());

        let second = child.get_keyed_instance::<Registry<u8>>(key, None).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_instantiation_failure_aborts_outer_injection() {
        #[derive(Debug, Default)]
        struct Outer {
            job: Inject<Job>,
        }

        struct Job;
        impl Injectable for Job {}

        impl Injectable for Outer {
            fn injection_points(points: &mut InjectionPoints<Self>) {
                points.field("job", |o: &Outer| &o.job).optional();
            }
        }

        let module = Module::new();
        module.try_prototype(|| Err::<Job, _>("no capacity"));
        module.prototype(Outer::default);
        let injector = Injector::new(module);

        let err = injector.get::<Outer>().unwrap_err();
        match err {
            DiError::CreationFailed { reason, .. } => assert_eq!(reason, "no capacity"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_binding_is_absent_not_error() {
        let injector = Injector::new(Module::new());
        assert!(injector.get_instance::<Logger>().unwrap().is_none());
        assert!(injector.get_named_instance::<Logger>("x").unwrap().is_none());
        assert!(matches!(
            injector.get::<Logger>().unwrap_err(),
            DiError::NotFound { .. }
        ));
    }

    #[test]
    fn test_named_slots_are_separate() {
        let module = Module::new();
        module.singleton(Logger { prefix: "unnamed" });
        module.named_singleton("", Logger { prefix: "empty" });
        let injector = Injector::new(module);

        assert_eq!(injector.get::<Logger>().unwrap().prefix, "unnamed");
        assert_eq!(injector.get_named::<Logger>("").unwrap().prefix, "empty");
        assert!(injector.get_named_instance::<Logger>("other").unwrap().is_none());
    }

    #[test]
    fn test_dropped_parent_is_reported() {
        let parent = Injector::new(logger_module());
        let child = parent.child(Module::new());
        assert_eq!(child.depth(), 1);
        drop(parent);

        assert!(matches!(child.parent(), Err(DiError::ParentDropped)));
        assert!(matches!(
            child.get_instance::<Logger>(),
            Err(DiError::ParentDropped)
        ));
    }

    #[test]
    fn test_shared_source_backs_many_scopes() {
        let shared: Arc<dyn BindingSource> = Arc::new(logger_module());
        let one = Injector::from_shared(Arc::clone(&shared), None);
        let two = Injector::from_shared(shared, None);

        // each scope caches its own resolution of the same singleton binding
        assert!(Arc::ptr_eq(&one.get::<Logger>().unwrap(), &two.get::<Logger>().unwrap()));
        assert_ne!(one.id(), two.id());
    }

    #[test]
    fn test_concurrent_resolution_of_different_keys() {
        let module = logger_module();
        module.singleton(Metrics);
        let injector = Injector::new(module);

        std::thread::scope(|s| {
            for i in 0..8 {
                let injector = injector.clone();
                s.spawn(move || {
                    for _ in 0..50 {
                        if i % 2 == 0 {
                            injector.get::<Worker>().unwrap();
                        } else {
                            injector.get::<Metrics>().unwrap();
                        }
                    }
                });
            }
        });

        assert!(injector.contains_cached(&TypeKey::of::<Logger>(), None));
        assert!(injector.contains_cached(&TypeKey::of::<Metrics>(), None));
    }
}
