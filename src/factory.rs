//! Bindings and the binding-source seam
//!
//! A [`Binding`] says how a (type, name) pair is satisfied: by a shared
//! singleton value (eager or lazy) or by a prototype factory whose products
//! are field-injected. A [`BindingSource`] answers which binding applies.

use crate::injection::Wiring;
use crate::{DiError, Injectable, Injector, Lifetime, Result, TypeKey};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

/// A type-erased resolved instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Boxed error returned by fallible factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Answers "what satisfies (type, name)?"
///
/// Implementations are consulted read-only and must be safe to share.
pub trait BindingSource: Send + Sync {
    /// The binding for `key` qualified by `name`, if any.
    ///
    /// `key` may be parameterized; the injector performs the raw-type retry
    /// itself, so implementations only match the exact key.
    fn binding(&self, key: &TypeKey, name: Option<&str>) -> Option<Binding>;
}

impl<S: BindingSource + ?Sized> BindingSource for Arc<S> {
    #[inline]
    fn binding(&self, key: &TypeKey, name: Option<&str>) -> Option<Binding> {
        (**self).binding(key, name)
    }
}

type LazyInitFn = Arc<dyn Fn() -> std::result::Result<Instance, BoxError> + Send + Sync>;
type PrototypeFn = Arc<dyn Fn() -> std::result::Result<Instance, BoxError> + Send + Sync>;

#[derive(Clone)]
enum BindingKind {
    Singleton(Instance),
    Lazy {
        init: LazyInitFn,
        instance: Arc<OnceCell<Instance>>,
    },
    Prototype {
        factory: PrototypeFn,
        wiring: Arc<dyn Wiring>,
    },
}

/// How one (type, name) pair is satisfied.
///
/// Cloning is cheap; clones share the singleton value, the lazy cell and the
/// prototype's injection points.
#[derive(Clone)]
pub struct Binding {
    type_name: &'static str,
    kind: BindingKind,
}

impl Binding {
    /// A singleton holding `value`
    pub fn singleton<T: Send + Sync + 'static>(value: T) -> Self {
        Self::singleton_arc(Arc::new(value))
    }

    /// A singleton sharing an existing `Arc`
    pub fn singleton_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            kind: BindingKind::Singleton(value),
        }
    }

    /// A singleton created by `factory` on first request.
    ///
    /// Like any singleton it is not field-injected by the engine.
    pub fn lazy<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::try_lazy(move || Ok::<T, BoxError>(factory()))
    }

    /// A lazy singleton whose initializer can fail.
    ///
    /// A failure surfaces as [`DiError::CreationFailed`] and leaves the
    /// singleton uninitialized; the next request runs the initializer again.
    pub fn try_lazy<T, E, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            kind: BindingKind::Lazy {
                init: Arc::new(move || -> std::result::Result<Instance, BoxError> {
                    let value = factory().map_err(Into::<BoxError>::into)?;
                    Ok(Arc::new(value))
                }),
                instance: Arc::new(OnceCell::new()),
            },
        }
    }

    /// A prototype: every resolution calls `factory` and injects the result
    pub fn prototype<T, F>(factory: F) -> Self
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::try_prototype(move || Ok::<T, BoxError>(factory()))
    }

    /// A prototype whose factory can fail.
    ///
    /// Errors surface as [`DiError::CreationFailed`] from the resolution
    /// that triggered them.
    pub fn try_prototype<T, E, F>(factory: F) -> Self
    where
        T: Injectable,
        E: Into<BoxError>,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        // injection points are owned by the registration from here on
        let wiring: Arc<dyn Wiring> = crate::cache::injection_points::<T>();

        Self {
            type_name: std::any::type_name::<T>(),
            kind: BindingKind::Prototype {
                factory: Arc::new(move || -> std::result::Result<Instance, BoxError> {
                    let value = factory().map_err(Into::<BoxError>::into)?;
                    Ok(Arc::new(value))
                }),
                wiring,
            },
        }
    }

    /// Name of the bound implementation type
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        match self.kind {
            BindingKind::Singleton(_) | BindingKind::Lazy { .. } => Lifetime::Singleton,
            BindingKind::Prototype { .. } => Lifetime::Prototype,
        }
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.lifetime().is_singleton()
    }

    /// The shared value of a singleton binding.
    ///
    /// Lazy singletons are initialized here on first call.
    pub fn value(&self) -> Result<Instance> {
        match &self.kind {
            BindingKind::Singleton(instance) => Ok(Arc::clone(instance)),
            BindingKind::Lazy { init, instance } => {
                let value = instance.get_or_try_init(|| {
                    #[cfg(feature = "logging")]
                    debug!(
                        target: "scoped_injector",
                        service = self.type_name,
                        "Lazy singleton initializing on first access"
                    );

                    init().map_err(|e| DiError::creation_failed(self.type_name, e.to_string()))
                })?;
                Ok(Arc::clone(value))
            }
            BindingKind::Prototype { .. } => Err(DiError::Internal(format!(
                "{} is bound as a prototype and has no shared value",
                self.type_name
            ))),
        }
    }

    /// A fresh instance from a prototype binding, not yet injected
    pub fn new_instance(&self) -> Result<Instance> {
        match &self.kind {
            BindingKind::Prototype { factory, .. } => {
                #[cfg(feature = "logging")]
                trace!(
                    target: "scoped_injector",
                    service = self.type_name,
                    "Creating new prototype instance"
                );

                factory().map_err(|e| DiError::creation_failed(self.type_name, e.to_string()))
            }
            _ => Err(DiError::Internal(format!(
                "{} is bound as a singleton and cannot be instantiated",
                self.type_name
            ))),
        }
    }

    /// Inject the fields of an instance this binding produced
    pub(crate) fn wire(
        &self,
        instance: &Instance,
        injector: &Injector,
        resolution: &mut crate::scope::Resolution,
    ) -> Result<()> {
        match &self.kind {
            BindingKind::Prototype { wiring, .. } => wiring.wire(instance, injector, resolution),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("type_name", &self.type_name)
            .field("lifetime", &self.lifetime())
            .finish()
    }
}
