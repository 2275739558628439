//! Injection points and injectable slots
//!
//! Field injection works without runtime reflection: every injectable field
//! is an [`Inject<T>`] slot, and each type describes its slots once through
//! typed setter closures collected in [`InjectionPoints`].

use crate::factory::Instance;
use crate::scope::Resolution;
use crate::{DiError, Injectable, Injector, Result, TypeKey};
use parking_lot::RwLock;
use std::sync::Arc;

/// A field that receives a resolved dependency.
///
/// The slot is interior-mutable so a shared instance can be wired after it
/// has been cached, which is what makes cyclic graphs resolvable.
///
/// Instances that reference each other through `Inject` slots form `Arc`
/// cycles and are not freed until one side calls [`take`](Inject::take).
pub struct Inject<T: ?Sized> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Inject<T> {
    /// An empty slot
    #[inline]
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// A slot that already holds a value
    #[inline]
    pub fn with(value: Arc<T>) -> Self {
        Self {
            slot: RwLock::new(Some(value)),
        }
    }

    /// The injected value, if any
    #[inline]
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Overwrite the slot
    #[inline]
    pub fn set(&self, value: Arc<T>) {
        *self.slot.write() = Some(value);
    }

    /// Empty the slot, returning the previous value
    #[inline]
    pub fn take(&self) -> Option<Arc<T>> {
        self.slot.write().take()
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("set", &self.is_set())
            .finish()
    }
}

type AssignFn<T> = Arc<dyn Fn(&T, Instance) -> Result<()> + Send + Sync>;

/// One injectable field of `T`
pub struct InjectionPoint<T> {
    field: String,
    key: TypeKey,
    name: Option<String>,
    optional: bool,
    assign: AssignFn<T>,
}

impl<T: 'static> InjectionPoint<T> {
    /// Qualify the lookup with a binding name
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Leave the field empty instead of failing when nothing is bound
    pub fn optional(&mut self) -> &mut Self {
        self.optional = true;
        self
    }

    /// Declaring type and field, e.g. `app::Worker.logger`
    #[inline]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Declared type of the field
    #[inline]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    pub(crate) fn assign(&self, target: &T, value: Instance) -> Result<()> {
        (self.assign)(target, value)
    }

    pub(crate) fn unsatisfied(&self) -> DiError {
        DiError::Unsatisfied {
            field: self.field.clone(),
            type_name: self.key.type_name(),
            name: self.name.clone(),
        }
    }
}

impl<T> std::fmt::Debug for InjectionPoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("key", &self.key)
            .field("name", &self.name)
            .field("optional", &self.optional)
            .finish()
    }
}

/// The ordered injection points of `T`.
///
/// Built once per type by [`Injectable::injection_points`]: own fields in
/// declaration order, then the points of each embedded base.
pub struct InjectionPoints<T> {
    points: Vec<InjectionPoint<T>>,
}

impl<T: Injectable> InjectionPoints<T> {
    pub(crate) fn collect() -> Self {
        let mut points = Self { points: Vec::new() };
        T::injection_points(&mut points);
        points
    }

    /// Declare a field of type `Inject<D>`
    pub fn field<D, F>(&mut self, field: &str, accessor: F) -> &mut InjectionPoint<T>
    where
        D: Send + Sync + 'static,
        F: Fn(&T) -> &Inject<D> + Send + Sync + 'static,
    {
        self.push_field(field, TypeKey::of::<D>(), accessor)
    }

    /// Declare a field of parameterized type `D` whose raw form is `R`
    pub fn field_erased<D, R, F>(&mut self, field: &str, accessor: F) -> &mut InjectionPoint<T>
    where
        D: Send + Sync + 'static,
        R: ?Sized + 'static,
        F: Fn(&T) -> &Inject<D> + Send + Sync + 'static,
    {
        self.push_field(field, TypeKey::parameterized::<D, R>(), accessor)
    }

    /// Append the points of an embedded base value.
    ///
    /// Field identities keep naming the base type that declares them.
    pub fn base<B, F>(&mut self, accessor: F) -> &mut Self
    where
        B: Injectable,
        F: Fn(&T) -> &B + Send + Sync + 'static,
    {
        let accessor = Arc::new(accessor);
        let inherited = crate::cache::injection_points::<B>();

        for point in inherited.iter() {
            let accessor = Arc::clone(&accessor);
            let assign = Arc::clone(&point.assign);
            self.points.push(InjectionPoint {
                field: point.field.clone(),
                key: point.key,
                name: point.name.clone(),
                optional: point.optional,
                assign: Arc::new(move |target: &T, value: Instance| {
                    assign(accessor(target), value)
                }),
            });
        }
        self
    }

    fn push_field<D, F>(&mut self, field: &str, key: TypeKey, accessor: F) -> &mut InjectionPoint<T>
    where
        D: Send + Sync + 'static,
        F: Fn(&T) -> &Inject<D> + Send + Sync + 'static,
    {
        let field = format!("{}.{}", std::any::type_name::<T>(), field);
        let assign_field = field.clone();
        let assign = move |target: &T, value: Instance| -> Result<()> {
            let value = value.downcast::<D>().map_err(|_| DiError::FieldAssignment {
                field: assign_field.clone(),
                expected: std::any::type_name::<D>(),
            })?;
            accessor(target).set(value);
            Ok(())
        };

        let index = self.points.len();
        self.points.push(InjectionPoint {
            field,
            key,
            name: None,
            optional: false,
            assign: Arc::new(assign),
        });
        &mut self.points[index]
    }
}

impl<T> InjectionPoints<T> {
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, InjectionPoint<T>> {
        self.points.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<T> std::fmt::Debug for InjectionPoints<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.points.iter()).finish()
    }
}

/// Type-erased field wiring held by prototype bindings
pub(crate) trait Wiring: Send + Sync {
    fn wire(&self, instance: &Instance, injector: &Injector, resolution: &mut Resolution) -> Result<()>;
}

impl<T: Injectable> Wiring for InjectionPoints<T> {
    fn wire(&self, instance: &Instance, injector: &Injector, resolution: &mut Resolution) -> Result<()> {
        let target = (**instance).downcast_ref::<T>().ok_or_else(|| {
            DiError::Internal(format!(
                "prototype instance is not a {}",
                std::any::type_name::<T>()
            ))
        })?;
        injector.inject_points(self, target, resolution)
    }
}
