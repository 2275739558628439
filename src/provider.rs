//! Provider traits for dependency injection
//!
//! These traits define what types can be wired and how bindings behave.

use crate::InjectionPoints;

/// A type whose fields can be wired by an [`Injector`](crate::Injector).
///
/// Implementations declare their injection points once; the result is cached
/// per type and reused for every instance. Types with nothing to inject can
/// rely on the default (empty) declaration.
///
/// Usually generated with `#[derive(Injectable)]` (feature `derive`).
///
/// # Examples
///
/// ```rust
/// use scoped_injector::{Inject, Injectable, InjectionPoints};
///
/// struct Logger;
/// struct Metrics;
///
/// #[derive(Default)]
/// struct Worker {
///     logger: Inject<Logger>,
///     metrics: Inject<Metrics>,
/// }
///
/// impl Injectable for Worker {
///     fn injection_points(points: &mut InjectionPoints<Self>) {
///         points.field("logger", |w: &Worker| &w.logger);
///         points.field("metrics", |w: &Worker| &w.metrics).optional();
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Declare the injection points of this type, own fields first.
    fn injection_points(points: &mut InjectionPoints<Self>)
    where
        Self: Sized,
    {
        let _ = points;
    }
}

/// Lifecycle of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// One shared value, never re-injected by the engine
    #[default]
    Singleton,

    /// New instance per resolution, field-injected after creation
    Prototype,
}

impl Lifetime {
    #[inline]
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }

    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Prototype => "prototype",
        }
    }
}
