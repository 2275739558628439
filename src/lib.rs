//! # Scoped Injector - Hierarchical Field Injection for Rust
//!
//! A resolution engine that produces, caches and wires instances by type and
//! optional name, walking a chain of scopes from child to parent.
//!
//! ## Features
//!
//! - 🔗 **Hierarchical scopes** - Children fall back to their parent chain
//! - 🔒 **Per-scope singletons** - Resolved once, cached in every scope that asked
//! - ♻️ **Prototypes** - Fresh, field-injected instance on every resolve
//! - 🔄 **Cycle-safe wiring** - Instances are visible before their own fields are injected
//! - 🧬 **Raw-type fallback** - Parameterized requests retry with the erased key
//! - 🪶 **Non-owning metadata cache** - Injection points never outlive their registrations
//! - 📊 **Observable** - Optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use scoped_injector::{Inject, Injectable, InjectionPoints, Injector, Module};
//! use std::sync::Arc;
//!
//! struct Logger { prefix: String }
//! struct Metrics;
//!
//! #[derive(Default)]
//! struct Worker {
//!     logger: Inject<Logger>,
//!     metrics: Inject<Metrics>,
//! }
//!
//! impl Injectable for Worker {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("logger", |w: &Worker| &w.logger);
//!         points.field("metrics", |w: &Worker| &w.metrics).optional();
//!     }
//! }
//!
//! let module = Module::new();
//! module.singleton(Logger { prefix: "app".into() });
//! module.prototype(Worker::default);
//!
//! let injector = Injector::new(module);
//! let w1 = injector.get::<Worker>().unwrap();
//! let w2 = injector.get::<Worker>().unwrap();
//!
//! assert!(!Arc::ptr_eq(&w1, &w2));
//! assert!(Arc::ptr_eq(&w1.logger.get().unwrap(), &w2.logger.get().unwrap()));
//! assert!(w1.metrics.get().is_none());
//! ```
//!
//! ## Cyclic Graphs
//!
//! ```rust
//! use scoped_injector::{Inject, Injectable, InjectionPoints, Injector, Module};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct A { b: Inject<B> }
//! #[derive(Default)]
//! struct B { a: Inject<A> }
//!
//! impl Injectable for A {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("b", |a: &A| &a.b);
//!     }
//! }
//! impl Injectable for B {
//!     fn injection_points(points: &mut InjectionPoints<Self>) {
//!         points.field("a", |b: &B| &b.a);
//!     }
//! }
//!
//! let module = Module::new();
//! module.prototype(A::default);
//! module.prototype(B::default);
//!
//! let a = Injector::new(module).get::<A>().unwrap();
//! let b = a.b.get().unwrap();
//! assert!(Arc::ptr_eq(&a, &b.a.get().unwrap()));
//! # a.b.take();
//! ```
//!
//! ## Limits
//!
//! Cycle-breaking only covers instances being wired on the current thread.
//! A binding graph that keeps producing new keys without ever revisiting an
//! in-progress one recurses until the stack is exhausted; this is not
//! detected.

mod cache;
mod error;
mod factory;
mod injection;
mod injector;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod provider;
mod scope;
mod storage;

pub use cache::{global as injection_point_cache, InjectionPointCache};
pub use error::*;
pub use factory::{Binding, BindingSource, BoxError, Instance};
pub use injection::{Inject, InjectionPoint, InjectionPoints};
pub use injector::Injector;
pub use key::TypeKey;
pub use provider::*;
pub use scope::ScopeId;
pub use storage::Module;

#[cfg(feature = "derive")]
pub use scoped_injector_derive::Injectable;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Binding, BindingSource, DiError, Inject, Injectable, InjectionPoints, Injector, Lifetime,
        Module, Result, TypeKey,
    };
    pub use std::sync::Arc;
}
