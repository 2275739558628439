//! Process-wide injection-point cache
//!
//! Maps a concrete type to its [`InjectionPoints`], computed once per type.
//! The cache only holds `Weak` references: the strong reference belongs to
//! whoever registered the type (a prototype binding) or to an in-flight
//! `inject` call. Once those are gone the entry goes stale and is recomputed
//! on the next encounter.

use crate::{Injectable, InjectionPoints};
use ahash::RandomState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::trace;

type ErasedPoints = dyn Any + Send + Sync;

/// Concurrent, non-owning map from type to injection points
pub struct InjectionPointCache {
    entries: DashMap<TypeId, Weak<ErasedPoints>, RandomState>,
}

static GLOBAL: Lazy<InjectionPointCache> = Lazy::new(InjectionPointCache::new);

/// Injection points of `T` from the process-wide cache
#[inline]
pub fn injection_points<T: Injectable>() -> Arc<InjectionPoints<T>> {
    GLOBAL.get_or_compute::<T>()
}

/// The process-wide cache
#[inline]
pub fn global() -> &'static InjectionPointCache {
    &GLOBAL
}

impl InjectionPointCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
        }
    }

    /// Live cached points for `T`, if something still holds them
    pub fn get<T: Injectable>(&self) -> Option<Arc<InjectionPoints<T>>> {
        let weak = self.entries.get(&TypeId::of::<T>())?.value().clone();
        weak.upgrade()?.downcast::<InjectionPoints<T>>().ok()
    }

    /// Cached points for `T`, computing them on a miss.
    ///
    /// Computation runs without holding a shard lock (it may recurse into the
    /// cache for embedded bases). When two threads race, the first live entry
    /// wins and the other computation is discarded.
    pub fn get_or_compute<T: Injectable>(&self) -> Arc<InjectionPoints<T>> {
        if let Some(points) = self.get::<T>() {
            return points;
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "scoped_injector",
            class = std::any::type_name::<T>(),
            "Computing injection points"
        );

        let computed = Arc::new(InjectionPoints::<T>::collect());
        let erased: Arc<ErasedPoints> = computed.clone();

        match self.entries.entry(TypeId::of::<T>()) {
            Entry::Occupied(mut occupied) => {
                if let Some(existing) = occupied.get().upgrade() {
                    if let Ok(existing) = existing.downcast::<InjectionPoints<T>>() {
                        return existing;
                    }
                }
                occupied.insert(Arc::downgrade(&erased));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::downgrade(&erased));
            }
        }
        computed
    }

    /// Drop entries whose points are no longer referenced
    pub fn purge(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of entries, live or stale
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InjectionPointCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InjectionPointCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionPointCache")
            .field("entries", &self.len())
            .finish()
    }
}
