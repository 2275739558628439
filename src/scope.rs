//! Scope identity and in-progress resolution state
//!
//! Each [`Injector`](crate::Injector) carries a unique [`ScopeId`]. While a
//! resolution runs, prototype instances that are still being wired are kept
//! in a [`Resolution`] frame tagged with the scope that created them, so a
//! dependency cycle finds the half-initialized instance instead of recursing.

use crate::factory::Instance;
use crate::key::SlotKey;
use crate::TypeKey;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique scope identifier.
///
/// Each injector gets a unique ID for tracking and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    /// Generate a new unique scope ID.
    #[inline]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope-{}", self.0)
    }
}

struct InProgress {
    scope: ScopeId,
    slot: SlotKey,
    instance: Instance,
}

/// Instances being wired by the current top-level call.
///
/// One frame lives for one `get_*` or `inject` call on one thread, which is
/// why cycle-breaking is only guaranteed within a thread.
#[derive(Default)]
pub(crate) struct Resolution {
    in_progress: Vec<InProgress>,
}

impl Resolution {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Most recent in-progress instance for (key, name) created by `scope`
    pub(crate) fn find(&self, scope: ScopeId, key: &TypeKey, name: Option<&str>) -> Option<Instance> {
        self.in_progress
            .iter()
            .rev()
            .find(|entry| entry.scope == scope && entry.slot.matches(key, name))
            .map(|entry| entry.instance.clone())
    }

    /// Register an instance before wiring it; returns the mark to release to
    pub(crate) fn enter(&mut self, scope: ScopeId, slot: SlotKey, instance: Instance) -> usize {
        let mark = self.in_progress.len();
        self.in_progress.push(InProgress {
            scope,
            slot,
            instance,
        });
        mark
    }

    /// Drop everything registered since `mark`
    pub(crate) fn leave(&mut self, mark: usize) {
        self.in_progress.truncate(mark);
    }

    #[cfg_attr(not(feature = "logging"), allow(dead_code))]
    pub(crate) fn depth(&self) -> usize {
        self.in_progress.len()
    }
}
