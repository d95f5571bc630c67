//! Memoized per-entity attribute cache.
//!
//! Derived values (fingerprints most prominently) are expensive to compute
//! and asked for repeatedly, possibly from multiple threads. Each entity owns
//! an [`AttributeStore`]; an [`Attribute`] pairs the computation with a
//! [`StoragePolicy`] and is keyed by its own type identity.
//!
//! The store deliberately does **not** hold its lock while computing:
//!
//! 1. `Never` policy: compute and return directly, no locking.
//! 2. Under the mutex, look for an existing entry; return it if present.
//! 3. Otherwise release the lock and compute. Concurrent callers may race
//!    here and compute the same value twice; that is wasted work, never a
//!    correctness problem.
//! 4. Re-acquire the lock and re-check: if another thread stored a value in
//!    the meantime, discard the fresh one and return the stored value (first
//!    writer wins). Otherwise store and return the fresh value.
//!
//! A settled cache therefore hands the *same* `Arc` to every caller.
//! `Temporary` entries can be dropped by [`AttributeStore::trim`]; a trimmed
//! entry is simply absent and gets recomputed on the next request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;

/// Caching discipline for a computed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoragePolicy {
    /// Recompute on every request; nothing is ever stored.
    Never,
    /// Cache the value, but allow `trim()` to evict it.
    Temporary,
    /// Cache the value for the lifetime of the store.
    Permanent,
}

/// A computation bound to a storage policy.
///
/// Implementors are zero-sized marker types in practice; the `TypeId` of the
/// implementor is the cache key, so two distinct attribute types never
/// collide even when their value types coincide.
pub trait Attribute<E: ?Sized>: 'static {
    type Value: Send + Sync + 'static;

    fn policy(&self) -> StoragePolicy;

    fn compute(&self, entity: &E) -> Result<Self::Value, AppError>;
}

struct Entry {
    policy: StoragePolicy,
    value: Arc<dyn Any + Send + Sync>,
}

/// Per-entity cache of computed attribute values.
#[derive(Default)]
pub struct AttributeStore {
    entries: Mutex<HashMap<TypeId, Entry>>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value of `attr` for `entity`, computing it if necessary.
    pub fn get<E, A>(&self, entity: &E, attr: &A) -> Result<Arc<A::Value>, AppError>
    where
        E: ?Sized,
        A: Attribute<E>,
    {
        if attr.policy() == StoragePolicy::Never {
            return Ok(Arc::new(attr.compute(entity)?));
        }

        let key = TypeId::of::<A>();
        {
            let entries = self.lock()?;
            if let Some(entry) = entries.get(&key) {
                return downcast::<A::Value>(&entry.value);
            }
        }

        // Compute outside the lock; this can be slow and must not serialize
        // unrelated attribute lookups on the same entity.
        let fresh: Arc<dyn Any + Send + Sync> = Arc::new(attr.compute(entity)?);

        let mut entries = self.lock()?;
        if let Some(entry) = entries.get(&key) {
            tracing::debug!(
                attribute = std::any::type_name::<A>(),
                "discarding redundantly computed attribute value (lost the store race)"
            );
            return downcast::<A::Value>(&entry.value);
        }
        entries.insert(
            key,
            Entry {
                policy: attr.policy(),
                value: Arc::clone(&fresh),
            },
        );
        drop(entries);
        downcast::<A::Value>(&fresh)
    }

    /// Drop all `Temporary` entries; `Permanent` entries survive.
    pub fn trim(&self) -> Result<(), AppError> {
        let mut entries = self.lock()?;
        entries.retain(|_, e| e.policy == StoragePolicy::Permanent);
        Ok(())
    }

    /// Number of currently stored entries (diagnostics only).
    pub fn stored_len(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TypeId, Entry>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::internal("Attribute store mutex poisoned."))
    }
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore").finish_non_exhaustive()
    }
}

fn downcast<T: Send + Sync + 'static>(
    value: &Arc<dyn Any + Send + Sync>,
) -> Result<Arc<T>, AppError> {
    Arc::clone(value)
        .downcast::<T>()
        .map_err(|_| AppError::internal("Cached attribute value has an unexpected type."))
}
