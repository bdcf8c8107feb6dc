//! Registration table: entry chains per key and the per-key accessor cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::executor::AccessorSlot;
use crate::key::Key;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Erased value of a collection resolution, in registration order.
pub(crate) struct ServiceList(pub(crate) Vec<AnyArc>);

pub(crate) fn downcast_service<T: Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

// Trait objects are stored as Arc<Arc<dyn Trait>>
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

pub(crate) fn downcast_list(any: AnyArc) -> DiResult<Vec<AnyArc>> {
    any.downcast::<ServiceList>()
        .map(|list| list.0.clone())
        .map_err(|_| DiError::TypeMismatch("service list"))
}

/// Identity of one registration; Scoped and Singleton caches are keyed by it,
/// so two registrations under the same key never share a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ServiceId(pub(crate) usize);

/// A descriptor together with the identity assigned at registration.
pub(crate) struct Registration {
    pub(crate) id: ServiceId,
    pub(crate) descriptor: ServiceDescriptor,
}

/// All registrations of one key, in registration order.
pub(crate) struct ServiceEntry {
    chain: Vec<Arc<Registration>>,
}

impl ServiceEntry {
    /// The registration used for single-value resolution.
    pub(crate) fn last(&self) -> &Arc<Registration> {
        // Entries are only created together with their first registration
        &self.chain[self.chain.len() - 1]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Registration>> {
        self.chain.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.chain.len()
    }
}

/// Registration table shared by every scope of one provider.
///
/// Entry chains are written only while the provider is being built; the
/// accessor cache is populated lazily afterwards.
pub(crate) struct ServiceTable {
    entries: HashMap<Key, ServiceEntry>,
    accessors: RwLock<HashMap<Key, Arc<OnceCell<Arc<AccessorSlot>>>>>,
    next_id: usize,
}

impl ServiceTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            accessors: RwLock::new(HashMap::new()),
            next_id: 0,
        }
    }

    pub(crate) fn from_descriptors(descriptors: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        let mut table = Self::new();
        for descriptor in descriptors {
            table.register(descriptor);
        }
        table
    }

    /// Appends to the chain for the descriptor's key.
    pub(crate) fn register(&mut self, descriptor: ServiceDescriptor) -> ServiceId {
        let id = ServiceId(self.next_id);
        self.next_id += 1;
        let key = descriptor.key.clone();
        let registration = Arc::new(Registration { id, descriptor });
        self.entries
            .entry(key)
            .or_insert_with(|| ServiceEntry { chain: Vec::new() })
            .chain
            .push(registration);
        id
    }

    #[inline]
    pub(crate) fn lookup(&self, key: &Key) -> Option<&ServiceEntry> {
        self.entries.get(key)
    }

    pub(crate) fn registration_count(&self) -> usize {
        self.next_id
    }

    /// Returns the accessor for `key`, building it with `build` if absent.
    ///
    /// Racing callers for the same key wait for a single build and all receive
    /// the same slot. A failed build leaves nothing behind, so the next caller
    /// plans again.
    pub(crate) fn accessor<F>(&self, key: &Key, build: F) -> DiResult<Arc<AccessorSlot>>
    where
        F: FnOnce(&Key) -> DiResult<AccessorSlot>,
    {
        let existing = self.accessors.read().get(key).cloned();
        let cell = match existing {
            Some(cell) => cell,
            None => self.accessors.write().entry(key.clone()).or_default().clone(),
        };
        cell.get_or_try_init(|| build(key).map(Arc::new)).cloned()
    }

    /// The accessor for `key` if one has been built.
    pub(crate) fn built_accessor(&self, key: &Key) -> Option<Arc<AccessorSlot>> {
        self.accessors.read().get(key).and_then(|cell| cell.get().cloned())
    }
}
