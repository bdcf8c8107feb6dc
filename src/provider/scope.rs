//! Lifetime scopes: per-scope instance caches and disposal tracking.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::ReentrantMutex;

use crate::descriptors::Releaser;
use crate::error::{DiError, DiResult};
use crate::internal::DisposeBag;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::registration::ServiceId;
use crate::traits::ResolverCore;

use super::{ScopeRef, ServiceProvider};

#[derive(Default)]
struct ScopeCache {
    resolved: HashMap<ServiceId, AnyArc>,
    // Scoped (or, on the root, Singleton) disposables in creation order
    owned: DisposeBag,
    transients: DisposeBag,
}

/// Instance cache and disposables of one scope.
///
/// The lock is re-entrant: a factory running under it may resolve further
/// Scoped services of the same scope on the same thread. The `RefCell` is
/// never borrowed across user code.
#[derive(Default)]
pub(crate) struct ScopeState {
    cache: ReentrantMutex<RefCell<ScopeCache>>,
    disposed: AtomicBool,
}

impl ScopeState {
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Returns the cached instance for `id`, creating it with `create` once.
    ///
    /// Concurrent callers for the same scope serialize on the scope lock, so
    /// `create` runs at most once per identity. A failing `create` stores
    /// nothing.
    pub(crate) fn get_or_create<F>(&self, id: ServiceId, release: Option<&Releaser>, create: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        let guard = self.cache.lock();
        if self.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        if let Some(existing) = guard.borrow().resolved.get(&id) {
            return Ok(existing.clone());
        }

        let value = create()?;

        // `create` may have disposed this scope from the same thread
        if self.is_disposed() {
            drop(guard);
            if let Some(release) = release {
                release(&value);
            }
            return Err(DiError::ScopeDisposed);
        }

        let mut cache = guard.borrow_mut();
        if let Some(existing) = cache.resolved.get(&id) {
            return Ok(existing.clone());
        }
        cache.resolved.insert(id, value.clone());
        if let Some(release) = release {
            cache.owned.push(value.clone(), release.clone());
        }
        Ok(value)
    }

    /// Tracks a freshly built transient for release on disposal.
    pub(crate) fn capture_transient(&self, value: AnyArc, release: Option<&Releaser>) -> DiResult<AnyArc> {
        let Some(release) = release else {
            return Ok(value);
        };

        let guard = self.cache.lock();
        if self.is_disposed() {
            drop(guard);
            release(&value);
            return Err(DiError::ScopeDisposed);
        }
        guard.borrow_mut().transients.push(value.clone(), release.clone());
        Ok(value)
    }

    /// Number of tracked disposables not yet released.
    pub(crate) fn pending_disposables(&self) -> usize {
        let guard = self.cache.lock();
        let cache = guard.borrow();
        cache.owned.len() + cache.transients.len()
    }

    /// Releases tracked disposables: transients first, then cached instances,
    /// each group in creation order. Only the first call does anything.
    pub(crate) fn dispose(&self) {
        let (bag, resolved) = {
            let guard = self.cache.lock();
            if self.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            let mut cache = guard.borrow_mut();
            let mut bag = std::mem::take(&mut cache.transients);
            bag.append(std::mem::take(&mut cache.owned));
            (bag, std::mem::take(&mut cache.resolved))
        };

        tracing::debug!(releasing = bag.len(), cached = resolved.len(), "disposing scope");
        bag.run_all();
        // Instances go only after every release has run
        drop(resolved);
    }
}

/// A child lifetime scope.
///
/// Scoped services are cached per scope; Singletons always come from the
/// provider's root. Disposing the scope releases its own transients and
/// Scoped instances and never touches the root.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct RequestId(u32);
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory::<RequestId, _>(|_| RequestId(7));
///
/// let provider = services.build();
/// let first = provider.create_scope();
/// let second = provider.create_scope();
///
/// let a = first.get_required::<RequestId>();
/// assert!(Arc::ptr_eq(&a, &first.get_required::<RequestId>()));
/// assert!(!Arc::ptr_eq(&a, &second.get_required::<RequestId>()));
/// ```
pub struct Scope {
    provider: ServiceProvider,
    state: ScopeState,
}

impl Scope {
    pub(crate) fn new(provider: ServiceProvider) -> Self {
        Self {
            provider,
            state: ScopeState::default(),
        }
    }

    fn scope_ref(&self) -> ScopeRef<'_> {
        ScopeRef {
            provider: self.provider.inner(),
            state: &self.state,
        }
    }

    /// Creates a sibling scope sharing this scope's provider and root.
    ///
    /// The new scope does not depend on this one; disposing either leaves the
    /// other untouched.
    pub fn create_scope(&self) -> Scope {
        self.provider.create_scope()
    }

    /// The provider this scope belongs to.
    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    /// Releases this scope's tracked disposables.
    ///
    /// Idempotent. A panicking release does not stop the remaining ones; the
    /// first panic is resumed after all have run.
    pub fn dispose(&self) {
        self.state.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        self.scope_ref().resolve_checked(key)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.state.is_disposed() {
            return;
        }
        let pending = self.state.pending_disposables();
        if pending > 0 {
            tracing::warn!(pending, "scope dropped with undisposed resources; call dispose() before dropping");
        }
    }
}
