//! Service provider: the root scope and entry point for resolution.

use std::sync::Arc;

use crate::config::ProviderOptions;
use crate::descriptors::Releaser;
use crate::error::{DiError, DiResult};
use crate::executor::{AccessorSlot, AccessorState};
use crate::internal::CallChain;
use crate::key::Key;
use crate::planner::CallSiteFactory;
use crate::registration::{AnyArc, ServiceId, ServiceTable};
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;

pub use context::ResolverContext;
pub use scope::Scope;

use scope::ScopeState;

/// Service provider for resolving dependencies from the container.
///
/// The provider is the root scope: Singletons are cached here and shared by
/// every scope created from it. Handles are cheap to clone and all clones
/// share the same root.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _>(|r| UserService {
///     db: r.get_required::<Database>(),
/// });
///
/// let provider = services.build();
/// let users = provider.get_required::<UserService>();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    table: ServiceTable,
    root: ScopeState,
    options: ProviderOptions,
}

impl ProviderInner {
    /// The accessor for `key`, planning it on first use.
    fn accessor(&self, key: &Key) -> DiResult<Arc<AccessorSlot>> {
        self.table.accessor(key, |key| {
            match CallSiteFactory::new(&self.table).plan(key, &mut Vec::new())? {
                Some(site) => {
                    tracing::debug!(key = %key, kind = site.kind(), "planned accessor");
                    Ok(AccessorSlot::interpreted(key.clone(), site))
                }
                None => {
                    tracing::debug!(key = %key, "no registration for key");
                    Ok(AccessorSlot::missing(key.clone()))
                }
            }
        })
    }
}

/// A scope as seen by a running resolution.
#[derive(Clone, Copy)]
pub(crate) struct ScopeRef<'a> {
    provider: &'a ProviderInner,
    state: &'a ScopeState,
}

impl<'a> ScopeRef<'a> {
    /// The provider's root scope.
    pub(crate) fn root(&self) -> ScopeRef<'a> {
        ScopeRef {
            provider: self.provider,
            state: &self.provider.root,
        }
    }

    pub(crate) fn get_or_create<F>(&self, id: ServiceId, release: Option<&Releaser>, create: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        self.state.get_or_create(id, release, create)
    }

    pub(crate) fn capture_transient(&self, value: AnyArc, release: Option<&Releaser>) -> DiResult<AnyArc> {
        self.state.capture_transient(value, release)
    }

    /// Resolves `key` nested below `chain`.
    pub(crate) fn resolve(&self, key: &Key, chain: Option<&CallChain<'_>>) -> DiResult<Option<AnyArc>> {
        let link = CallChain::enter(chain, key)?;
        let slot = self.provider.accessor(key)?;
        slot.invoke(self, Some(&link), &self.provider.options)
    }

    /// Entry point for callers outside a resolution.
    pub(crate) fn resolve_checked(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        if self.state.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        self.resolve(key, None)
    }
}

impl ServiceProvider {
    pub(crate) fn new(table: ServiceTable, options: ProviderOptions) -> Self {
        tracing::debug!(
            registrations = table.registration_count(),
            compile_mode = ?options.compile_mode,
            "service provider built"
        );
        Self {
            inner: Arc::new(ProviderInner {
                table,
                root: ScopeState::default(),
                options,
            }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    fn root_ref(&self) -> ScopeRef<'_> {
        ScopeRef {
            provider: &self.inner,
            state: &self.inner.root,
        }
    }

    /// Creates a child scope with its own Scoped cache and disposables.
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Releases the root's tracked disposables: transients resolved from the
    /// root, then Singletons, each in creation order.
    ///
    /// Idempotent and shared by every clone of this provider. Child scopes
    /// are not disposed by this call.
    pub fn dispose(&self) {
        self.inner.root.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.root.is_disposed()
    }

    /// The options this provider was built with.
    pub fn options(&self) -> &ProviderOptions {
        &self.inner.options
    }

    /// Execution tier of the accessor for `key`.
    ///
    /// ```rust
    /// use tiered_di::{key_of, AccessorState, CompileMode, ProviderOptions, Resolver, ServiceCollection};
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_factory::<u32, _>(|_| 7);
    /// let provider = services.build_with(ProviderOptions::new().compile_mode(CompileMode::Inline));
    ///
    /// assert_eq!(provider.accessor_state(&key_of::<u32>()), AccessorState::Unbuilt);
    /// provider.get_required::<u32>();
    /// assert_eq!(provider.accessor_state(&key_of::<u32>()), AccessorState::Interpreted);
    /// provider.get_required::<u32>();
    /// assert_eq!(provider.accessor_state(&key_of::<u32>()), AccessorState::Compiled);
    /// ```
    pub fn accessor_state(&self, key: &Key) -> AccessorState {
        self.inner
            .table
            .built_accessor(key)
            .map_or(AccessorState::Unbuilt, |slot| slot.state())
    }
}

impl Clone for ServiceProvider {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.inner.table.registration_count())
            .field("options", &self.inner.options)
            .field("disposed", &self.inner.root.is_disposed())
            .finish()
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        // Only the last handle speaks for the root
        if Arc::strong_count(&self.inner) != 1 || self.inner.root.is_disposed() {
            return;
        }
        let pending = self.inner.root.pending_disposables();
        if pending > 0 {
            tracing::warn!(pending, "service provider dropped with undisposed resources; call dispose() before dropping");
        }
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        self.root_ref().resolve_checked(key)
    }
}
