//! Call sites: immutable plans for producing one value.
//!
//! A call-site tree is built once per requested key by the planner and can be
//! evaluated any number of times, concurrently, against any scope. This module
//! holds the tree-walking evaluation; [`crate::executor`] holds the flattened
//! closure form of the same trees.

use std::sync::Arc;

use crate::descriptors::{Args, CtorFn, FactoryFn, Releaser};
use crate::error::DiResult;
use crate::internal::CallChain;
use crate::key::Key;
use crate::provider::{ResolverContext, ScopeRef};
use crate::registration::{AnyArc, ServiceId, ServiceList};

pub(crate) enum CallSite {
    /// Resolve each parameter in declared order, then construct
    Constructor {
        service: &'static str,
        params: Vec<CallSite>,
        ctor: CtorFn,
    },
    /// Call a factory with the resolving scope
    Factory { key: Key, factory: FactoryFn },
    /// Hand out a pre-built value; never cached or released here
    Instance(AnyArc),
    /// Fresh value each time; disposables are tracked by the calling scope
    Transient {
        inner: Box<CallSite>,
        release: Option<Releaser>,
    },
    /// Get-or-create in the calling scope's cache
    Scoped {
        id: ServiceId,
        inner: Box<CallSite>,
        release: Option<Releaser>,
    },
    /// Get-or-create in the root scope's cache
    Singleton {
        id: ServiceId,
        inner: Box<CallSite>,
        release: Option<Releaser>,
    },
    /// Every registration of `element`, in registration order
    ResolveAll { element: Key, items: Vec<CallSite> },
    /// Collection request for a key with no registrations
    EmptyCollection { element: Key },
}

impl CallSite {
    pub(crate) fn invoke(&self, scope: &ScopeRef<'_>, chain: Option<&CallChain<'_>>) -> DiResult<AnyArc> {
        match self {
            CallSite::Constructor { service, params, ctor } => {
                let values = params
                    .iter()
                    .map(|param| param.invoke(scope, chain))
                    .collect::<DiResult<Vec<_>>>()?;
                ctor(&Args::new(service, values))
            }
            CallSite::Factory { key, factory } => invoke_factory(factory, key, scope, chain),
            CallSite::Instance(value) => Ok(value.clone()),
            CallSite::Transient { inner, release } => {
                let value = inner.invoke(scope, chain)?;
                scope.capture_transient(value, release.as_ref())
            }
            CallSite::Scoped { id, inner, release } => {
                scope.get_or_create(*id, release.as_ref(), || inner.invoke(scope, chain))
            }
            CallSite::Singleton { id, inner, release } => {
                let root = scope.root();
                root.get_or_create(*id, release.as_ref(), || inner.invoke(&root, chain))
            }
            CallSite::ResolveAll { items, .. } => {
                let values = items
                    .iter()
                    .map(|item| item.invoke(scope, chain))
                    .collect::<DiResult<Vec<_>>>()?;
                Ok(Arc::new(ServiceList(values)))
            }
            CallSite::EmptyCollection { .. } => Ok(Arc::new(ServiceList(Vec::new()))),
        }
    }

    /// Short variant name, for logs.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CallSite::Constructor { .. } => "constructor",
            CallSite::Factory { .. } => "factory",
            CallSite::Instance(_) => "instance",
            CallSite::Transient { .. } => "transient",
            CallSite::Scoped { .. } => "scoped",
            CallSite::Singleton { .. } => "singleton",
            CallSite::ResolveAll { .. } => "resolve-all",
            CallSite::EmptyCollection { .. } => "empty-collection",
        }
    }
}

/// Runs a factory with a resolver bound to `scope`.
///
/// The factory's own key joins the chain so that whatever it resolves
/// dynamically is checked against it. When the accessor that led here has
/// entered the key already it is not entered twice.
pub(crate) fn invoke_factory(
    factory: &FactoryFn,
    key: &Key,
    scope: &ScopeRef<'_>,
    chain: Option<&CallChain<'_>>,
) -> DiResult<AnyArc> {
    if chain.map_or(false, |link| link.key() == key) {
        return factory(&ResolverContext::new(*scope, chain));
    }
    let link = CallChain::enter(chain, key)?;
    factory(&ResolverContext::new(*scope, Some(&link)))
}
