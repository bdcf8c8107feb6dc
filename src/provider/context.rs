//! Resolver handle passed to factory functions.

use crate::error::DiResult;
use crate::internal::CallChain;
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

use super::ScopeRef;

/// Context passed to factory functions for resolving dependencies.
///
/// A context resolves against the scope the factory runs in: the calling
/// scope for Transient and Scoped registrations, the root for Singletons.
/// Resolutions made through it stay on the current resolution path, so a
/// factory that asks for its own service fails with a circular dependency
/// error instead of recursing.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{DiError, Lifetime, Resolver, ServiceCollection};
///
/// struct Chicken;
/// struct Egg;
///
/// let mut services = ServiceCollection::new();
/// services.add_try_factory::<Chicken, _>(Lifetime::Transient, |r| {
///     r.get::<Egg>()?;
///     Ok(Chicken)
/// });
/// services.add_try_factory::<Egg, _>(Lifetime::Transient, |r| {
///     r.get::<Chicken>()?;
///     Ok(Egg)
/// });
///
/// let provider = services.build();
/// assert!(matches!(provider.get::<Egg>(), Err(DiError::Circular(_))));
/// ```
pub struct ResolverContext<'a> {
    scope: ScopeRef<'a>,
    chain: Option<&'a CallChain<'a>>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(scope: ScopeRef<'a>, chain: Option<&'a CallChain<'a>>) -> Self {
        Self { scope, chain }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key) -> DiResult<Option<AnyArc>> {
        self.scope.resolve(key, self.chain)
    }
}
