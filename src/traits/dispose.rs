//! Disposal trait for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// buffers, closing connections) and register them through one of the
/// `disposable_*` descriptor constructors. The scope that owns an instance
/// calls `dispose` exactly once, when the scope itself is disposed.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Dispose, Lifetime, Resolver, ServiceCollection};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Cache { flushed: AtomicBool }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_disposable_factory::<Cache, _>(Lifetime::Scoped, |_| Cache {
///     flushed: AtomicBool::new(false),
/// });
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// let cache = scope.get_required::<Cache>();
/// scope.dispose();
/// assert!(cache.flushed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
