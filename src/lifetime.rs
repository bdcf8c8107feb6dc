//! Service lifetime definitions.

/// How long a resolved instance is reused, and which scope owns it.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Pool { size: usize }
/// struct UnitOfWork { pool: Arc<Pool> }
/// struct Command;
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Pool { size: 8 });
/// services.add_scoped_factory::<UnitOfWork, _>(|r| UnitOfWork { pool: r.get_required::<Pool>() });
/// services.add_transient_factory::<Command, _>(|_| Command);
///
/// let provider = services.build();
/// let request = provider.create_scope();
/// let other = provider.create_scope();
///
/// let work = request.get_required::<UnitOfWork>();
/// assert!(Arc::ptr_eq(&work, &request.get_required::<UnitOfWork>()));
/// assert!(!Arc::ptr_eq(&work, &other.get_required::<UnitOfWork>()));
/// assert!(Arc::ptr_eq(&work.pool, &other.get_required::<UnitOfWork>().pool));
/// assert_eq!(work.pool.size, 8);
///
/// let a = request.get_required::<Command>();
/// assert!(!Arc::ptr_eq(&a, &request.get_required::<Command>()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per root provider, cached until the root is disposed
    ///
    /// The instance lives in the root scope's cache no matter which
    /// descendant scope first asked for it.
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime
    Scoped,
    /// New instance per resolution, never cached
    ///
    /// Disposable transients are still tracked by the scope that produced
    /// them and released when it is disposed.
    Transient,
}
