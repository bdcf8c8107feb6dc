//! Resolver traits for service resolution.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{key_of, key_of_trait, Key};
use crate::registration::{downcast_list, downcast_service, downcast_trait, AnyArc};

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider) (the root
/// scope), [`Scope`](crate::Scope) and [`ResolverContext`](crate::ResolverContext).
/// Most callers want the typed methods of [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single value for `key`.
    ///
    /// `Ok(None)` means nothing is registered under `key`; that is not an
    /// error. For a [`Key::All`] request the value is the erased collection.
    fn resolve_any(&self, key: &Key) -> DiResult<Option<AnyArc>>;

    /// Resolves every registration of `key`, in registration order.
    ///
    /// An unregistered key yields an empty vector.
    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        match self.resolve_any(&key.clone().all())? {
            Some(list) => downcast_list(list),
            None => Ok(Vec::new()),
        }
    }
}

/// High-level resolver interface with generic methods for type-safe service
/// resolution.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42usize);
/// services.add_singleton_trait(Arc::new(ConsoleLogger) as Arc<dyn Logger>);
///
/// let provider = services.build();
/// assert_eq!(*provider.get_required::<usize>(), 42);
/// assert_eq!(provider.get_required_trait::<dyn Logger>().log("hi"), "LOG: hi");
/// assert!(provider.get::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type; `Ok(None)` when it is not registered.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_any(&key_of::<T>())?
            .map(downcast_service::<T>)
            .transpose()
    }

    /// Resolves a trait object; `Ok(None)` when it is not registered.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        self.resolve_any(&key_of_trait::<T>())?
            .map(downcast_trait::<T>)
            .transpose()
    }

    /// Resolves a concrete service type or panics.
    ///
    /// # Panics
    ///
    /// If the service is not registered or its construction fails.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        match self.get::<T>() {
            Ok(Some(service)) => service,
            Ok(None) => panic!("No registration for {}", std::any::type_name::<T>()),
            Err(e) => panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e),
        }
    }

    /// Resolves a trait object or panics.
    ///
    /// # Panics
    ///
    /// If the trait is not registered or its construction fails.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Arc<T> {
        match self.get_trait::<T>() {
            Ok(Some(service)) => service,
            Ok(None) => panic!("No registration for trait {}", std::any::type_name::<T>()),
            Err(e) => panic!("Failed to resolve trait {}: {}", std::any::type_name::<T>(), e),
        }
    }

    /// Every registration of `T`, in registration order.
    fn get_all<T: Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&key_of::<T>())?
            .into_iter()
            .map(downcast_service::<T>)
            .collect()
    }

    /// Every registration of the trait `T`, in registration order.
    fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all(&key_of_trait::<T>())?
            .into_iter()
            .map(downcast_trait::<T>)
            .collect()
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
