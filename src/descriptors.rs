//! Service descriptors: one immutable record per registration.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{key_of, key_of_trait, Key};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::registration::{downcast_list, downcast_service, downcast_trait, AnyArc};
use crate::traits::Dispose;

/// Factory receiving the resolving scope.
pub(crate) type FactoryFn = Arc<dyn Fn(&ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync>;
/// Construction closure receiving already resolved constructor parameters.
pub(crate) type CtorFn = Arc<dyn Fn(&Args) -> DiResult<AnyArc> + Send + Sync>;
/// Releases one produced value; captured at registration for `Dispose` types.
pub(crate) type Releaser = Arc<dyn Fn(&AnyArc) + Send + Sync>;

fn factory_fn<F>(f: F) -> FactoryFn
where
    F: Fn(&ResolverContext<'_>) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn ctor_fn<F>(f: F) -> CtorFn
where
    F: Fn(&Args) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How a registration produces its value.
#[derive(Clone)]
pub(crate) enum Source {
    /// An implementation with declared constructor parameter keys
    Constructor { params: Arc<[Key]>, ctor: CtorFn },
    /// A function of the resolving scope
    Factory(FactoryFn),
    /// A pre-built value owned by the registrant
    Instance(AnyArc),
}

/// A single registration of a key with a lifetime and a construction source.
///
/// Descriptors are immutable once created. Registration order is significant:
/// the last descriptor registered under a key wins single-value resolution,
/// and collection resolution yields every descriptor in registration order.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{key_of, Lifetime, Resolver, ServiceCollection, ServiceDescriptor};
/// use std::sync::Arc;
///
/// struct Config { port: u16 }
/// struct Server { config: Arc<Config> }
///
/// let mut services = ServiceCollection::new();
/// services.add(ServiceDescriptor::instance(Config { port: 8080 }));
/// services.add(ServiceDescriptor::constructor::<Server, _>(
///     Lifetime::Singleton,
///     [key_of::<Config>()],
///     |args| Ok(Server { config: args.get::<Config>(0)? }),
/// ));
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<Server>().config.port, 8080);
/// ```
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub(crate) key: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) source: Source,
    pub(crate) release: Option<Releaser>,
    pub(crate) impl_type_name: &'static str,
}

impl ServiceDescriptor {
    /// A pre-built singleton value.
    ///
    /// The container hands the value out but never releases it; ownership
    /// stays with the registrant.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self::raw(
            key_of::<T>(),
            Lifetime::Singleton,
            Source::Instance(Arc::new(value)),
            std::any::type_name::<T>(),
        )
    }

    /// A pre-built trait-object singleton.
    pub fn trait_instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::raw(
            key_of_trait::<T>(),
            Lifetime::Singleton,
            Source::Instance(Arc::new(value)),
            std::any::type_name::<T>(),
        )
    }

    /// An infallible factory of the resolving scope.
    pub fn factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        Self::try_factory(lifetime, move |ctx| Ok(factory(ctx)))
    }

    /// A fallible factory; errors are propagated to the caller of `resolve`
    /// untouched and nothing is cached.
    pub fn try_factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        let f = factory_fn(move |ctx| Ok(Arc::new(factory(ctx)?) as AnyArc));
        Self::raw(key_of::<T>(), lifetime, Source::Factory(f), std::any::type_name::<T>())
    }

    /// A factory producing a trait object.
    pub fn trait_factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let f = factory_fn(move |ctx| Ok(Arc::new(factory(ctx)) as AnyArc));
        Self::raw(key_of_trait::<T>(), lifetime, Source::Factory(f), std::any::type_name::<T>())
    }

    /// An implementation with explicit constructor parameters.
    ///
    /// `params` are planned ahead of time, so cycles and missing registrations
    /// among them are detected before any user code runs. The closure receives
    /// the resolved values positionally through [`Args`].
    pub fn constructor<T, F>(lifetime: Lifetime, params: impl IntoIterator<Item = Key>, ctor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> DiResult<T> + Send + Sync + 'static,
    {
        let ctor = ctor_fn(move |args| Ok(Arc::new(ctor(args)?) as AnyArc));
        Self::raw(
            key_of::<T>(),
            lifetime,
            Source::Constructor { params: params.into_iter().collect(), ctor },
            std::any::type_name::<T>(),
        )
    }

    /// Constructor variant producing a trait object.
    pub fn trait_constructor<T, F>(lifetime: Lifetime, params: impl IntoIterator<Item = Key>, ctor: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Args) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let ctor = ctor_fn(move |args| Ok(Arc::new(ctor(args)?) as AnyArc));
        Self::raw(
            key_of_trait::<T>(),
            lifetime,
            Source::Constructor { params: params.into_iter().collect(), ctor },
            std::any::type_name::<T>(),
        )
    }

    /// Factory whose products are released by the owning scope on disposal.
    pub fn disposable_factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: Dispose,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        let mut descriptor = Self::factory(lifetime, factory);
        descriptor.release = Some(Arc::new(|any: &AnyArc| {
            if let Some(value) = any.downcast_ref::<T>() {
                value.dispose();
            }
        }));
        descriptor
    }

    /// Constructor whose products are released by the owning scope on disposal.
    pub fn disposable_constructor<T, F>(lifetime: Lifetime, params: impl IntoIterator<Item = Key>, ctor: F) -> Self
    where
        T: Dispose,
        F: Fn(&Args) -> DiResult<T> + Send + Sync + 'static,
    {
        let mut descriptor = Self::constructor(lifetime, params, ctor);
        descriptor.release = Some(Arc::new(|any: &AnyArc| {
            if let Some(value) = any.downcast_ref::<T>() {
                value.dispose();
            }
        }));
        descriptor
    }

    /// Trait-object factory whose products are released on disposal.
    ///
    /// Works for any trait with `Dispose` as a supertrait.
    pub fn disposable_trait_factory<T, F>(lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Dispose,
        F: Fn(&ResolverContext<'_>) -> Arc<T> + Send + Sync + 'static,
    {
        let mut descriptor = Self::trait_factory(lifetime, factory);
        descriptor.release = Some(Arc::new(|any: &AnyArc| {
            if let Some(value) = any.downcast_ref::<Arc<T>>() {
                value.dispose();
            }
        }));
        descriptor
    }

    /// Moves this registration under another key.
    ///
    /// The stored representation does not change, so the new key must be
    /// read back the same way as the original one (for example an
    /// [`Key::Indexed`] slot of the same element type).
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    fn raw(key: Key, lifetime: Lifetime, source: Source, impl_type_name: &'static str) -> Self {
        Self {
            key,
            lifetime,
            source,
            release: None,
            impl_type_name,
        }
    }

    /// The key this descriptor is registered under.
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Name of the implementation type, for diagnostics.
    pub fn impl_type_name(&self) -> &'static str {
        self.impl_type_name
    }

    /// Constructor parameter keys, or `None` for factories and instances.
    pub fn params(&self) -> Option<&[Key]> {
        match &self.source {
            Source::Constructor { params, .. } => Some(params),
            _ => None,
        }
    }

    /// Whether produced values are released when their owning scope is disposed.
    pub fn is_disposable(&self) -> bool {
        self.release.is_some()
    }

    /// Borrows a pre-built instance of type `T`, if this is an instance descriptor.
    pub fn instance_ref<T: 'static>(&self) -> Option<&T> {
        match &self.source {
            Source::Instance(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::Constructor { params, .. } => format!("constructor({} params)", params.len()),
            Source::Factory(_) => "factory".to_string(),
            Source::Instance(_) => "instance".to_string(),
        };
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("source", &source)
            .field("impl_type_name", &self.impl_type_name)
            .field("disposable", &self.release.is_some())
            .finish()
    }
}

/// Resolved constructor parameters, in declared order.
///
/// ```rust
/// use tiered_di::{key_of, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Plugin(&'static str);
/// struct Host { plugins: Vec<Arc<Plugin>> }
///
/// let mut services = ServiceCollection::new();
/// services.add_transient_factory::<Plugin, _>(|_| Plugin("a"));
/// services.add_transient_factory::<Plugin, _>(|_| Plugin("b"));
/// services.add_constructor::<Host, _>(Lifetime::Transient, [key_of::<Plugin>().all()], |args| {
///     Ok(Host { plugins: args.get_all::<Plugin>(0)? })
/// });
///
/// let host = services.build().get_required::<Host>();
/// assert_eq!(host.plugins.iter().map(|p| p.0).collect::<Vec<_>>(), ["a", "b"]);
/// ```
pub struct Args {
    service: &'static str,
    values: Vec<AnyArc>,
}

impl Args {
    pub(crate) fn new(service: &'static str, values: Vec<AnyArc>) -> Self {
        Self { service, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Name of the service being constructed.
    pub fn service(&self) -> &'static str {
        self.service
    }

    fn at(&self, index: usize, wanted: &'static str) -> DiResult<AnyArc> {
        self.values.get(index).cloned().ok_or(DiError::TypeMismatch(wanted))
    }

    /// Parameter `index` as a concrete service.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        downcast_service::<T>(self.at(index, std::any::type_name::<T>())?)
    }

    /// Parameter `index` as a trait object.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        downcast_trait::<T>(self.at(index, std::any::type_name::<T>())?)
    }

    /// Parameter `index` declared as `key_of::<T>().all()`.
    pub fn get_all<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        downcast_list(self.at(index, std::any::type_name::<T>())?)?
            .into_iter()
            .map(downcast_service::<T>)
            .collect()
    }

    /// Parameter `index` declared as `key_of_trait::<T>().all()`.
    pub fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<T>>> {
        downcast_list(self.at(index, std::any::type_name::<T>())?)?
            .into_iter()
            .map(downcast_trait::<T>)
            .collect()
    }
}
