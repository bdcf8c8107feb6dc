//! Service collection: the registration builder.
//!
//! A collection is an ordered list of descriptors. Building it freezes the
//! registrations into a provider; nothing can be registered afterwards.

use std::sync::Arc;

use crate::config::ProviderOptions;
use crate::descriptors::{Args, ServiceDescriptor};
use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::ServiceTable;
use crate::traits::Dispose;

pub mod ordered;
pub use ordered::{Ordered, OrderedServiceCollectionExt};

#[derive(Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor.
    ///
    /// Registering a key again does not replace the earlier registration: the
    /// newest one wins single-value resolution and all of them take part in
    /// collection resolution, in registration order.
    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Appends a descriptor unless its key is already registered.
    ///
    /// Returns whether the descriptor was added.
    pub fn try_add(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.find(descriptor.key()).is_some() {
            return false;
        }
        self.descriptors.push(descriptor);
        true
    }

    // ----- Concrete Type Registrations -----

    /// Registers a pre-built singleton value.
    ///
    /// The container hands out the value but never disposes it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tiered_di::ServiceCollection;
    /// struct Config {
    ///     database_url: String
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config {
    ///     database_url: "postgres://localhost".to_string()
    /// });
    /// ```
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add(ServiceDescriptor::instance(value))
    }

    /// Registers a singleton factory called once per provider, on first request.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(Lifetime::Singleton, factory))
    }

    /// Registers a scoped factory called once per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(Lifetime::Scoped, factory))
    }

    /// Registers a transient factory called on every request.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tiered_di::{ServiceCollection, Resolver};
    /// # use std::sync::Arc;
    /// struct Request { id: u32 }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_transient_factory::<Request, _>(|_| Request { id: 1 });
    ///
    /// let provider = services.build();
    /// let a = provider.get_required::<Request>();
    /// let b = provider.get_required::<Request>();
    /// assert!(!Arc::ptr_eq(&a, &b));
    /// ```
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(Lifetime::Transient, factory))
    }

    pub fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory(lifetime, factory))
    }

    /// Registers a fallible factory; its errors reach the caller unchanged.
    pub fn add_try_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::try_factory(lifetime, factory))
    }

    /// Registers an implementation with explicit constructor parameters.
    pub fn add_constructor<T, F>(&mut self, lifetime: Lifetime, params: impl IntoIterator<Item = Key>, ctor: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Args) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::constructor(lifetime, params, ctor))
    }

    // ----- Trait Registrations -----

    /// Registers a pre-built trait-object singleton.
    pub fn add_singleton_trait<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::trait_instance(value))
    }

    pub fn add_singleton_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::trait_factory(Lifetime::Singleton, factory))
    }

    pub fn add_scoped_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::trait_factory(Lifetime::Scoped, factory))
    }

    pub fn add_transient_trait_factory<Trait, F>(&mut self, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::trait_factory(Lifetime::Transient, factory))
    }

    /// Registers a trait-object factory with an explicit lifetime.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use tiered_di::{Lifetime, Resolver, ServiceCollection};
    /// # use std::sync::Arc;
    /// trait Greeter: Send + Sync { fn hello(&self) -> &'static str; }
    /// struct English;
    /// impl Greeter for English { fn hello(&self) -> &'static str { "hello" } }
    /// struct French;
    /// impl Greeter for French { fn hello(&self) -> &'static str { "bonjour" } }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_trait_factory::<dyn Greeter, _>(Lifetime::Singleton, |_| Arc::new(English));
    /// services.add_trait_factory::<dyn Greeter, _>(Lifetime::Singleton, |_| Arc::new(French));
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required_trait::<dyn Greeter>().hello(), "bonjour");
    /// let all: Vec<_> = provider.get_all_trait::<dyn Greeter>().unwrap().iter().map(|g| g.hello()).collect();
    /// assert_eq!(all, ["hello", "bonjour"]);
    /// ```
    pub fn add_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::trait_factory(lifetime, factory))
    }

    // ----- Disposable Registrations -----

    /// Registers a factory whose products are disposed with their owning scope.
    pub fn add_disposable_factory<T, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&ResolverContext<'_>) -> T + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::disposable_factory(lifetime, factory))
    }

    pub fn add_disposable_constructor<T, F>(&mut self, lifetime: Lifetime, params: impl IntoIterator<Item = Key>, ctor: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(&Args) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::disposable_constructor(lifetime, params, ctor))
    }

    pub fn add_disposable_trait_factory<Trait, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        Trait: ?Sized + Dispose,
        F: Fn(&ResolverContext<'_>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::disposable_trait_factory(lifetime, factory))
    }

    // ----- Inspection -----

    /// Registered descriptors, in registration order.
    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// The first descriptor registered under `key`.
    pub fn find(&self, key: &Key) -> Option<&ServiceDescriptor> {
        self.descriptors.iter().find(|d| d.key() == key)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // ----- Build -----

    /// Builds a provider with default options.
    pub fn build(self) -> ServiceProvider {
        self.build_with(ProviderOptions::default())
    }

    /// Builds a provider with the given options.
    pub fn build_with(self, options: ProviderOptions) -> ServiceProvider {
        ServiceProvider::new(ServiceTable::from_descriptors(self.descriptors), options)
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.descriptors).finish()
    }
}
