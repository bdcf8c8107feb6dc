//! Ordered registrations layered on the core registration primitives.
//!
//! An ordered set for element `T` is made of three plain registrations:
//!
//! - one descriptor per contribution, under `Key::Indexed(element, i)`, so
//!   contributions never join the element key's own entry chain;
//! - a Singleton container that resolves the slots `0, 1, ...` in order on
//!   first use and keeps the resulting sequence;
//! - a Transient [`Ordered<T>`] that hands out the container's sequence.
//!
//! Nothing here reaches into the provider; everything goes through
//! [`ResolverCore`](crate::ResolverCore).

use std::marker::PhantomData;
use std::sync::Arc;

use crate::collection::ServiceCollection;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::{key_of, key_of_trait, Key};
use crate::lifetime::Lifetime;
use crate::registration::{downcast_service, downcast_trait, AnyArc};
use crate::traits::{Resolver, ResolverCore};

/// The contributions of an ordered set, in the order they were added.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Lifetime, OrderedServiceCollectionExt, Ordered, Resolver, ServiceCollection, ServiceDescriptor};
/// use std::sync::Arc;
///
/// trait Step: Send + Sync { fn name(&self) -> &'static str; }
/// struct Parse;
/// impl Step for Parse { fn name(&self) -> &'static str { "parse" } }
/// struct Emit;
/// impl Step for Emit { fn name(&self) -> &'static str { "emit" } }
///
/// let mut services = ServiceCollection::new();
/// services.add_ordered_trait::<dyn Step>(ServiceDescriptor::trait_factory(Lifetime::Transient, |_| {
///     Arc::new(Parse) as Arc<dyn Step>
/// }));
/// services.add_ordered_trait::<dyn Step>(ServiceDescriptor::trait_instance(Arc::new(Emit) as Arc<dyn Step>));
///
/// let provider = services.build();
/// let steps = provider.get_required::<Ordered<dyn Step>>();
/// assert_eq!(steps.iter().map(|s| s.name()).collect::<Vec<_>>(), ["parse", "emit"]);
///
/// // Ordered contributions stay out of plain collection resolution
/// assert!(provider.get_all_trait::<dyn Step>().unwrap().is_empty());
/// ```
pub struct Ordered<T: ?Sized> {
    items: Arc<[Arc<T>]>,
}

impl<T: ?Sized> Ordered<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<T>> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Arc<T>] {
        &self.items
    }
}

impl<'a, T: ?Sized> IntoIterator for &'a Ordered<T> {
    type Item = &'a Arc<T>;
    type IntoIter = std::slice::Iter<'a, Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: ?Sized> std::fmt::Debug for Ordered<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ordered")
            .field("element", &std::any::type_name::<T>())
            .field("len", &self.items.len())
            .finish()
    }
}

// Resolved once per provider; every Ordered<T> shares its sequence
struct OrderedContainer<T: ?Sized> {
    items: Arc<[Arc<T>]>,
    _element: PhantomData<fn() -> Arc<T>>,
}

/// Ordered registration methods for [`ServiceCollection`].
pub trait OrderedServiceCollectionExt {
    /// Declares an ordered set for `T`, possibly without contributions.
    ///
    /// An ordered set with no contributions resolves to an empty
    /// [`Ordered<T>`]. Declaring the same set again has no effect.
    fn declare_ordered<T: Send + Sync + 'static>(&mut self) -> &mut Self;

    fn declare_ordered_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> &mut Self;

    /// Appends `descriptor` to the ordered set of `T`.
    ///
    /// # Panics
    ///
    /// If `descriptor` is not registered under `key_of::<T>()`.
    fn add_ordered<T: Send + Sync + 'static>(&mut self, descriptor: ServiceDescriptor) -> &mut Self;

    /// Appends `descriptor` to the ordered set of the trait `T`.
    ///
    /// # Panics
    ///
    /// If `descriptor` is not registered under `key_of_trait::<T>()`.
    fn add_ordered_trait<T: ?Sized + Send + Sync + 'static>(&mut self, descriptor: ServiceDescriptor) -> &mut Self;
}

impl OrderedServiceCollectionExt for ServiceCollection {
    fn declare_ordered<T: Send + Sync + 'static>(&mut self) -> &mut Self {
        declare::<T>(self, key_of::<T>(), downcast_service::<T>);
        self
    }

    fn declare_ordered_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> &mut Self {
        declare::<T>(self, key_of_trait::<T>(), downcast_trait::<T>);
        self
    }

    fn add_ordered<T: Send + Sync + 'static>(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        let element = declare::<T>(self, key_of::<T>(), downcast_service::<T>);
        contribute(self, element, descriptor);
        self
    }

    fn add_ordered_trait<T: ?Sized + Send + Sync + 'static>(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        let element = declare::<T>(self, key_of_trait::<T>(), downcast_trait::<T>);
        contribute(self, element, descriptor);
        self
    }
}

/// Registers the container and the wrapper for `element` once.
fn declare<T: ?Sized + Send + Sync + 'static>(services: &mut ServiceCollection, element: Key, extract: fn(AnyArc) -> DiResult<Arc<T>>) -> Key {
    if services.find(&key_of::<OrderedContainer<T>>()).is_some() {
        return element;
    }

    let slots = element.clone();
    services.add(ServiceDescriptor::try_factory(Lifetime::Singleton, move |ctx| {
        let mut items = Vec::new();
        // Slots are dense, so the first missing index ends the set
        while let Some(value) = ctx.resolve_any(&slots.clone().indexed(items.len()))? {
            items.push(extract(value)?);
        }
        Ok(OrderedContainer::<T> {
            items: items.into(),
            _element: PhantomData,
        })
    }));
    services.try_add(ServiceDescriptor::try_factory(Lifetime::Transient, |ctx| {
        let container = ctx.get::<OrderedContainer<T>>()?.ok_or(DiError::MissingDependency {
            service: std::any::type_name::<Ordered<T>>(),
            dependency: std::any::type_name::<OrderedContainer<T>>(),
        })?;
        Ok(Ordered {
            items: container.items.clone(),
        })
    }));
    element
}

fn contribute(services: &mut ServiceCollection, element: Key, descriptor: ServiceDescriptor) {
    assert_eq!(
        descriptor.key(),
        &element,
        "ordered contribution registered under {} added to the ordered set of {}",
        descriptor.key(),
        element
    );
    let next = services
        .descriptors()
        .iter()
        .filter(|d| matches!(d.key(), Key::Indexed(inner, _) if **inner == element))
        .count();
    services.add(descriptor.with_key(element.indexed(next)));
}
