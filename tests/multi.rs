use tiered_di::{key_of, key_of_trait, Lifetime, Resolver, ResolverCore, ServiceCollection};
use std::sync::Arc;

trait Handler: Send + Sync {
    fn name(&self) -> &'static str;
}

struct C1;
impl Handler for C1 {
    fn name(&self) -> &'static str {
        "c1"
    }
}

struct C2;
impl Handler for C2 {
    fn name(&self) -> &'static str {
        "c2"
    }
}

fn names(handlers: &[Arc<dyn Handler>]) -> Vec<&'static str> {
    handlers.iter().map(|h| h.name()).collect()
}

#[test]
fn test_resolve_all_preserves_registration_order() {
    let mut sc = ServiceCollection::new();
    sc.add_transient_trait_factory::<dyn Handler, _>(|_| Arc::new(C1));
    sc.add_transient_trait_factory::<dyn Handler, _>(|_| Arc::new(C2));
    let sp = sc.build();

    assert_eq!(names(&sp.get_all_trait::<dyn Handler>().unwrap()), ["c1", "c2"]);

    let mut reversed = ServiceCollection::new();
    reversed.add_transient_trait_factory::<dyn Handler, _>(|_| Arc::new(C2));
    reversed.add_transient_trait_factory::<dyn Handler, _>(|_| Arc::new(C1));
    let sp = reversed.build();

    assert_eq!(names(&sp.get_all_trait::<dyn Handler>().unwrap()), ["c2", "c1"]);
    // Single-value resolution takes the last one
    assert_eq!(sp.get_required_trait::<dyn Handler>().name(), "c1");
}

#[test]
fn test_resolve_all_of_unregistered_key_is_empty() {
    struct F;

    let sp = ServiceCollection::new().build();
    assert!(sp.get_all::<F>().unwrap().is_empty());
    assert!(sp.get_all_trait::<dyn Handler>().unwrap().is_empty());
    assert!(sp.resolve_all(&key_of::<F>()).unwrap().is_empty());
}

#[test]
fn test_each_registration_has_its_own_cache_slot() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait_factory::<dyn Handler, _>(|_| Arc::new(C1));
    sc.add_singleton_trait_factory::<dyn Handler, _>(|_| Arc::new(C2));
    let sp = sc.build();

    let first = sp.get_all_trait::<dyn Handler>().unwrap();
    let second = sp.create_scope().get_all_trait::<dyn Handler>().unwrap();
    assert_eq!(names(&first), ["c1", "c2"]);
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    assert!(Arc::ptr_eq(&first[1], &second[1]));
    assert!(!Arc::ptr_eq(&first[0], &first[1]));

    // The single-value accessor shares the last registration's instance
    assert!(Arc::ptr_eq(&first[1], &sp.get_required_trait::<dyn Handler>()));
}

#[test]
fn test_mixed_lifetimes_within_one_collection() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<String, _>(|_| "scoped".to_string());
    sc.add_transient_factory::<String, _>(|_| "transient".to_string());
    let sp = sc.build();
    let scope = sp.create_scope();

    let a = scope.get_all::<String>().unwrap();
    let b = scope.get_all::<String>().unwrap();
    assert_eq!(a.iter().map(|s| s.as_str()).collect::<Vec<_>>(), ["scoped", "transient"]);
    assert!(Arc::ptr_eq(&a[0], &b[0]));
    assert!(!Arc::ptr_eq(&a[1], &b[1]));
}

#[test]
fn test_collection_as_constructor_parameter() {
    struct Pipeline {
        handlers: Vec<Arc<dyn Handler>>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_trait_factory::<dyn Handler, _>(Lifetime::Singleton, |_| Arc::new(C2));
    sc.add_trait_factory::<dyn Handler, _>(Lifetime::Transient, |_| Arc::new(C1));
    sc.add_constructor::<Pipeline, _>(Lifetime::Transient, [key_of_trait::<dyn Handler>().all()], |args| {
        Ok(Pipeline {
            handlers: args.get_all_trait::<dyn Handler>(0)?,
        })
    });
    let sp = sc.build();

    assert_eq!(names(&sp.get_required::<Pipeline>().handlers), ["c2", "c1"]);
}

#[test]
fn test_empty_collection_as_constructor_parameter() {
    struct Empty {
        handlers: Vec<Arc<dyn Handler>>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_constructor::<Empty, _>(Lifetime::Transient, [key_of_trait::<dyn Handler>().all()], |args| {
        Ok(Empty {
            handlers: args.get_all_trait::<dyn Handler>(0)?,
        })
    });

    assert!(sc.build().get_required::<Empty>().handlers.is_empty());
}
