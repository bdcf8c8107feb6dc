use tiered_di::{DiError, Lifetime, Resolver, ServiceCollection};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct RequestId(u32);

fn counting_scoped() -> (ServiceCollection, Arc<AtomicU32>) {
    let counter = Arc::new(AtomicU32::new(0));
    let c = counter.clone();
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<RequestId, _>(move |_| RequestId(c.fetch_add(1, Ordering::SeqCst)));
    (sc, counter)
}

#[test]
fn test_scoped_is_shared_within_a_scope() {
    let (sc, counter) = counting_scoped();
    let sp = sc.build();
    let scope = sp.create_scope();

    let a = scope.get_required::<RequestId>();
    let b = scope.get_required::<RequestId>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sibling_scopes_are_isolated() {
    let (sc, _) = counting_scoped();
    let sp = sc.build();
    let scope1 = sp.create_scope();
    let scope2 = sp.create_scope();

    let a = scope1.get_required::<RequestId>();
    let b = scope2.get_required::<RequestId>();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.0, b.0);
}

#[test]
fn test_nested_scope_is_independent_of_its_parent() {
    let (sc, _) = counting_scoped();
    let sp = sc.build();
    let outer = sp.create_scope();
    let inner = outer.create_scope();

    let a = outer.get_required::<RequestId>();
    let b = inner.get_required::<RequestId>();
    assert!(!Arc::ptr_eq(&a, &b));

    outer.dispose();
    // Disposing the outer scope leaves the inner one usable
    assert!(Arc::ptr_eq(&b, &inner.get_required::<RequestId>()));
}

#[test]
fn test_singleton_shared_between_root_and_scopes() {
    struct B;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<B, _>(|_| B);
    let sp = sc.build();

    let from_root = sp.get_required::<B>();
    let scope = sp.create_scope();
    let from_scope = scope.get_required::<B>();
    let from_grandchild = scope.create_scope().get_required::<B>();

    assert!(Arc::ptr_eq(&from_root, &from_scope));
    assert!(Arc::ptr_eq(&from_root, &from_grandchild));
}

#[test]
fn test_singleton_first_resolved_from_a_scope_outlives_it() {
    struct B;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<B, _>(|_| B);
    let sp = sc.build();

    let scope = sp.create_scope();
    let from_scope = scope.get_required::<B>();
    scope.dispose();
    drop(scope);

    assert!(Arc::ptr_eq(&from_scope, &sp.get_required::<B>()));
}

#[test]
fn test_scoped_factory_resolving_other_scoped_services() {
    struct Connection(u32);
    struct Repository {
        conn: Arc<Connection>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Connection, _>(|_| Connection(5));
    sc.add_scoped_factory::<Repository, _>(|r| Repository {
        conn: r.get_required::<Connection>(),
    });
    let sp = sc.build();
    let scope = sp.create_scope();

    let repo = scope.get_required::<Repository>();
    assert!(Arc::ptr_eq(&repo.conn, &scope.get_required::<Connection>()));
    assert_eq!(repo.conn.0, 5);
}

#[test]
fn test_scoped_resolved_from_root_is_cached_on_root() {
    let (sc, counter) = counting_scoped();
    let sp = sc.build();

    let a = sp.get_required::<RequestId>();
    let b = sp.clone().get_required::<RequestId>();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_disposed_scope_refuses_resolution() {
    let mut sc = ServiceCollection::new();
    sc.add_factory::<u8, _>(Lifetime::Transient, |_| 1);
    let sp = sc.build();
    let scope = sp.create_scope();

    scope.dispose();
    assert!(scope.is_disposed());
    assert!(matches!(scope.get::<u8>(), Err(DiError::ScopeDisposed)));
    // The provider is unaffected
    assert_eq!(*sp.get_required::<u8>(), 1);
}

#[test]
fn test_scope_exposes_its_provider() {
    let sp = ServiceCollection::new().build();
    let scope = sp.create_scope();
    assert!(!scope.provider().is_disposed());
}
