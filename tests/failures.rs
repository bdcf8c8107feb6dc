use tiered_di::{key_of, DiError, Lifetime, Resolver, ServiceCollection};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct ConnectError(&'static str);

impl std::fmt::Display for ConnectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot connect to {}", self.0)
    }
}

impl std::error::Error for ConnectError {}

struct Db;

#[test]
fn test_user_errors_reach_the_caller_unchanged() {
    let mut sc = ServiceCollection::new();
    sc.add_try_factory::<Db, _>(Lifetime::Singleton, |_| {
        Err(DiError::construction(std::any::type_name::<Db>(), ConnectError("db:5432")))
    });
    let sp = sc.build();

    let err = sp.get::<Db>().err().expect("construction failure");
    let source = err.construction_error().expect("source kept");
    let original = source.downcast_ref::<ConnectError>().expect("same error type");
    assert_eq!(original.0, "db:5432");
    assert!(err.to_string().contains("cannot connect to db:5432"));
}

#[test]
fn test_failed_singleton_is_retried_not_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = attempts.clone();

    let mut sc = ServiceCollection::new();
    sc.add_try_factory::<Db, _>(Lifetime::Singleton, move |_| {
        if a.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DiError::construction("Db", ConnectError("first")))
        } else {
            Ok(Db)
        }
    });
    let sp = sc.build();

    assert!(sp.get::<Db>().is_err());
    let db = sp.get_required::<Db>();
    assert!(Arc::ptr_eq(&db, &sp.get_required::<Db>()));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_failing_dependency_fails_the_dependent() {
    struct Repo;

    let mut sc = ServiceCollection::new();
    sc.add_try_factory::<Db, _>(Lifetime::Scoped, |_| Err(DiError::construction("Db", ConnectError("x"))));
    sc.add_constructor::<Repo, _>(Lifetime::Scoped, [key_of::<Db>()], |_| Ok(Repo));
    let sp = sc.build();
    let scope = sp.create_scope();

    assert!(matches!(scope.get::<Repo>(), Err(DiError::Construction { .. })));
}

#[test]
fn test_panics_propagate_and_leave_the_scope_usable() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = attempts.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Db, _>(move |_| {
        if a.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("constructor blew up");
        }
        Db
    });
    let sp = sc.build();
    let scope = sp.create_scope();

    let caught = panic::catch_unwind(AssertUnwindSafe(|| scope.get::<Db>()));
    assert!(caught.is_err());

    // No half-built instance was stored and the lock was released
    let db = scope.get_required::<Db>();
    assert!(Arc::ptr_eq(&db, &scope.get_required::<Db>()));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_type_mismatch_when_a_descriptor_is_rekeyed_wrongly() {
    let mut sc = ServiceCollection::new();
    sc.add(tiered_di::ServiceDescriptor::instance(1u8).with_key(key_of::<u16>()));
    let sp = sc.build();

    assert!(matches!(sp.get::<u16>(), Err(DiError::TypeMismatch(_))));
}
