use tiered_di::{key_of, DiError, Lifetime, Resolver, ServiceCollection};
use std::sync::Arc;

struct D;
struct E;

fn name<T>() -> &'static str {
    std::any::type_name::<T>()
}

#[test]
fn test_constructor_cycle_is_reported_with_its_path() {
    let mut sc = ServiceCollection::new();
    sc.add_constructor::<D, _>(Lifetime::Transient, [key_of::<E>()], |_| Ok(D));
    sc.add_constructor::<E, _>(Lifetime::Transient, [key_of::<D>()], |_| Ok(E));
    let sp = sc.build();

    match sp.get::<D>() {
        Err(DiError::Circular(path)) => assert_eq!(path, [name::<D>(), name::<E>()]),
        other => panic!("expected a circular dependency, got {:?}", other.map(|v| v.is_some())),
    }
}

#[test]
fn test_constructor_cycle_is_found_before_any_construction() {
    use std::sync::atomic::{AtomicBool, Ordering};
    static CONSTRUCTED: AtomicBool = AtomicBool::new(false);

    let mut sc = ServiceCollection::new();
    sc.add_constructor::<D, _>(Lifetime::Singleton, [key_of::<E>()], |_| {
        CONSTRUCTED.store(true, Ordering::SeqCst);
        Ok(D)
    });
    sc.add_constructor::<E, _>(Lifetime::Scoped, [key_of::<D>()], |_| {
        CONSTRUCTED.store(true, Ordering::SeqCst);
        Ok(E)
    });
    let sp = sc.build();

    assert!(sp.create_scope().get::<E>().is_err());
    assert!(!CONSTRUCTED.load(Ordering::SeqCst));
}

#[test]
fn test_factory_cycle_is_reported() {
    let mut sc = ServiceCollection::new();
    sc.add_try_factory::<D, _>(Lifetime::Singleton, |r| {
        r.get::<E>()?;
        Ok(D)
    });
    sc.add_try_factory::<E, _>(Lifetime::Transient, |r| {
        r.get::<D>()?;
        Ok(E)
    });
    let sp = sc.build();

    let err = sp.get::<E>().err().expect("cycle");
    assert_eq!(err.cycle().unwrap(), &[name::<E>(), name::<D>()]);
    assert!(err.to_string().contains("->"));
}

#[test]
fn test_self_dependency() {
    let mut sc = ServiceCollection::new();
    sc.add_try_factory::<D, _>(Lifetime::Scoped, |r| {
        r.get::<D>()?;
        Ok(D)
    });
    let sp = sc.build();
    let scope = sp.create_scope();

    let err = scope.get::<D>().err().expect("cycle");
    assert_eq!(err.cycle().unwrap(), &[name::<D>()]);
}

#[test]
fn test_diamond_is_not_a_cycle() {
    struct Top(Arc<Left>, Arc<Right>);
    struct Left(Arc<Bottom>);
    struct Right(Arc<Bottom>);
    struct Bottom;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Bottom, _>(|_| Bottom);
    sc.add_constructor::<Left, _>(Lifetime::Transient, [key_of::<Bottom>()], |a| Ok(Left(a.get(0)?)));
    sc.add_transient_factory::<Right, _>(|r| Right(r.get_required::<Bottom>()));
    sc.add_constructor::<Top, _>(Lifetime::Transient, [key_of::<Left>(), key_of::<Right>()], |a| {
        Ok(Top(a.get(0)?, a.get(1)?))
    });
    let sp = sc.build();

    let top = sp.get_required::<Top>();
    assert!(Arc::ptr_eq(&top.0 .0, &top.1 .0));
}

#[test]
fn test_cycle_error_is_not_cached_as_success() {
    let mut sc = ServiceCollection::new();
    sc.add_constructor::<D, _>(Lifetime::Transient, [key_of::<E>()], |_| Ok(D));
    sc.add_constructor::<E, _>(Lifetime::Transient, [key_of::<D>()], |_| Ok(E));
    let sp = sc.build();

    for _ in 0..3 {
        assert!(matches!(sp.get::<D>(), Err(DiError::Circular(_))));
    }
}

#[test]
fn test_missing_constructor_dependency() {
    let mut sc = ServiceCollection::new();
    sc.add_constructor::<D, _>(Lifetime::Transient, [key_of::<E>()], |_| Ok(D));
    let sp = sc.build();

    match sp.get::<D>() {
        Err(DiError::MissingDependency { service, dependency }) => {
            assert_eq!(service, name::<D>());
            assert_eq!(dependency, name::<E>());
        }
        _ => panic!("expected MissingDependency"),
    }
}

#[test]
fn test_unbounded_factory_recursion_hits_the_depth_limit() {
    use tiered_di::Key;

    // Each level asks for the next indexed slot, so no key repeats
    fn register(sc: &mut ServiceCollection, depth: usize) {
        for i in 0..depth {
            let next = key_of::<u64>().indexed(i + 1);
            sc.add(
                tiered_di::ServiceDescriptor::try_factory(Lifetime::Transient, move |r| {
                    let _ = tiered_di::ResolverCore::resolve_any(r, &next)?;
                    Ok(0u64)
                })
                .with_key(key_of::<u64>().indexed(i)),
            );
        }
    }

    let mut sc = ServiceCollection::new();
    register(&mut sc, 1100);
    let sp = sc.build();

    let first: Key = key_of::<u64>().indexed(0);
    let result = std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(move || tiered_di::ResolverCore::resolve_any(&sp, &first).map(|v| v.is_some()))
        .unwrap()
        .join()
        .unwrap();
    assert!(matches!(result, Err(DiError::DepthExceeded(_))));
}
