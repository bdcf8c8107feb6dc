use tiered_di::{key_of, Lifetime, Resolver, ServiceCollection, ServiceDescriptor};
use std::sync::{Arc, Mutex};

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get_required::<usize>();
    let num2 = sp.get_required::<usize>();
    let str1 = sp.get_required::<String>();
    let str2 = sp.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2)); // Same instance
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_factory_with_dependencies() {
    struct Config {
        port: u16,
    }

    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 });
    sc.add_singleton_factory::<Server, _>(|r| Server {
        config: r.get_required::<Config>(),
        name: "MyServer".to_string(),
    });

    let sp = sc.build();
    let server = sp.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(Mutex::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _>(move |_| {
        let mut c = counter_clone.lock().unwrap();
        *c += 1;
        format!("instance-{}", *c)
    });

    let sp = sc.build();

    let a = sp.get_required::<String>();
    let b = sp.get_required::<String>();
    let c = sp.get_required::<String>();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&b, &c));
}

#[test]
fn test_transient_without_dependencies_is_distinct_every_time() {
    struct A;

    let mut sc = ServiceCollection::new();
    sc.add_constructor::<A, _>(Lifetime::Transient, [], |_| Ok(A));
    let sp = sc.build();

    let first = sp.get_required::<A>();
    let second = sp.get_required::<A>();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_constructor_parameters_in_declared_order() {
    struct Host {
        port: Arc<u16>,
        name: Arc<String>,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(8080u16);
    sc.add_singleton("api".to_string());
    sc.add_constructor::<Host, _>(
        Lifetime::Singleton,
        [key_of::<u16>(), key_of::<String>()],
        |args| {
            assert_eq!(args.len(), 2);
            Ok(Host {
                port: args.get::<u16>(0)?,
                name: args.get::<String>(1)?,
            })
        },
    );

    let host = sc.build().get_required::<Host>();
    assert_eq!(*host.port, 8080);
    assert_eq!(host.name.as_str(), "api");
}

#[test]
fn test_last_registration_wins() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u32);
    sc.add_transient_factory::<u32, _>(|_| 2);

    let sp = sc.build();
    assert_eq!(*sp.get_required::<u32>(), 2);
}

#[test]
fn test_unregistered_is_absent_not_an_error() {
    struct Missing;

    let sp = ServiceCollection::new().build();
    assert!(sp.get::<Missing>().unwrap().is_none());
    assert!(sp.get_trait::<dyn Fn() + Send + Sync>().unwrap().is_none());
}

#[test]
#[should_panic(expected = "No registration for")]
fn test_get_required_panics_when_absent() {
    let sp = ServiceCollection::new().build();
    sp.get_required::<u8>();
}

#[test]
fn test_trait_resolution() {
    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Formal(Arc<String>);
    impl Greeter for Formal {
        fn greet(&self) -> String {
            format!("Good day, {}", self.0)
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton("Ada".to_string());
    sc.add(ServiceDescriptor::trait_constructor::<dyn Greeter, _>(
        Lifetime::Scoped,
        [key_of::<String>()],
        |args| Ok(Arc::new(Formal(args.get::<String>(0)?)) as Arc<dyn Greeter>),
    ));

    let sp = sc.build();
    let scope = sp.create_scope();
    let a = scope.get_required_trait::<dyn Greeter>();
    let b = scope.get_required_trait::<dyn Greeter>();
    assert_eq!(a.greet(), "Good day, Ada");
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_instances_are_handed_out_as_registered() {
    let shared = Arc::new(vec![1, 2, 3]);

    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<Vec<i32>>(shared.clone());
    let sp = sc.build();

    let resolved = sp.get_required_trait::<Vec<i32>>();
    assert!(Arc::ptr_eq(&shared, &resolved));
}
