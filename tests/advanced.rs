use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tether_ioc::{
  construct, construct_multi, literal, try_construct, try_construct_multi, ConstructError,
  Container, Error,
};

// --- Advanced Test Fixtures ---

struct A;
struct B;
struct C;
struct D;

trait Beverage: Send + Sync {
  fn name(&self) -> &'static str;
}

struct Tea;
impl Beverage for Tea {
  fn name(&self) -> &'static str {
    "tea"
  }
}

struct Coffee;
impl Beverage for Coffee {
  fn name(&self) -> &'static str {
    "coffee"
  }
}

// --- Cycle Detection ---

#[test]
fn test_cycle_registration_rejected() {
  // f consumes D and produces A; g consumes A and produces (B, C);
  // h consumes C and produces D. Together they close A -> C -> D -> A.
  let container = Container::new();
  container.register(construct(|_d: Arc<D>| A)).unwrap();
  container
    .register(construct_multi(|_a: Arc<A>| (B, C)))
    .unwrap();

  // Act: the registration that closes the loop must be rejected.
  let closing = container.register(construct(|_c: Arc<C>| D));

  // Assert
  let err = closing.err().unwrap();
  assert!(matches!(err, Error::CycleDependency(_)));
  let rendered = format!("{err}");
  assert!(rendered.contains("cycle dependency error."));
  assert!(rendered.contains("advanced::D"));
  assert!(rendered.contains("advanced::C"));
}

#[test]
fn test_cycle_free_subset_registers() {
  // The same constructors register fine while no closed loop exists yet.
  let container = Container::new();
  container.register(construct(|_d: Arc<D>| A)).unwrap();
  container.register(construct(|_c: Arc<C>| D)).unwrap();
}

// --- Multi-Output Constructors ---

#[test]
fn test_multi_output_single_invocation_commits_all() {
  static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

  struct Left(u32);
  struct Right(u32);

  // Arrange
  let container = Container::new();
  container
    .register(construct_multi(|| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      (Left(1), Right(2))
    }))
    .unwrap();

  // Act
  let left = container.resolve::<Left>(None).unwrap();
  let right = container.resolve::<Right>(None).unwrap();

  // Assert: resolving the first output committed the second one too.
  assert_eq!(left.0, 1);
  assert_eq!(right.0, 2);
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_multi_output_error_fails_every_output() {
  static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

  struct Lhs;
  struct Rhs;

  // Arrange
  let container = Container::new();
  container
    .register(try_construct_multi(|| -> Result<(Lhs, Rhs), ConstructError> {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Err("exploded".into())
    }))
    .unwrap();

  // Act
  let lhs = container.resolve::<Lhs>(None);
  let rhs = container.resolve::<Rhs>(None);

  // Assert: both resolves fail with the constructor's own error, and the
  // failure was never cached.
  assert_eq!(format!("{}", lhs.err().unwrap()), "exploded");
  assert_eq!(format!("{}", rhs.err().unwrap()), "exploded");
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_constructor_error_propagates_to_consumers() {
  struct Flaky;
  struct Consumer;

  // Arrange
  let container = Container::new();
  container
    .register(try_construct(|| -> Result<Flaky, ConstructError> {
      Err("boom".into())
    }))
    .unwrap();
  container
    .register(construct(|_flaky: Arc<Flaky>| Consumer))
    .unwrap();

  // Act
  let consumer = container.resolve::<Consumer>(None);

  // Assert: the transitive consumer fails with the dependency's error.
  let err = consumer.err().unwrap();
  assert!(matches!(err, Error::Construct(_)));
  assert_eq!(format!("{err}"), "boom");
}

// --- Decoration ---

#[test]
fn test_decoration_persists_regardless_of_cache_policy() {
  static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

  struct Greeting(String);

  // Arrange: caching off, so ordinarily every resolve constructs anew.
  let container = Container::with_cache(false);
  container
    .register(construct(|| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Greeting("hello".to_string())
    }))
    .unwrap();
  let fresh1 = container.resolve::<Greeting>(None).unwrap();
  let fresh2 = container.resolve::<Greeting>(None).unwrap();
  assert!(!Arc::ptr_eq(&fresh1, &fresh2));
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 2);

  // Act
  container
    .decorate::<Greeting, _>(None, |g| Ok(Arc::new(Greeting(format!("{}!", g.0)))))
    .unwrap();

  // Assert: the decorated value is pinned; the constructor is not re-invoked.
  let decorated1 = container.resolve::<Greeting>(None).unwrap();
  let decorated2 = container.resolve::<Greeting>(None).unwrap();
  assert_eq!(decorated1.0, "hello!");
  assert!(Arc::ptr_eq(&decorated1, &decorated2));
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 3);
}

#[test]
fn test_decoration_transform_failure_leaves_binding_untouched() {
  struct Greeting(String);

  // Arrange
  let container = Container::new();
  container
    .register(construct(|| Greeting("hello".to_string())))
    .unwrap();

  // Act
  let failed = container.decorate::<Greeting, _>(None, |_g| Err("no thanks".into()));

  // Assert
  assert_eq!(format!("{}", failed.err().unwrap()), "no thanks");
  assert_eq!(container.resolve::<Greeting>(None).unwrap().0, "hello");
}

#[test]
fn test_decorate_missing_binding_fails() {
  struct Unbound;

  let container = Container::new();
  let missing = container.decorate::<Unbound, _>(None, Ok);
  assert!(matches!(missing, Err(Error::NotFoundRegister(_))));
}

// --- Validation ---

#[test]
fn test_validate_reports_missing_binding() {
  static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

  struct Root;
  struct Mid;
  struct Missing;
  struct Leaf;

  // Arrange: three constructors, one dependency nobody registered.
  let container = Container::new();
  container
    .register(construct(|| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Root
    }))
    .unwrap();
  container
    .register(construct(|_root: Arc<Root>| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Mid
    }))
    .unwrap();
  container
    .register(construct(|_missing: Arc<Missing>| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Leaf
    }))
    .unwrap();

  // Act
  let report = container.validate();

  // Assert: the aggregate names the missing binding, and the dry run never
  // executed a constructor body.
  let err = report.err().unwrap();
  assert!(matches!(err, Error::Validation(_)));
  assert!(format!("{err}").contains("Missing"));
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 0);
}

#[test]
fn test_validate_success_without_constructing() {
  static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

  struct Root;
  struct Mid;
  struct Leaf;

  // Arrange: a fully satisfiable graph, literals included.
  let container = Container::new();
  container.register(literal(42u64, Some("answer"))).unwrap();
  container
    .register(construct(|| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Root
    }))
    .unwrap();
  container
    .register(construct(|_root: Arc<Root>| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Mid
    }))
    .unwrap();
  container
    .register(construct(|_mid: Arc<Mid>| {
      INVOCATIONS.fetch_add(1, Ordering::SeqCst);
      Leaf
    }))
    .unwrap();

  // Act & Assert
  container.validate().unwrap();
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 0);

  // The dry run left no cached placeholders behind.
  let leaf1 = container.resolve::<Leaf>(None).unwrap();
  let leaf2 = container.resolve::<Leaf>(None).unwrap();
  assert!(Arc::ptr_eq(&leaf1, &leaf2));
  assert_eq!(INVOCATIONS.load(Ordering::SeqCst), 3);
}

// --- Trait Exposure ---

#[test]
fn test_trait_exposure_resolution() {
  // Arrange
  let container = Container::new();
  container
    .register(construct(|| Tea).implements(|tea: Arc<Tea>| tea as Arc<dyn Beverage>))
    .unwrap();

  // Act
  let beverage = container.resolve::<dyn Beverage>(None).unwrap();

  // Assert
  assert_eq!(beverage.name(), "tea");
  let again = container.resolve::<dyn Beverage>(None).unwrap();
  assert!(Arc::ptr_eq(&beverage, &again));

  // The binding was rewritten to the trait; the concrete key does not exist.
  let concrete = container.resolve::<Tea>(None);
  assert!(matches!(concrete, Err(Error::NotFoundRegister(_))));
}

#[test]
fn test_trait_exposure_wrong_concrete_fails() {
  // The coercion expects Coffee, but the constructor's first output is Tea.
  let container = Container::new();
  let mismatch = container.register(
    construct(|| Tea).implements(|coffee: Arc<Coffee>| coffee as Arc<dyn Beverage>),
  );
  assert!(matches!(mismatch, Err(Error::NotImplements { .. })));
}

// --- Extraction ---

#[test]
fn test_extract_invokes_with_resolved_arguments() {
  struct Host(String);
  struct Port(u16);

  // Arrange
  let container = Container::new();
  container
    .register(construct(|| Host("localhost".to_string())))
    .unwrap();
  container.register(construct(|| Port(5432))).unwrap();

  // Act
  let seen = Arc::new(AtomicUsize::new(0));
  let seen_in_closure = seen.clone();
  container
    .extract(move |host: Arc<Host>, port: Arc<Port>| {
      assert_eq!(host.0, "localhost");
      assert_eq!(port.0, 5432);
      seen_in_closure.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

  // Assert
  assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_extract_aborts_on_missing_dependency() {
  struct Host(String);
  struct Absent;

  // Arrange
  let container = Container::new();
  container
    .register(construct(|| Host("localhost".to_string())))
    .unwrap();

  // Act
  let invoked = Arc::new(AtomicUsize::new(0));
  let invoked_in_closure = invoked.clone();
  let aborted = container.extract(move |_host: Arc<Host>, _absent: Arc<Absent>| {
    invoked_in_closure.fetch_add(1, Ordering::SeqCst);
  });

  // Assert: resolution failed before the closure ran.
  assert!(matches!(aborted, Err(Error::NotFoundRegister(_))));
  assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

// --- Ambient Container ---

#[test]
fn test_global_container_is_isolated() {
  struct GlobalOnly(u32);
  struct LocalOnly(u32);

  // Arrange
  tether_ioc::global()
    .register(literal(GlobalOnly(5), Some("iso")))
    .unwrap();
  let local = Container::new();
  local.register(literal(LocalOnly(9), Some("iso"))).unwrap();

  // Act & Assert
  assert_eq!(
    tether_ioc::global()
      .resolve::<GlobalOnly>(Some("iso"))
      .unwrap()
      .0,
    5
  );
  assert!(local.resolve::<GlobalOnly>(Some("iso")).is_err());
  assert!(tether_ioc::global()
    .resolve::<LocalOnly>(Some("iso"))
    .is_err());
  assert_eq!(local.resolve::<LocalOnly>(Some("iso")).unwrap().0, 9);
}
