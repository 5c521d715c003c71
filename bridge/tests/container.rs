use fibre_bridge::{
  bind, translate, BoxError, Capability, ConstructionRecipe, ContainerBuilder, Dependencies,
  Dependency, Error, Injectable, Scope,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

/// Records constructor calls. Bound as an instance so every constructor can
/// report to it.
#[derive(Default)]
struct EventLog(Mutex<Vec<&'static str>>);

impl EventLog {
  fn record(&self, event: &'static str) {
    self.0.lock().unwrap().push(event);
  }

  fn events(&self) -> Vec<&'static str> {
    self.0.lock().unwrap().clone()
  }
}

struct C;
struct B {
  _c: Arc<C>,
}
struct A {
  _b: Arc<B>,
}

impl Injectable for C {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<EventLog>()]
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
    deps.get::<EventLog>()?.record("C");
    Ok(C)
  }
}

impl Injectable for B {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<EventLog>(), Dependency::on::<C>()]
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
    let c = deps.get::<C>()?;
    deps.get::<EventLog>()?.record("B");
    Ok(B { _c: c })
  }
}

impl Injectable for A {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<EventLog>(), Dependency::on::<B>()]
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
    let b = deps.get::<B>()?;
    deps.get::<EventLog>()?.record("A");
    Ok(A { _b: b })
  }
}

struct Ping;
struct Pong;

impl Injectable for Ping {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<EventLog>(), Dependency::on::<Pong>()]
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
    deps.get::<EventLog>()?.record("Ping");
    Ok(Ping)
  }
}

impl Injectable for Pong {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<EventLog>(), Dependency::on::<Ping>()]
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
    deps.get::<EventLog>()?.record("Pong");
    Ok(Pong)
  }
}

fn chain(log: &Arc<EventLog>) -> Vec<fibre_bridge::BindingDeclaration> {
  // Declared top-down on purpose; construction must still go bottom-up.
  vec![
    bind::<EventLog>().to_instance(Arc::clone(log)),
    bind::<A>().to_self().as_singleton(),
    bind::<B>().to_self().as_singleton(),
    bind::<C>().to_self().as_singleton(),
  ]
}

// --- Tests ---

#[test]
fn eager_construction_follows_dependency_order() {
  // Arrange
  let log = Arc::new(EventLog::default());
  let recipes = translate(chain(&log)).unwrap();

  // Act
  let container = ContainerBuilder::new().add_recipes(recipes).build().unwrap();

  // Assert: everything was constructed during build, once, leaves first.
  assert_eq!(log.events(), vec!["C", "B", "A"]);

  container.resolve::<A>().unwrap();
  container.resolve::<A>().unwrap();
  assert_eq!(log.events(), vec!["C", "B", "A"]);
}

#[test]
fn singleton_is_shared_with_its_dependents() {
  let log = Arc::new(EventLog::default());
  let container = ContainerBuilder::new()
    .add_recipes(translate(chain(&log)).unwrap())
    .build()
    .unwrap();

  let b = container.resolve::<B>().unwrap();
  let a = container.resolve::<A>().unwrap();
  assert!(Arc::ptr_eq(&a._b, &b));
}

#[test]
fn cycle_fails_before_any_constructor_runs() {
  // Arrange
  let log = Arc::new(EventLog::default());
  let recipes = translate(vec![
    bind::<EventLog>().to_instance(Arc::clone(&log)),
    bind::<Ping>().to_self().as_singleton(),
    bind::<Pong>().to_self().as_singleton(),
  ])
  .unwrap();

  // Act
  let err = ContainerBuilder::new().add_recipes(recipes).build().unwrap_err();

  // Assert
  match &err {
    Error::CyclicDependency { cycle } => {
      assert_eq!(
        cycle,
        &vec![
          Capability::of::<Ping>(),
          Capability::of::<Pong>(),
          Capability::of::<Ping>(),
        ]
      );
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(err.to_string().contains(" -> "));
  assert!(log.events().is_empty());
}

#[test]
fn per_request_cycle_is_detected_too() {
  let log = Arc::new(EventLog::default());
  let recipes = translate(vec![
    bind::<EventLog>().to_instance(Arc::clone(&log)),
    bind::<Ping>().to_self(),
    bind::<Pong>().to_self(),
  ])
  .unwrap();

  let err = ContainerBuilder::new().add_recipes(recipes).build().unwrap_err();
  assert!(matches!(err, Error::CyclicDependency { .. }));
}

#[test]
fn second_build_fails_without_running_constructors() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let mut builder = ContainerBuilder::new();
  builder.add_recipes(
    translate(vec![bind::<String>()
      .to_provider_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new("value".to_string()))
      })
      .as_singleton()])
    .unwrap(),
  );

  // Act
  builder.build().unwrap();
  let second = builder.build();

  // Assert
  assert!(matches!(second, Err(Error::AlreadyBuilt)));
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  assert!(builder.is_built());
}

#[test]
fn failing_factory_aborts_the_build() {
  // Arrange
  let log = Arc::new(EventLog::default());
  let mut declarations = chain(&log);
  declarations.push(
    bind::<u64>()
      .to_provider_fn(|| Err("connection refused".into()))
      .as_singleton(),
  );

  // Act
  let err = ContainerBuilder::new()
    .add_recipes(translate(declarations).unwrap())
    .build()
    .unwrap_err();

  // Assert
  match err {
    Error::ConstructionFailed { capability, source } => {
      assert_eq!(capability, Capability::of::<u64>());
      assert_eq!(source.to_string(), "connection refused");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn per_request_recipes_are_not_invoked_at_build() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let recipe = ConstructionRecipe::new(
    Capability::of::<String>(),
    Scope::PerRequest,
    Vec::new(),
    move |_: &Dependencies<'_>| -> Result<Arc<String>, BoxError> {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(Arc::new("fresh".to_string()))
    },
  );

  // Act
  let container = ContainerBuilder::new().add_recipe(recipe).build().unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 0);

  let first = container.resolve::<String>().unwrap();
  let second = container.resolve::<String>().unwrap();

  // Assert
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert!(!Arc::ptr_eq(&first, &second));
  assert_eq!(container.scope_of(&Capability::of::<String>()), Some(Scope::PerRequest));
}

#[test]
fn singleton_may_depend_on_per_request_capability() {
  struct Request(usize);
  struct Handler {
    request: Arc<Request>,
  }

  impl Injectable for Handler {
    fn dependencies() -> Vec<Dependency> {
      vec![Dependency::on::<Request>()]
    }

    fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
      Ok(Handler {
        request: deps.get::<Request>()?,
      })
    }
  }

  let counter = Arc::new(AtomicUsize::new(0));
  let next = Arc::clone(&counter);
  let container = ContainerBuilder::new()
    .add_recipes(
      translate(vec![
        bind::<Handler>().to_self().as_singleton(),
        bind::<Request>().to_provider_fn(move || Ok(Arc::new(Request(next.fetch_add(1, Ordering::SeqCst))))),
      ])
      .unwrap(),
    )
    .build()
    .unwrap();

  let handler = container.resolve::<Handler>().unwrap();
  assert_eq!(handler.request.0, 0);
  assert_eq!(container.resolve::<Request>().unwrap().0, 1);
}

#[test]
fn raw_recipe_with_unknown_dependency_is_rejected() {
  let recipe = ConstructionRecipe::new(
    Capability::of::<String>(),
    Scope::Singleton,
    vec![Capability::of::<u8>()],
    |deps: &Dependencies<'_>| -> Result<Arc<String>, BoxError> {
      Ok(Arc::new(deps.get::<u8>()?.to_string()))
    },
  );

  let err = ContainerBuilder::new().add_recipe(recipe).build().unwrap_err();
  assert!(matches!(err, Error::UnresolvableCapability { .. }));
}

#[test]
fn resolving_an_undeclared_singleton_is_reported() {
  // Arrange: the String factory reads u8 without declaring it, and u8 is
  // declared later, so it does not exist yet when String is built.
  let recipes = vec![
    ConstructionRecipe::new(
      Capability::of::<String>(),
      Scope::Singleton,
      Vec::new(),
      |deps: &Dependencies<'_>| -> Result<Arc<String>, BoxError> {
        Ok(Arc::new(deps.get::<u8>()?.to_string()))
      },
    ),
    ConstructionRecipe::new(
      Capability::of::<u8>(),
      Scope::Singleton,
      Vec::new(),
      |_: &Dependencies<'_>| -> Result<Arc<u8>, BoxError> { Ok(Arc::new(7)) },
    ),
  ];

  // Act
  let err = ContainerBuilder::new().add_recipes(recipes).build().unwrap_err();

  // Assert
  match err {
    Error::ConstructionFailed { capability, source } => {
      assert_eq!(capability, Capability::of::<String>());
      match source.downcast_ref::<Error>() {
        Some(Error::UndeclaredDependency {
          capability,
          required_by,
        }) => {
          assert_eq!(capability, &Capability::of::<u8>());
          assert_eq!(required_by, &Capability::of::<String>());
        }
        other => panic!("unexpected source: {other:?}"),
      }
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn built_container_is_shared_across_threads() {
  let log = Arc::new(EventLog::default());
  let container = Arc::new(
    ContainerBuilder::new()
      .add_recipes(translate(chain(&log)).unwrap())
      .build()
      .unwrap(),
  );
  let expected = container.resolve::<A>().unwrap();

  std::thread::scope(|s| {
    for _ in 0..8 {
      let container = Arc::clone(&container);
      let expected = Arc::clone(&expected);
      s.spawn(move || {
        let resolved = container.resolve::<A>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &expected));
      });
    }
  });
  assert_eq!(log.events(), vec!["C", "B", "A"]);
}
