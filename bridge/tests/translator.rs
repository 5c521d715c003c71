use fibre_bridge::{
  bind, implements, translate, BoxError, Capability, ContainerBuilder, Dependencies, Dependency,
  Error, Injectable, Scope,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

trait Storage: Send + Sync {
  fn kind(&self) -> &'static str;
}

struct DiskStorage;
struct MemoryStorage;

impl Storage for DiskStorage {
  fn kind(&self) -> &'static str {
    "disk"
  }
}

impl Storage for MemoryStorage {
  fn kind(&self) -> &'static str {
    "memory"
  }
}

impl Injectable for DiskStorage {
  fn construct(_: &Dependencies<'_>) -> Result<Self, BoxError> {
    Ok(DiskStorage)
  }
}

impl Injectable for MemoryStorage {
  fn construct(_: &Dependencies<'_>) -> Result<Self, BoxError> {
    Ok(MemoryStorage)
  }
}

implements!(DiskStorage => dyn Storage);
implements!(MemoryStorage => dyn Storage);

struct Archive {
  storage: Arc<dyn Storage>,
}

impl Injectable for Archive {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<dyn Storage>()]
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
    Ok(Archive {
      storage: deps.get::<dyn Storage>()?,
    })
  }
}

// --- Tests ---

#[test]
fn later_declaration_overrides_earlier_one() {
  // Arrange
  let declarations = vec![
    bind::<dyn Storage>().to::<DiskStorage>().as_singleton(),
    bind::<dyn Storage>().to::<MemoryStorage>().as_singleton(),
  ];

  // Act
  let recipes = translate(declarations).unwrap();
  let container = ContainerBuilder::new().add_recipes(recipes).build().unwrap();

  // Assert
  assert_eq!(container.len(), 1);
  assert_eq!(container.resolve::<dyn Storage>().unwrap().kind(), "memory");
}

#[test]
fn declaration_order_is_preserved() {
  // Arrange
  let declarations = vec![
    bind::<Archive>().to_self(),
    bind::<dyn Storage>().to::<DiskStorage>(),
    bind::<u32>().to_instance(7u32),
    bind::<dyn Storage>().to::<MemoryStorage>(),
  ];

  // Act
  let recipes = translate(declarations).unwrap();

  // Assert
  let capabilities: Vec<Capability> = recipes.iter().map(|r| r.capability().clone()).collect();
  assert_eq!(
    capabilities,
    vec![
      Capability::of::<Archive>(),
      Capability::of::<dyn Storage>(),
      Capability::of::<u32>(),
    ]
  );
}

#[test]
fn implementation_dependencies_become_capability_references() {
  let recipes = translate(vec![
    bind::<dyn Storage>().to::<DiskStorage>(),
    bind::<Archive>().to_self(),
  ])
  .unwrap();

  let archive = &recipes[1];
  let dependencies: Vec<&Capability> = archive.dependencies().collect();
  assert_eq!(dependencies, vec![&Capability::of::<dyn Storage>()]);
}

#[test]
fn missing_dependency_is_unresolvable() {
  // Arrange: Archive needs a Storage, nothing provides one.
  let declarations = vec![bind::<Archive>().to_self().as_singleton()];

  // Act
  let err = translate(declarations).unwrap_err();

  // Assert
  match err {
    Error::UnresolvableCapability {
      capability,
      required_by,
    } => {
      assert_eq!(capability, Capability::of::<dyn Storage>());
      assert_eq!(required_by, Capability::of::<Archive>());
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn translation_never_runs_factories() {
  // Arrange
  let calls = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&calls);
  let declarations = vec![bind::<String>()
    .to_provider_fn(move || {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(Arc::new("built".to_string()))
    })
    .as_eager_singleton()];

  // Act
  let recipes = translate(declarations).unwrap();

  // Assert
  assert_eq!(calls.load(Ordering::SeqCst), 0);
  assert_eq!(recipes[0].scope(), Scope::Singleton);
}

#[test]
fn named_bindings_do_not_override_unnamed_ones() {
  let recipes = translate(vec![
    bind::<u32>().to_instance(1u32),
    bind::<u32>().qualified_with("retries").to_instance(3u32),
  ])
  .unwrap();
  let container = ContainerBuilder::new().add_recipes(recipes).build().unwrap();

  assert_eq!(*container.resolve::<u32>().unwrap(), 1);
  assert_eq!(*container.resolve_named::<u32>("retries").unwrap(), 3);
}
