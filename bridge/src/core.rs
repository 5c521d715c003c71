//! Type-erased building blocks shared by the translator and the container.

use crate::capability::{Capability, Scope};
use crate::container::SecondaryContainer;
use crate::error::{BoxError, Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A constructed object, as stored by the containers.
///
/// The payload is always an `Arc<T>` for the capability's `T`. Cloning an
/// `Instance` therefore shares the same `T`, which is what keeps singleton
/// identity intact across both injectors, trait objects included.
pub type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory =
  Arc<dyn Fn(&Dependencies<'_>) -> std::result::Result<Instance, BoxError> + Send + Sync>;

pub(crate) fn erase<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Instance {
  Arc::new(value)
}

pub(crate) fn downcast<T: ?Sized + Any + Send + Sync>(
  instance: &Instance,
  capability: &Capability,
) -> Result<Arc<T>> {
  instance
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or_else(|| Error::InstanceTypeMismatch {
      capability: capability.clone(),
      expected: std::any::type_name::<T>(),
    })
}

// --- Dependency ---

/// A constructor dependency, as reported by `Injectable::dependencies` or
/// `Provider::dependencies`.
#[derive(Clone)]
pub struct Dependency {
  capability: Capability,
  fallback: Option<Factory>,
}

impl Dependency {
  /// Depends on the unqualified binding for `T`.
  pub fn on<T: ?Sized + Any + Send + Sync>() -> Self {
    Self {
      capability: Capability::of::<T>(),
      fallback: None,
    }
  }

  /// Depends on the binding for `T` qualified with `name`.
  pub fn named<T: ?Sized + Any + Send + Sync>(name: &str) -> Self {
    Self {
      capability: Capability::named::<T>(name),
      fallback: None,
    }
  }

  /// Depends on `T`, falling back to a per-request `T::default()` when the
  /// module declares no binding for it.
  pub fn or_default<T: Default + Any + Send + Sync>() -> Self {
    let fallback: Factory =
      Arc::new(|_: &Dependencies<'_>| -> std::result::Result<Instance, BoxError> {
        Ok(erase(Arc::new(T::default())))
      });
    Self {
      capability: Capability::of::<T>(),
      fallback: Some(fallback),
    }
  }

  pub fn capability(&self) -> &Capability {
    &self.capability
  }

  pub fn has_default(&self) -> bool {
    self.fallback.is_some()
  }

  pub(crate) fn fallback(&self) -> Option<&Factory> {
    self.fallback.as_ref()
  }
}

impl From<Capability> for Dependency {
  fn from(capability: Capability) -> Self {
    Self {
      capability,
      fallback: None,
    }
  }
}

impl fmt::Debug for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dependency")
      .field("capability", &self.capability)
      .field("has_default", &self.has_default())
      .finish()
  }
}

// --- ConstructionRecipe ---

/// How the secondary container produces one capability.
#[derive(Clone)]
pub struct ConstructionRecipe {
  pub(crate) capability: Capability,
  pub(crate) dependencies: Vec<Dependency>,
  pub(crate) factory: Factory,
  pub(crate) scope: Scope,
}

impl ConstructionRecipe {
  /// Creates a recipe from a typed factory.
  ///
  /// `dependencies` must list every capability the factory resolves through
  /// its `Dependencies`, so the builder can order construction.
  pub fn new<T, F>(capability: Capability, scope: Scope, dependencies: Vec<Capability>, factory: F) -> Self
  where
    T: ?Sized + Any + Send + Sync,
    F: Fn(&Dependencies<'_>) -> std::result::Result<Arc<T>, BoxError> + Send + Sync + 'static,
  {
    Self {
      capability,
      dependencies: dependencies.into_iter().map(Dependency::from).collect(),
      factory: Arc::new(move |deps: &Dependencies<'_>| factory(deps).map(erase)),
      scope,
    }
  }

  pub(crate) fn from_parts(
    capability: Capability,
    scope: Scope,
    dependencies: Vec<Dependency>,
    factory: Factory,
  ) -> Self {
    Self {
      capability,
      dependencies,
      factory,
      scope,
    }
  }

  pub fn capability(&self) -> &Capability {
    &self.capability
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  pub fn dependencies(&self) -> impl Iterator<Item = &Capability> + '_ {
    self.dependencies.iter().map(Dependency::capability)
  }

  /// Runs the factory. Any failure is reported against this recipe's capability.
  pub(crate) fn instantiate(&self, container: &SecondaryContainer) -> Result<Instance> {
    let deps = Dependencies {
      container,
      requester: &self.capability,
      declared: &self.dependencies,
    };
    (self.factory)(&deps).map_err(|source| Error::ConstructionFailed {
      capability: self.capability.clone(),
      source,
    })
  }
}

impl fmt::Debug for ConstructionRecipe {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ConstructionRecipe")
      .field("capability", &self.capability)
      .field("scope", &self.scope)
      .field("dependencies", &self.dependencies)
      .finish()
  }
}

// --- Dependencies ---

/// The view of the container handed to factories while they run.
///
/// Singletons are served from the instance map; per-request capabilities are
/// constructed on the spot. Only declared dependencies are guaranteed to be
/// built before the factory runs; anything else may still be missing.
pub struct Dependencies<'a> {
  container: &'a SecondaryContainer,
  requester: &'a Capability,
  declared: &'a [Dependency],
}

impl<'a> Dependencies<'a> {
  /// Resolves the unqualified binding for `T`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve(&Capability::of::<T>())
  }

  /// Resolves the binding for `T` qualified with `name`.
  pub fn get_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.resolve(&Capability::named::<T>(name))
  }

  /// The capability whose factory is currently running.
  pub fn requester(&self) -> &Capability {
    self.requester
  }

  fn resolve<T: ?Sized + Any + Send + Sync>(&self, capability: &Capability) -> Result<Arc<T>> {
    let instance = self.container.instance(capability).map_err(|e| match e {
      Error::UnknownCapability { .. } if !self.is_declared(capability) => {
        Error::UndeclaredDependency {
          capability: capability.clone(),
          required_by: self.requester.clone(),
        }
      }
      other => other,
    })?;
    downcast(&instance, capability)
  }

  fn is_declared(&self, capability: &Capability) -> bool {
    self
      .declared
      .iter()
      .any(|dependency| dependency.capability() == capability)
  }
}
