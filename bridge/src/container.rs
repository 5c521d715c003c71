//! The secondary container and the builder that constructs it.

use crate::capability::{Capability, Scope};
use crate::core::{downcast, ConstructionRecipe, Instance};
use crate::error::{Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A fully built dependency graph.
///
/// Every singleton was constructed when the container was built; per-request
/// capabilities keep their recipe and construct a new instance on each
/// resolution. The container is never mutated after `build`, so it can be
/// shared across threads as is.
pub struct SecondaryContainer {
  singletons: HashMap<Capability, Instance>,
  per_request: HashMap<Capability, ConstructionRecipe>,
  capabilities: Vec<Capability>,
}

impl SecondaryContainer {
  fn empty(capabilities: Vec<Capability>) -> Self {
    Self {
      singletons: HashMap::new(),
      per_request: HashMap::new(),
      capabilities,
    }
  }

  /// Resolves the unqualified binding for `T`.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let capability = Capability::of::<T>();
    downcast(&self.instance(&capability)?, &capability)
  }

  /// Resolves the binding for `T` qualified with `name`.
  pub fn resolve_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let capability = Capability::named::<T>(name);
    downcast(&self.instance(&capability)?, &capability)
  }

  /// Type-erased resolution used by exposed bindings.
  pub fn instance(&self, capability: &Capability) -> Result<Instance> {
    if let Some(instance) = self.singletons.get(capability) {
      return Ok(Arc::clone(instance));
    }
    match self.per_request.get(capability) {
      Some(recipe) => recipe.instantiate(self),
      None => Err(Error::UnknownCapability {
        capability: capability.clone(),
      }),
    }
  }

  pub fn scope_of(&self, capability: &Capability) -> Option<Scope> {
    if self.singletons.contains_key(capability) {
      Some(Scope::Singleton)
    } else if self.per_request.contains_key(capability) {
      Some(Scope::PerRequest)
    } else {
      None
    }
  }

  pub fn contains(&self, capability: &Capability) -> bool {
    self.scope_of(capability).is_some()
  }

  /// Capabilities in declaration order.
  pub fn capabilities(&self) -> impl Iterator<Item = &Capability> + '_ {
    self.capabilities.iter()
  }

  pub fn len(&self) -> usize {
    self.capabilities.len()
  }

  pub fn is_empty(&self) -> bool {
    self.capabilities.is_empty()
  }
}

impl fmt::Debug for SecondaryContainer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SecondaryContainer")
      .field("singletons", &self.singletons.len())
      .field("per_request", &self.per_request.len())
      .field("capabilities", &self.capabilities)
      .finish()
  }
}

// --- Builder ---

/// Accumulates recipes and builds a [`SecondaryContainer`] from them, once.
#[derive(Default)]
pub struct ContainerBuilder {
  recipes: Vec<ConstructionRecipe>,
  slots: HashMap<Capability, usize>,
  built: bool,
}

impl ContainerBuilder {
  /// Creates a new, empty `ContainerBuilder`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a recipe. A recipe for a capability that is already present
  /// replaces it.
  pub fn add_recipe(&mut self, recipe: ConstructionRecipe) -> &mut Self {
    match self.slots.get(&recipe.capability) {
      Some(&slot) => self.recipes[slot] = recipe,
      None => {
        self.slots.insert(recipe.capability.clone(), self.recipes.len());
        self.recipes.push(recipe);
      }
    }
    self
  }

  pub fn add_recipes<I>(&mut self, recipes: I) -> &mut Self
  where
    I: IntoIterator<Item = ConstructionRecipe>,
  {
    for recipe in recipes {
      self.add_recipe(recipe);
    }
    self
  }

  pub fn is_built(&self) -> bool {
    self.built
  }

  /// Builds the container.
  ///
  /// Dependencies are checked and ordered before anything is constructed, so a
  /// missing binding or a cycle fails without running a single factory.
  /// Singletons are then constructed in dependency order, each exactly once.
  /// The first factory error aborts the build.
  ///
  /// A builder builds once; any later call fails with `AlreadyBuilt`.
  pub fn build(&mut self) -> Result<SecondaryContainer> {
    if self.built {
      return Err(Error::AlreadyBuilt);
    }
    self.built = true;

    let recipes = std::mem::take(&mut self.recipes);
    let slots = std::mem::take(&mut self.slots);
    let order = GraphWalk::new(&recipes, &slots).topological_order()?;

    let mut container =
      SecondaryContainer::empty(recipes.iter().map(|r| r.capability.clone()).collect());
    for recipe in recipes.iter().filter(|r| r.scope == Scope::PerRequest) {
      container
        .per_request
        .insert(recipe.capability.clone(), recipe.clone());
    }

    for &slot in &order {
      let recipe = &recipes[slot];
      if recipe.scope != Scope::Singleton {
        continue;
      }
      let instance = recipe.instantiate(&container).map_err(|e| {
        error!(capability = %recipe.capability, error = %e, "container build aborted");
        e
      })?;
      debug!(capability = %recipe.capability, "constructed singleton");
      container
        .singletons
        .insert(recipe.capability.clone(), instance);
    }

    info!(
      singletons = container.singletons.len(),
      per_request = container.per_request.len(),
      "secondary container built"
    );
    Ok(container)
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  InProgress,
  Done,
}

/// Depth-first walk over the recipe graph producing a dependencies-first order.
struct GraphWalk<'a> {
  recipes: &'a [ConstructionRecipe],
  slots: &'a HashMap<Capability, usize>,
  marks: Vec<Mark>,
  path: Vec<usize>,
  order: Vec<usize>,
}

impl<'a> GraphWalk<'a> {
  fn new(recipes: &'a [ConstructionRecipe], slots: &'a HashMap<Capability, usize>) -> Self {
    Self {
      recipes,
      slots,
      marks: vec![Mark::Unvisited; recipes.len()],
      path: Vec::new(),
      order: Vec::with_capacity(recipes.len()),
    }
  }

  fn topological_order(mut self) -> Result<Vec<usize>> {
    for slot in 0..self.recipes.len() {
      self.visit(slot)?;
    }
    Ok(self.order)
  }

  fn visit(&mut self, slot: usize) -> Result<()> {
    match self.marks[slot] {
      Mark::Done => return Ok(()),
      Mark::InProgress => return Err(self.cycle_through(slot)),
      Mark::Unvisited => {}
    }

    self.marks[slot] = Mark::InProgress;
    self.path.push(slot);

    let recipes = self.recipes;
    let recipe = &recipes[slot];
    for dependency in &recipe.dependencies {
      let next = *self
        .slots
        .get(dependency.capability())
        .ok_or_else(|| Error::UnresolvableCapability {
          capability: dependency.capability().clone(),
          required_by: recipe.capability.clone(),
        })?;
      self.visit(next)?;
    }

    self.path.pop();
    self.marks[slot] = Mark::Done;
    self.order.push(slot);
    Ok(())
  }

  fn cycle_through(&self, slot: usize) -> Error {
    let start = self.path.iter().position(|&s| s == slot).unwrap_or(0);
    let mut cycle: Vec<Capability> = self.path[start..]
      .iter()
      .map(|&s| self.recipes[s].capability.clone())
      .collect();
    cycle.push(self.recipes[slot].capability.clone());
    Error::CyclicDependency { cycle }
  }
}
