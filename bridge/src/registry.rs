//! The host injector's side of the bridge: exposed bindings and the registry
//! that holds them.

use crate::capability::{Capability, Scope};
use crate::container::SecondaryContainer;
use crate::core::Instance;
use crate::error::{Error, Result};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Thunk = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// A capability the host injector can resolve, together with how to resolve it.
#[derive(Clone)]
pub struct ExposedBinding {
  capability: Capability,
  scope: Scope,
  thunk: Thunk,
}

impl ExposedBinding {
  pub fn new<F>(capability: Capability, scope: Scope, thunk: F) -> Self
  where
    F: Fn() -> Result<Instance> + Send + Sync + 'static,
  {
    Self {
      capability,
      scope,
      thunk: Arc::new(thunk),
    }
  }

  /// A singleton binding that always hands out `instance`.
  pub fn constant(capability: Capability, instance: Instance) -> Self {
    Self::new(capability, Scope::Singleton, move || Ok(Arc::clone(&instance)))
  }

  /// Exposes `capability` from `container` with the scope it has there.
  pub fn from_container(container: &Arc<SecondaryContainer>, capability: &Capability) -> Option<Self> {
    let scope = container.scope_of(capability)?;
    let container = Arc::clone(container);
    let key = capability.clone();
    Some(Self::new(capability.clone(), scope, move || container.instance(&key)))
  }

  pub fn capability(&self) -> &Capability {
    &self.capability
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  pub fn resolve(&self) -> Result<Instance> {
    (self.thunk)()
  }
}

impl fmt::Debug for ExposedBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ExposedBinding")
      .field("capability", &self.capability)
      .field("scope", &self.scope)
      .finish()
  }
}

struct Registration {
  module: String,
  binding: ExposedBinding,
  cache: OnceCell<Instance>,
}

/// The host injector's binding registry.
///
/// Singletons are cached here after their first resolution. The exposed
/// binding already returns the same instance every time, so both layers
/// converge on one object.
#[derive(Default)]
pub struct HostRegistry {
  registrations: DashMap<Capability, Arc<Registration>>,
}

impl HostRegistry {
  /// Creates a new, empty `HostRegistry`.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(&self, module: &str, binding: ExposedBinding) -> Result<()> {
    self.register_all(module, vec![binding])
  }

  /// Registers a module's bindings as a unit: if any capability is already
  /// registered, or repeated within `bindings`, nothing is registered.
  pub fn register_all(&self, module: &str, bindings: Vec<ExposedBinding>) -> Result<()> {
    let mut seen = HashSet::with_capacity(bindings.len());
    for binding in &bindings {
      if let Some(existing) = self.registrations.get(binding.capability()) {
        return Err(Error::DuplicateCapability {
          capability: binding.capability().clone(),
          existing_module: existing.module.clone(),
          new_module: module.to_string(),
        });
      }
      if !seen.insert(binding.capability().clone()) {
        return Err(Error::DuplicateCapability {
          capability: binding.capability().clone(),
          existing_module: module.to_string(),
          new_module: module.to_string(),
        });
      }
    }

    for binding in bindings {
      debug!(module, capability = %binding.capability(), scope = %binding.scope(), "registered host binding");
      self.registrations.insert(
        binding.capability().clone(),
        Arc::new(Registration {
          module: module.to_string(),
          binding,
          cache: OnceCell::new(),
        }),
      );
    }
    Ok(())
  }

  pub fn resolve(&self, capability: &Capability) -> Result<Instance> {
    let registration = self
      .registrations
      .get(capability)
      .map(|entry| Arc::clone(entry.value()))
      .ok_or_else(|| Error::UnknownCapability {
        capability: capability.clone(),
      })?;

    match registration.binding.scope() {
      Scope::Singleton => registration
        .cache
        .get_or_try_init(|| registration.binding.resolve())
        .cloned(),
      Scope::PerRequest => registration.binding.resolve(),
    }
  }

  pub fn contains(&self, capability: &Capability) -> bool {
    self.registrations.contains_key(capability)
  }

  /// The module that registered `capability`.
  pub fn module_of(&self, capability: &Capability) -> Option<String> {
    self
      .registrations
      .get(capability)
      .map(|entry| entry.module.clone())
  }

  pub fn len(&self) -> usize {
    self.registrations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registrations.is_empty()
  }
}
