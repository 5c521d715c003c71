//! Modules declare bindings; bridge modules turn them into a secondary
//! container and expose it to the host.

use crate::binding::{bind, BindingDeclaration};
use crate::capability::Capability;
use crate::config::{Configuration, Environment};
use crate::container::{ContainerBuilder, SecondaryContainer};
use crate::error::{Error, Result};
use crate::registry::{ExposedBinding, HostRegistry};
use crate::translator::translate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Module name under which the host registers its own capabilities.
pub(crate) const HOST_MODULE: &str = "host";

/// A source of binding declarations.
///
/// Closures taking the environment and configuration are modules too.
pub trait Module: Send + Sync {
  fn bindings(&self, environment: &Environment, configuration: &Configuration) -> Vec<BindingDeclaration>;
}

impl<F> Module for F
where
  F: Fn(&Environment, &Configuration) -> Vec<BindingDeclaration> + Send + Sync,
{
  fn bindings(&self, environment: &Environment, configuration: &Configuration) -> Vec<BindingDeclaration> {
    self(environment, configuration)
  }
}

/// A fixed list of declarations.
#[derive(Clone, Debug, Default)]
pub struct Bindings(pub Vec<BindingDeclaration>);

impl Module for Bindings {
  fn bindings(&self, _: &Environment, _: &Configuration) -> Vec<BindingDeclaration> {
    self.0.clone()
  }
}

/// Several modules presented as one. Their declarations are concatenated in
/// order, so a later module overrides an earlier one.
#[derive(Default)]
pub struct Combined {
  modules: Vec<Box<dyn Module>>,
}

impl Combined {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, module: impl Module + 'static) -> Self {
    self.modules.push(Box::new(module));
    self
  }
}

impl Module for Combined {
  fn bindings(&self, environment: &Environment, configuration: &Configuration) -> Vec<BindingDeclaration> {
    self
      .modules
      .iter()
      .flat_map(|module| module.bindings(environment, configuration))
      .collect()
  }
}

// --- BridgeModule ---

/// Builds one secondary container from a [`Module`] and exposes its
/// capabilities to the host registry.
///
/// The module's container also sees the host's `Environment` and
/// `Configuration`, so its bindings can depend on them. Those two are not
/// exposed back; the host registers them itself.
pub struct BridgeModule {
  name: String,
  module: Box<dyn Module>,
  builder: ContainerBuilder,
  container: Option<Arc<SecondaryContainer>>,
}

impl BridgeModule {
  pub fn new(name: impl Into<String>, module: impl Module + 'static) -> Self {
    Self {
      name: name.into(),
      module: Box::new(module),
      builder: ContainerBuilder::new(),
      container: None,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The container, once installed.
  pub fn container(&self) -> Option<&Arc<SecondaryContainer>> {
    self.container.as_ref()
  }

  /// Translates the module's bindings, builds the container and registers every
  /// capability the module declared with `registry`. A bridge module installs
  /// once.
  ///
  /// Defaults synthesized for `Dependency::or_default` stay private to the
  /// container. A module may not declare `Environment` or `Configuration`
  /// itself; those belong to the host.
  pub fn install(
    &mut self,
    environment: &Environment,
    configuration: &Configuration,
    registry: &HostRegistry,
  ) -> Result<()> {
    if self.builder.is_built() {
      return Err(Error::AlreadyBuilt);
    }

    let own = self.module.bindings(environment, configuration);
    let declared: HashSet<Capability> = own
      .iter()
      .map(|declaration| declaration.capability().clone())
      .collect();

    let mut declarations = ambient_bindings(environment, configuration);
    if let Some(ambient) = declarations
      .iter()
      .map(BindingDeclaration::capability)
      .find(|capability| declared.contains(*capability))
    {
      warn!(module = %self.name, capability = %ambient, "module declares a host-provided capability");
      return Err(Error::DuplicateCapability {
        capability: ambient.clone(),
        existing_module: HOST_MODULE.to_string(),
        new_module: self.name.clone(),
      });
    }
    declarations.extend(own);

    let recipes = translate(declarations)?;
    let container = Arc::new(self.builder.add_recipes(recipes).build()?);

    let exposed: Vec<ExposedBinding> = container
      .capabilities()
      .filter(|capability| declared.contains(*capability))
      .filter_map(|capability| ExposedBinding::from_container(&container, capability))
      .collect();
    let count = exposed.len();
    registry.register_all(&self.name, exposed)?;

    info!(module = %self.name, exposed = count, "bridge module installed");
    self.container = Some(container);
    Ok(())
  }
}

fn ambient_bindings(environment: &Environment, configuration: &Configuration) -> Vec<BindingDeclaration> {
  vec![
    bind::<Environment>().to_instance(environment.clone()),
    bind::<Configuration>().to_instance(configuration.clone()),
  ]
}
