//! The host application: composes bridge modules and resolves by type.

use crate::capability::Capability;
use crate::config::{Configuration, Environment};
use crate::core::downcast;
use crate::error::Result;
use crate::module::{BridgeModule, Module, HOST_MODULE};
use crate::registry::{ExposedBinding, HostRegistry};
use std::any::Any;
use std::sync::Arc;
use tracing::{error, info};

/// Assembles a host [`Application`].
#[derive(Default)]
pub struct HostApplicationBuilder {
  environment: Environment,
  configuration: Configuration,
  modules: Vec<BridgeModule>,
}

impl HostApplicationBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn environment(mut self, environment: Environment) -> Self {
    self.environment = environment;
    self
  }

  /// Replaces the configuration.
  pub fn configuration(mut self, configuration: Configuration) -> Self {
    self.configuration = configuration;
    self
  }

  /// Sets a single configuration value.
  pub fn configure(mut self, path: &str, value: impl Into<serde_yaml::Value>) -> Self {
    self.configuration.set(path, value);
    self
  }

  /// Adds a module, installed through its own bridge module.
  pub fn bindings(self, module: impl Module + 'static) -> Self {
    let name = format!("module-{}", self.modules.len() + 1);
    self.named_bindings(name, module)
  }

  /// Like [`bindings`](Self::bindings), with a name used in error reports.
  pub fn named_bindings(mut self, name: impl Into<String>, module: impl Module + 'static) -> Self {
    self.modules.push(BridgeModule::new(name, module));
    self
  }

  /// Builds every module's container and registers their capabilities.
  ///
  /// The first error aborts the build and no application is returned.
  pub fn build(self) -> Result<Application> {
    let Self {
      environment,
      configuration,
      mut modules,
    } = self;

    let registry = Arc::new(HostRegistry::new());
    registry.register_all(
      HOST_MODULE,
      vec![
        constant(environment.clone()),
        constant(configuration.clone()),
      ],
    )?;

    for module in &mut modules {
      if let Err(e) = module.install(&environment, &configuration, &registry) {
        error!(module = module.name(), error = %e, "host application startup failed");
        return Err(e);
      }
    }

    info!(
      modules = modules.len(),
      bindings = registry.len(),
      mode = ?environment.mode(),
      "host application started"
    );
    Ok(Application {
      injector: Injector { registry },
      environment,
      configuration,
      modules,
    })
  }
}

fn constant<T: Any + Send + Sync>(value: T) -> ExposedBinding {
  ExposedBinding::constant(Capability::of::<T>(), Arc::new(Arc::new(value)))
}

/// A running host application.
pub struct Application {
  injector: Injector,
  environment: Environment,
  configuration: Configuration,
  modules: Vec<BridgeModule>,
}

impl Application {
  pub fn injector(&self) -> &Injector {
    &self.injector
  }

  pub fn environment(&self) -> &Environment {
    &self.environment
  }

  pub fn configuration(&self) -> &Configuration {
    &self.configuration
  }

  /// Names of the installed bridge modules, in installation order.
  pub fn module_names(&self) -> impl Iterator<Item = &str> + '_ {
    self.modules.iter().map(BridgeModule::name)
  }

  /// Shuts the application down, dropping every container it owns.
  pub fn stop(self) {
    info!(modules = self.modules.len(), "host application stopped");
  }
}

/// Resolves capabilities registered with the host.
#[derive(Clone)]
pub struct Injector {
  registry: Arc<HostRegistry>,
}

impl Injector {
  /// Resolves the unqualified binding for `T`.
  pub fn instance_of<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    self.resolve(&Capability::of::<T>())
  }

  /// Resolves the binding for `T` qualified with `name`.
  pub fn instance_of_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    self.resolve(&Capability::named::<T>(name))
  }

  pub fn contains(&self, capability: &Capability) -> bool {
    self.registry.contains(capability)
  }

  fn resolve<T: ?Sized + Any + Send + Sync>(&self, capability: &Capability) -> Result<Arc<T>> {
    let instance = self.registry.resolve(capability)?;
    downcast(&instance, capability)
  }
}
