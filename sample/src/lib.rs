//! Sample application for `fibre_bridge`: a persistence context, a typed CRUD
//! store and a home controller, all resolved through the host injector.

pub mod controllers;
pub mod error;
pub mod model;
pub mod persistence;
pub mod repository;

pub use error::{Result, SampleError};

use controllers::ControllersModule;
use fibre_bridge::{Application, Combined, Configuration, Environment, HostApplicationBuilder};
use persistence::PersistenceModule;

/// Every binding of the application. Controllers depend on repositories, so
/// both live in the same container.
pub fn application_module() -> Combined {
  Combined::new()
    .with(PersistenceModule)
    .with(ControllersModule)
}

pub fn build_application(
  environment: Environment,
  configuration: Configuration,
) -> fibre_bridge::Result<Application> {
  HostApplicationBuilder::new()
    .environment(environment)
    .configuration(configuration)
    .named_bindings("application", application_module())
    .build()
}
