//! # Fibre Bridge
//!
//! Wires an eagerly-built secondary container underneath a host application's
//! injector.
//!
//! Bindings are declared with a small fluent DSL, translated into construction
//! recipes, and built into a [`SecondaryContainer`] per module. Singletons are
//! constructed at build time, in dependency order, exactly once. The container
//! is then exposed to the host's [`Injector`], which hands out the very same
//! singleton instances.
//!
//! ## Core Concepts
//!
//! - **Capability**: what is being asked for, a type plus an optional name.
//! - **Module**: produces [`BindingDeclaration`]s, e.g. `bind::<T>().to_self().as_singleton()`.
//! - **Translator**: [`translate`] turns declarations into [`ConstructionRecipe`]s.
//! - **Builder**: [`ContainerBuilder`] orders recipes, detects cycles and constructs singletons.
//! - **Bridge**: [`BridgeModule`] builds a module's container and registers it with the host.
//! - **Host**: [`HostApplicationBuilder`] composes modules into an [`Application`].
//!
//! ## Quick Start
//!
//! ```
//! use fibre_bridge::{bind, BoxError, Dependencies, Dependency, HostApplicationBuilder, Injectable};
//! use std::sync::Arc;
//!
//! struct Database {
//!   url: String,
//! }
//!
//! struct UserService {
//!   db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!   fn dependencies() -> Vec<Dependency> {
//!     vec![Dependency::on::<Database>()]
//!   }
//!
//!   fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError> {
//!     Ok(UserService { db: deps.get::<Database>()? })
//!   }
//! }
//!
//! let app = HostApplicationBuilder::new()
//!   .bindings(fibre_bridge::Bindings(vec![
//!     bind::<Database>().to_instance(Database { url: "mem:test".to_string() }),
//!     bind::<UserService>().to_self().as_singleton(),
//!   ]))
//!   .build()
//!   .unwrap();
//!
//! let first = app.injector().instance_of::<UserService>().unwrap();
//! let second = app.injector().instance_of::<UserService>().unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(first.db.url, "mem:test");
//! ```

mod binding;
mod capability;
mod config;
mod container;
mod core;
mod error;
mod host;
mod macros;
mod module;
mod registry;
mod translator;

pub use binding::{bind, BindingDeclaration, BindingKey, Implements, Injectable, Provider};
pub use capability::{Capability, Scope};
pub use config::{Configuration, Environment, Mode};
pub use container::{ContainerBuilder, SecondaryContainer};
pub use crate::core::{ConstructionRecipe, Dependencies, Dependency, Instance};
pub use error::{BoxError, Error, Result};
pub use host::{Application, HostApplicationBuilder, Injector};
pub use module::{Bindings, BridgeModule, Combined, Module};
pub use registry::{ExposedBinding, HostRegistry};
pub use translator::translate;

// Re-exported for `HostApplicationBuilder::configure` and `Configuration::entries`.
pub use serde_yaml::Value as ConfigValue;
