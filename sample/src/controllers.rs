//! Request handlers.

use crate::error::Result;
use crate::model::{Identified, MyEntity};
use crate::repository::{CrudStore, MyEntityRepository};
use fibre_bridge::{
  bind, BindingDeclaration, BoxError, Configuration, Dependencies, Dependency, Environment,
  Injectable, Module,
};
use std::sync::Arc;

/// Handles requests to the application's home page.
pub struct HomeController {
  repository: Arc<MyEntityRepository>,
}

impl HomeController {
  pub fn new(repository: Arc<MyEntityRepository>) -> Self {
    Self { repository }
  }

  /// Stores a new entity with a random email and renders every stored entity.
  pub fn index(&self) -> Result<String> {
    let email = format!("test{}@test.com", rand::random::<u32>());
    self.repository.save(Identified::new(MyEntity::new(email)))?;
    Ok(render_index(&self.repository.find_all()))
  }
}

impl Injectable for HomeController {
  fn dependencies() -> Vec<Dependency> {
    vec![Dependency::on::<MyEntityRepository>()]
  }

  fn construct(deps: &Dependencies<'_>) -> std::result::Result<Self, BoxError> {
    Ok(Self::new(deps.get::<MyEntityRepository>()?))
  }
}

fn render_index(entities: &[Identified<MyEntity>]) -> String {
  let mut html = String::from("<h1>Entities</h1>\n<ul>\n");
  for entity in entities {
    let id = entity.id().map(|id| id.to_string()).unwrap_or_default();
    html.push_str(&format!("  <li>{}: {}</li>\n", id, entity.email()));
  }
  html.push_str("</ul>\n");
  html
}

/// Request handlers. Unscoped, so every resolution gets a fresh controller.
pub struct ControllersModule;

impl Module for ControllersModule {
  fn bindings(&self, _: &Environment, _: &Configuration) -> Vec<BindingDeclaration> {
    vec![bind::<HomeController>().to_self()]
  }
}
