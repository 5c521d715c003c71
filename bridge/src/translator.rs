//! Turns binding declarations into construction recipes.

use crate::binding::{BindingDeclaration, Target};
use crate::capability::{Capability, Scope};
use crate::core::{ConstructionRecipe, Dependencies, Factory, Instance};
use crate::error::{BoxError, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Translates declarations into recipes, one per capability.
///
/// Order is preserved. When a capability is declared more than once the last
/// declaration wins and takes over the slot of the first one. Dependencies that
/// nothing declares are either filled from their default or reported as
/// `UnresolvableCapability`. No factory runs here.
pub fn translate<I>(declarations: I) -> Result<Vec<ConstructionRecipe>>
where
  I: IntoIterator<Item = BindingDeclaration>,
{
  let mut recipes: Vec<ConstructionRecipe> = Vec::new();
  let mut slots: HashMap<Capability, usize> = HashMap::new();

  for declaration in declarations {
    let recipe = into_recipe(declaration);
    match slots.get(&recipe.capability) {
      Some(&slot) => {
        warn!(capability = %recipe.capability, "binding overridden by a later declaration");
        recipes[slot] = recipe;
      }
      None => {
        debug!(capability = %recipe.capability, scope = %recipe.scope, "translated binding");
        slots.insert(recipe.capability.clone(), recipes.len());
        recipes.push(recipe);
      }
    }
  }

  let mut defaults: Vec<ConstructionRecipe> = Vec::new();
  for recipe in &recipes {
    for dependency in &recipe.dependencies {
      let capability = dependency.capability();
      if slots.contains_key(capability) {
        continue;
      }
      match dependency.fallback() {
        Some(fallback) => {
          debug!(capability = %capability, required_by = %recipe.capability, "using default binding");
          slots.insert(capability.clone(), recipes.len() + defaults.len());
          defaults.push(ConstructionRecipe::from_parts(
            capability.clone(),
            Scope::PerRequest,
            Vec::new(),
            Arc::clone(fallback),
          ));
        }
        None => {
          return Err(Error::UnresolvableCapability {
            capability: capability.clone(),
            required_by: recipe.capability.clone(),
          })
        }
      }
    }
  }
  recipes.extend(defaults);

  Ok(recipes)
}

fn into_recipe(declaration: BindingDeclaration) -> ConstructionRecipe {
  let BindingDeclaration {
    capability,
    target,
    scope,
  } = declaration;

  match target {
    Target::Implementation {
      dependencies,
      factory,
      ..
    }
    | Target::Provider {
      dependencies,
      factory,
    } => ConstructionRecipe::from_parts(capability, scope, dependencies, factory),
    Target::Instance(instance) => {
      let factory: Factory =
        Arc::new(move |_: &Dependencies<'_>| -> std::result::Result<Instance, BoxError> {
          Ok(Arc::clone(&instance))
        });
      ConstructionRecipe::from_parts(capability, Scope::Singleton, Vec::new(), factory)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::binding::{bind, Injectable};
  use crate::core::Dependency;

  #[derive(Default)]
  struct Settings;

  struct Service;

  impl Injectable for Service {
    fn dependencies() -> Vec<Dependency> {
      vec![Dependency::or_default::<Settings>()]
    }

    fn construct(deps: &Dependencies<'_>) -> std::result::Result<Self, BoxError> {
      deps.get::<Settings>()?;
      Ok(Service)
    }
  }

  #[test]
  fn default_dependency_is_synthesized_once() {
    let recipes = translate(vec![
      bind::<Service>().to_self(),
      bind::<Service>().qualified_with("other").to_self(),
    ])
    .unwrap();

    let settings: Vec<_> = recipes
      .iter()
      .filter(|r| r.capability().is::<Settings>())
      .collect();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].scope(), Scope::PerRequest);
    assert_eq!(recipes.len(), 3);
  }

  #[test]
  fn declared_binding_beats_default() {
    let recipes = translate(vec![
      bind::<Service>().to_self(),
      bind::<Settings>().to_instance(Settings),
    ])
    .unwrap();

    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[1].scope(), Scope::Singleton);
  }
}
