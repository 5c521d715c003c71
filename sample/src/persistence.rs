//! The persistence context: settings read from configuration and the database
//! session provider every repository is built on.

use crate::repository::MyEntityRepository;
use fibre_bridge::{
  bind, BindingDeclaration, BoxError, ConfigValue, Configuration, Dependencies, Dependency,
  Environment, Module, Provider,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

/// Connection settings of the default database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceSettings {
  pub url: String,
  pub persistence_unit: String,
  /// Vendor properties, keyed `hibernate.<name>`.
  pub properties: BTreeMap<String, String>,
}

impl PersistenceSettings {
  /// Reads `db.default.url`, `jpa.default` and the `db.default.hibernate` tree.
  pub fn from_configuration(config: &Configuration) -> fibre_bridge::Result<Self> {
    let url = config.get_string("db.default.url")?;
    let persistence_unit = config.get_string("jpa.default")?;

    let properties = match config.get_config("db.default.hibernate") {
      Ok(hibernate) => hibernate
        .entries()
        .into_iter()
        .map(|(key, value)| (format!("hibernate.{key}"), scalar_to_string(&value)))
        .collect(),
      Err(fibre_bridge::Error::MissingConfigValue { .. }) => BTreeMap::new(),
      Err(e) => return Err(e),
    };

    Ok(Self {
      url,
      persistence_unit,
      properties,
    })
  }
}

fn scalar_to_string(value: &ConfigValue) -> String {
  match value {
    ConfigValue::String(s) => s.clone(),
    ConfigValue::Bool(b) => b.to_string(),
    ConfigValue::Number(n) => n.to_string(),
    ConfigValue::Null => String::new(),
    other => format!("{other:?}"),
  }
}

/// Hands out database sessions. Here it only owns the id sequences.
#[derive(Debug)]
pub struct SessionProvider {
  settings: PersistenceSettings,
  sequences: Mutex<HashMap<String, i64>>,
}

impl SessionProvider {
  pub fn new(settings: PersistenceSettings) -> Self {
    Self {
      settings,
      sequences: Mutex::new(HashMap::new()),
    }
  }

  pub fn settings(&self) -> &PersistenceSettings {
    &self.settings
  }

  /// Next value of the named sequence, starting at 1.
  pub fn next_id(&self, sequence: &str) -> i64 {
    let mut sequences = self.sequences.lock();
    let next = sequences.entry(sequence.to_string()).or_insert(0);
    *next += 1;
    *next
  }
}

/// Builds the session provider from the host configuration.
pub struct SessionProviderFactory;

impl Provider<SessionProvider> for SessionProviderFactory {
  fn dependencies(&self) -> Vec<Dependency> {
    vec![Dependency::on::<Configuration>()]
  }

  fn get(&self, deps: &Dependencies<'_>) -> Result<Arc<SessionProvider>, BoxError> {
    let configuration = deps.get::<Configuration>()?;
    let settings = PersistenceSettings::from_configuration(&configuration)?;
    info!(
      url = %settings.url,
      unit = %settings.persistence_unit,
      properties = settings.properties.len(),
      "opening persistence context"
    );
    Ok(Arc::new(SessionProvider::new(settings)))
  }
}

/// Session provider and repositories.
pub struct PersistenceModule;

impl Module for PersistenceModule {
  fn bindings(&self, _: &Environment, _: &Configuration) -> Vec<BindingDeclaration> {
    vec![
      bind::<SessionProvider>()
        .to_provider(SessionProviderFactory)
        .as_eager_singleton(),
      bind::<MyEntityRepository>().to_self().as_singleton(),
    ]
  }
}
