use crate::capability::Capability;
use thiserror::Error;

/// Error type returned by factories and providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for the `fibre_bridge` library.
///
/// Every variant is fatal for the startup sequence that produced it; nothing
/// in the bridge retries.
#[derive(Debug, Error)]
pub enum Error {
  #[error("No binding for {capability}, required by {required_by}")]
  UnresolvableCapability {
    capability: Capability,
    required_by: Capability,
  },

  #[error("Cyclic dependency detected: {}", display_cycle(.cycle))]
  CyclicDependency { cycle: Vec<Capability> },

  #[error("Failed to construct {capability}: {source}")]
  ConstructionFailed {
    capability: Capability,
    #[source]
    source: BoxError,
  },

  #[error("Container has already been built")]
  AlreadyBuilt,

  #[error("{capability} is exposed by both '{existing_module}' and '{new_module}'")]
  DuplicateCapability {
    capability: Capability,
    existing_module: String,
    new_module: String,
  },

  #[error("No binding registered for {capability}")]
  UnknownCapability { capability: Capability },

  #[error("{required_by} resolved {capability}, which is not among its declared dependencies")]
  UndeclaredDependency {
    capability: Capability,
    required_by: Capability,
  },

  #[error("Instance bound to {capability} is not a {expected}")]
  InstanceTypeMismatch {
    capability: Capability,
    expected: &'static str,
  },

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Missing configuration value at '{path}'")]
  MissingConfigValue { path: String },

  #[error("Invalid configuration value for '{path}': {message}")]
  InvalidConfigValue { path: String, message: String },
}

impl Error {
  /// The capability the error is about, when there is a single one.
  pub fn capability(&self) -> Option<&Capability> {
    match self {
      Error::UnresolvableCapability { capability, .. }
      | Error::UndeclaredDependency { capability, .. }
      | Error::ConstructionFailed { capability, .. }
      | Error::DuplicateCapability { capability, .. }
      | Error::UnknownCapability { capability }
      | Error::InstanceTypeMismatch { capability, .. } => Some(capability),
      Error::CyclicDependency { cycle } => cycle.first(),
      _ => None,
    }
  }
}

fn display_cycle(cycle: &[Capability]) -> String {
  cycle
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(" -> ")
}

/// A specialized `Result` type for `fibre_bridge` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
