//! Keys and scopes shared by every stage of the bridge.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifies something that can be requested from an injector: a type,
/// optionally qualified with a name.
///
/// Equality and hashing only consider the `TypeId` and the name. The type name
/// is carried along so errors can say what was being looked for.
#[derive(Clone)]
pub struct Capability {
  type_id: TypeId,
  type_name: &'static str,
  name: Option<Arc<str>>,
}

impl Capability {
  /// The unqualified capability for `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: std::any::type_name::<T>(),
      name: None,
    }
  }

  /// The capability for `T` qualified with `name`.
  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self::of::<T>().with_name(name)
  }

  pub(crate) fn with_name(mut self, name: &str) -> Self {
    self.name = Some(Arc::from(name));
    self
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// Whether this capability was declared for `T`, regardless of its name.
  pub fn is<T: ?Sized + Any>(&self) -> bool {
    self.type_id == TypeId::of::<T>()
  }
}

impl PartialEq for Capability {
  fn eq(&self, other: &Self) -> bool {
    self.type_id == other.type_id && self.name == other.name
  }
}

impl Eq for Capability {}

impl Hash for Capability {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.type_id.hash(state);
    self.name.hash(state);
  }
}

impl fmt::Display for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{}(\"{}\")", self.type_name, name),
      None => f.write_str(self.type_name),
    }
  }
}

impl fmt::Debug for Capability {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "Capability({}, Name({}))", self.type_name, name),
      None => write!(f, "Capability({})", self.type_name),
    }
  }
}

/// Lifecycle policy of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
  /// One instance per container, constructed eagerly when the container is built.
  Singleton,
  /// A fresh instance on every resolution. This is what an unscoped binding gets.
  #[default]
  PerRequest,
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::Singleton => f.write_str("singleton"),
      Scope::PerRequest => f.write_str("per-request"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  trait Marker {}

  #[test]
  fn named_and_unnamed_keys_are_distinct() {
    let mut keys = HashSet::new();
    keys.insert(Capability::of::<String>());
    keys.insert(Capability::named::<String>("greeting"));
    keys.insert(Capability::named::<String>("greeting"));
    assert_eq!(keys.len(), 2);
  }

  #[test]
  fn display_includes_qualifier() {
    assert_eq!(Capability::of::<u32>().to_string(), "u32");
    assert_eq!(Capability::named::<u32>("port").to_string(), "u32(\"port\")");
    assert!(Capability::of::<dyn Marker>().to_string().contains("Marker"));
  }

  #[test]
  fn unscoped_defaults_to_per_request() {
    assert_eq!(Scope::default(), Scope::PerRequest);
  }
}
