//! The fluent binding DSL: `bind::<T>().to…().in_scope(…)`.

use crate::capability::{Capability, Scope};
use crate::core::{erase, Dependencies, Dependency, Factory, Instance};
use crate::error::BoxError;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// --- Traits implemented by user types ---

/// A type the container can construct itself.
///
/// `dependencies` lists every capability `construct` resolves, which is what
/// lets the builder order eager construction.
pub trait Injectable: Sized + Send + Sync + 'static {
  fn dependencies() -> Vec<Dependency> {
    Vec::new()
  }

  fn construct(deps: &Dependencies<'_>) -> Result<Self, BoxError>;
}

/// A provider for `T`, invoked once for singletons and on every resolution
/// otherwise.
pub trait Provider<T: ?Sized>: Send + Sync + 'static {
  fn dependencies(&self) -> Vec<Dependency> {
    Vec::new()
  }

  fn get(&self, deps: &Dependencies<'_>) -> Result<Arc<T>, BoxError>;
}

/// Converts a constructed implementation into the capability it is bound to.
///
/// Every sized type implements it for itself. For trait objects use the
/// [`implements!`](crate::implements) macro.
pub trait Implements<T: ?Sized> {
  fn upcast(self: Arc<Self>) -> Arc<T>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
  fn upcast(self: Arc<Self>) -> Arc<T> {
    self
  }
}

// --- BindingKey ---

/// Starts a binding declaration for capability `T`.
pub fn bind<T: ?Sized + Any + Send + Sync>() -> BindingKey<T> {
  BindingKey {
    capability: Capability::of::<T>(),
    _marker: PhantomData,
  }
}

/// The left-hand side of a binding: which capability is being bound.
pub struct BindingKey<T: ?Sized> {
  capability: Capability,
  _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Any + Send + Sync> BindingKey<T> {
  /// Qualifies the capability with a name.
  pub fn qualified_with(self, name: &str) -> Self {
    Self {
      capability: self.capability.with_name(name),
      _marker: PhantomData,
    }
  }

  /// Binds to an implementation type constructed by the container.
  pub fn to<I>(self) -> BindingDeclaration
  where
    I: Injectable + Implements<T>,
  {
    let factory: Factory = Arc::new(|deps: &Dependencies<'_>| -> Result<Instance, BoxError> {
      let value = I::construct(deps)?;
      Ok(erase(<I as Implements<T>>::upcast(Arc::new(value))))
    });
    self.declare(Target::Implementation {
      type_name: std::any::type_name::<I>(),
      dependencies: I::dependencies(),
      factory,
    })
  }

  /// Binds to a provider whose `get` produces the instance.
  pub fn to_provider<P: Provider<T>>(self, provider: P) -> BindingDeclaration {
    let dependencies = provider.dependencies();
    let factory: Factory = Arc::new(move |deps: &Dependencies<'_>| -> Result<Instance, BoxError> {
      provider.get(deps).map(erase)
    });
    self.declare(Target::Provider {
      dependencies,
      factory,
    })
  }

  /// Binds to a closure. The closure must not resolve anything through its
  /// `Dependencies`; use [`Provider`] when it needs to.
  pub fn to_provider_fn<F>(self, provider: F) -> BindingDeclaration
  where
    F: Fn() -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
  {
    let factory: Factory = Arc::new(move |_: &Dependencies<'_>| -> Result<Instance, BoxError> {
      provider().map(erase)
    });
    self.declare(Target::Provider {
      dependencies: Vec::new(),
      factory,
    })
  }

  /// Binds to an already constructed instance. Instance bindings are always
  /// singletons.
  pub fn to_instance(self, instance: impl Into<Arc<T>>) -> BindingDeclaration {
    self.declare(Target::Instance(erase(instance.into())))
  }

  fn declare(self, target: Target) -> BindingDeclaration {
    let scope = match target {
      Target::Instance(_) => Scope::Singleton,
      _ => Scope::default(),
    };
    BindingDeclaration {
      capability: self.capability,
      target,
      scope,
    }
  }
}

impl<T: Injectable> BindingKey<T> {
  /// Binds `T` to itself.
  pub fn to_self(self) -> BindingDeclaration {
    self.to::<T>()
  }
}

// --- BindingDeclaration ---

#[derive(Clone)]
pub(crate) enum Target {
  Implementation {
    type_name: &'static str,
    dependencies: Vec<Dependency>,
    factory: Factory,
  },
  Provider {
    dependencies: Vec<Dependency>,
    factory: Factory,
  },
  Instance(Instance),
}

/// A complete binding: capability, target and scope.
///
/// Declarations are values; `in_scope` and friends return a new declaration.
#[derive(Clone)]
pub struct BindingDeclaration {
  pub(crate) capability: Capability,
  pub(crate) target: Target,
  pub(crate) scope: Scope,
}

impl BindingDeclaration {
  /// Sets the scope. Instance bindings stay singletons whatever is asked.
  pub fn in_scope(self, scope: Scope) -> Self {
    let scope = match self.target {
      Target::Instance(_) => Scope::Singleton,
      _ => scope,
    };
    Self { scope, ..self }
  }

  pub fn as_singleton(self) -> Self {
    self.in_scope(Scope::Singleton)
  }

  /// Every singleton is constructed eagerly, so this is the same as
  /// [`as_singleton`](Self::as_singleton).
  pub fn as_eager_singleton(self) -> Self {
    self.as_singleton()
  }

  pub fn capability(&self) -> &Capability {
    &self.capability
  }

  pub fn scope(&self) -> Scope {
    self.scope
  }

  pub fn dependencies(&self) -> &[Dependency] {
    match &self.target {
      Target::Implementation { dependencies, .. } | Target::Provider { dependencies, .. } => {
        dependencies.as_slice()
      }
      Target::Instance(_) => &[],
    }
  }
}

impl fmt::Debug for BindingDeclaration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let target = match &self.target {
      Target::Implementation { type_name, .. } => format!("Implementation({type_name})"),
      Target::Provider { .. } => "Provider".to_string(),
      Target::Instance(_) => "Instance".to_string(),
    };
    f.debug_struct("BindingDeclaration")
      .field("capability", &self.capability)
      .field("target", &target)
      .field("scope", &self.scope)
      .finish()
  }
}
