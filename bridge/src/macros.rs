//! Public macros.

/// Lets an implementation type be bound to one or more trait-object
/// capabilities with `bind::<dyn Trait>().to::<Impl>()`.
///
/// # Examples
///
/// ```
/// use fibre_bridge::{bind, implements, BoxError, Dependencies, Injectable};
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// struct EnglishGreeter;
///
/// impl Greeter for EnglishGreeter {
///   fn greet(&self) -> String {
///     "Hello!".to_string()
///   }
/// }
///
/// impl Injectable for EnglishGreeter {
///   fn construct(_: &Dependencies<'_>) -> Result<Self, BoxError> {
///     Ok(EnglishGreeter)
///   }
/// }
///
/// implements!(EnglishGreeter => dyn Greeter);
///
/// let declaration = bind::<dyn Greeter>().to::<EnglishGreeter>().as_singleton();
/// assert!(declaration.capability().is::<dyn Greeter>());
/// ```
#[macro_export]
macro_rules! implements {
  ($impl_ty:ty => $($capability:ty),+ $(,)?) => {
    $(
      impl $crate::Implements<$capability> for $impl_ty {
        fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$capability> {
          self
        }
      }
    )+
  };
}
