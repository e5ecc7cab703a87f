//! The global container instance and its access function.

use once_cell::sync::Lazy;

use crate::container::Container;

// The one and only global container instance, created on first access in a
// thread-safe manner.
static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::default);

/// Provides a reference to the global container instance.
///
/// This is the ambient carrier: call sites that cannot thread an explicit
/// [`Container`] handle through every layer register and resolve against this
/// single well-known instance instead. Explicit containers stay wholly
/// independent of it.
///
/// # Examples
///
/// ```
/// use tether_ioc::{global, literal};
///
/// fn register_services() {
///   global()
///     .register(literal(String::from("Hello from global!"), Some("banner")))
///     .unwrap();
/// }
/// ```
pub fn global() -> &'static Container {
  &GLOBAL_CONTAINER
}
