//! # Tether IoC
//!
//! A thread-safe object-graph resolver for Rust: a registry that maps typed,
//! optionally tagged keys to constructor closures or literal values, and that
//! can materialize any registered key by recursively resolving and invoking
//! its dependencies.
//!
//! ## Core Concepts
//!
//! - **Container**: the registry of bindings. [`global()`] exposes one
//!   process-wide instance for call sites that cannot thread a handle.
//! - **Constructors**: plain closures taking `Arc<Dep>` parameters, wrapped
//!   by [`construct`] / [`try_construct`] / [`construct_multi`] /
//!   [`try_construct_multi`]. Parameter and output types are inferred from
//!   the closure's signature; no reflection, no codegen.
//! - **Literals**: already-built values registered with [`literal`], returned
//!   as-is on every resolution.
//! - **Tags**: string discriminators allowing several bindings of one type.
//!   Tags identify the entry being resolved; dependency lookups are always
//!   untagged.
//! - **Caching**: resolved instances are cached by default; override per
//!   container (`Container::with_cache`) or per binding (`.cache(..)`).
//! - **Traits**: a constructor can be exposed as a trait object with
//!   `.implements(..)`, and resolved by the trait.
//! - **Validation**: [`Container::validate`] replays the whole graph with a
//!   dry-run invoker, surfacing every missing binding without running a
//!   single constructor body.
//!
//! Cycles in the constructor parameter graph are rejected at registration
//! time, with the full offending type path in the error.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tether_ioc::{construct, literal, Container};
//!
//! struct Config {
//!   url: String,
//! }
//!
//! struct Client {
//!   config: Arc<Config>,
//! }
//!
//! fn main() -> Result<(), tether_ioc::Error> {
//!   let container = Container::new();
//!
//!   container.register(construct(|| Config {
//!     url: "postgres://localhost:5432/app".to_string(),
//!   }))?;
//!   container.register(construct(|config: Arc<Config>| Client { config }))?;
//!   container.register(literal(3u32, Some("retries")))?;
//!
//!   // Nothing has been constructed yet; prove the graph is complete first.
//!   container.validate()?;
//!
//!   let client = container.resolve::<Client>(None)?;
//!   let retries = container.resolve::<u32>(Some("retries"))?;
//!
//!   assert_eq!(client.config.url, "postgres://localhost:5432/app");
//!   assert_eq!(*retries, 3);
//!   Ok(())
//! }
//! ```

mod container;
mod core;
mod errors;
mod global;
mod graph;
mod invoke;
mod options;
mod register;

pub use container::Container;
pub use self::core::{Key, TypeInfo};
pub use errors::{ConstructError, CyclePath, Error, ValidationFailures};
pub use global::global;
pub use invoke::{Ctor, Extractor};
pub use register::{
  construct, construct_multi, literal, try_construct, try_construct_multi, Construct, Literal,
  OutputTuple, Registrable, Registration,
};
