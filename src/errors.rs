//! Error taxonomy for registration, resolution and validation.
//!
//! Every failure here is terminal: this is wiring-time/construction-time
//! breakage, not transient I/O, so nothing is retried internally.

use std::fmt;

use thiserror::Error;

use crate::core::{Key, TypeInfo};

/// The error-capability type a constructor may produce through its `Result`
/// output. A constructor `Err` of this type surfaces unwrapped as the
/// resolve call's own error.
pub type ConstructError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
  /// A second registration produced a key that is already present.
  #[error("already registered: {0}")]
  AlreadyRegistered(Key),

  /// Resolution or commit against a key with no binding.
  #[error("not found register: {0}")]
  NotFoundRegister(Key),

  /// An adapter was handed an argument that does not match its declared
  /// parameter list.
  #[error("invalid value. must be function")]
  InvalidFunction,

  /// A constructor declared zero outputs.
  #[error("invalid constructor. must declare at least one output")]
  InvalidConstructor,

  /// The first declared output of an exposed constructor is not the
  /// concrete type the coercion expects.
  #[error("not implements: {concrete} cannot be exposed as {target}")]
  NotImplements {
    concrete: TypeInfo,
    target: TypeInfo,
  },

  /// A registration would close a directed cycle in the parameter-type graph.
  #[error(transparent)]
  CycleDependency(CyclePath),

  /// Aggregate of every per-binding failure found by a dry-run validation.
  #[error(transparent)]
  Validation(ValidationFailures),

  /// An application error produced by a constructor itself, surfaced
  /// unwrapped as the resolve call's own failure.
  #[error("{0}")]
  Construct(ConstructError),

  /// A resolved value did not contain the requested type.
  #[error("failed to downcast resolved value to {requested}")]
  Downcast { requested: TypeInfo },
}

/// The ordered list of types forming a rejected dependency cycle.
#[derive(Debug, Clone)]
pub struct CyclePath {
  pub(crate) path: Vec<TypeInfo>,
}

impl CyclePath {
  /// The cycle, outermost type first, in the order the walk discovered it.
  pub fn types(&self) -> impl Iterator<Item = &'static str> + '_ {
    self.path.iter().map(|info| info.name)
  }
}

impl fmt::Display for CyclePath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Rendered innermost-first, indented one space per level of depth.
    let mut lines = Vec::with_capacity(self.path.len() + 1);
    lines.push("cycle dependency error.".to_string());
    for (depth, info) in self.path.iter().rev().enumerate() {
      lines.push(format!("{}{}", " ".repeat(depth), info.name));
    }
    f.write_str(&lines.join("\n"))
  }
}

impl std::error::Error for CyclePath {}

/// Every failure a whole-graph validation pass collected.
#[derive(Debug)]
pub struct ValidationFailures {
  pub(crate) failures: Vec<Error>,
}

impl ValidationFailures {
  pub fn failures(&self) -> &[Error] {
    &self.failures
  }
}

impl fmt::Display for ValidationFailures {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("validation error:")?;
    for failure in &self.failures {
      write!(f, "\n\t{}", failure)?;
    }
    Ok(())
  }
}

impl std::error::Error for ValidationFailures {}
