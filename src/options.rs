//! Registration-time option directives and their application.
//!
//! Options are merged into a [`RegisterOptions`] by the builder methods on
//! [`Construct`](crate::Construct) and applied to each Key/Dependency pair
//! right before it is committed to the registry.

use std::sync::Arc;

use crate::core::{Adapter, AnyValue, Dependency, Key, Source, TypeInfo};
use crate::errors::Error;

pub(crate) type CoerceFn = Box<dyn Fn(&AnyValue) -> Result<AnyValue, Error> + Send + Sync>;

/// An "exposed as trait" directive: the trait's type identity, the concrete
/// type the coercion expects as the constructor's first output, and the
/// erased unsizing coercion itself.
pub(crate) struct Expose {
  pub(crate) target: TypeInfo,
  pub(crate) concrete: TypeInfo,
  pub(crate) coerce: CoerceFn,
}

/// Merged option directives for one registration.
#[derive(Default)]
pub(crate) struct RegisterOptions {
  pub(crate) tag: Option<String>,
  pub(crate) cache: Option<bool>,
  pub(crate) exposed_as: Option<TypeInfo>,
}

impl RegisterOptions {
  /// Mutates a Key/Dependency pair in place: fills in the tag where the key
  /// has none, rewrites the key's type to the exposed trait, and copies the
  /// caching override onto the record.
  pub(crate) fn apply(&self, key: &mut Key, dep: &mut Dependency) {
    if key.tag.is_none() {
      key.tag = self.tag.clone();
    }
    if let Some(target) = self.exposed_as {
      key.info = target;
    }
    dep.cache = self.cache;
  }
}

/// Rewrites the shared adapter of `deps` so its first output slot is coerced
/// to the exposed trait and relabeled with the trait's type.
///
/// Fails with `NotImplements` when the constructor's first declared output is
/// not the concrete type the coercion was written for.
pub(crate) fn apply_expose(deps: &mut [Dependency], expose: Expose) -> Result<(), Error> {
  let inner = deps
    .iter()
    .find_map(|dep| match &dep.source {
      Source::Ctor(adapter) => Some(adapter.clone()),
      Source::Literal(_) => None,
    })
    .ok_or(Error::InvalidFunction)?;

  let first = *inner.outputs.first().ok_or(Error::InvalidConstructor)?;
  if first.id != expose.concrete.id {
    return Err(Error::NotImplements {
      concrete: first,
      target: expose.target,
    });
  }

  let Expose { target, coerce, .. } = expose;
  let mut outputs = inner.outputs.clone();
  outputs[0] = target;

  let call_inner = inner.clone();
  let wrapped = Arc::new(Adapter {
    params: inner.params.clone(),
    outputs,
    call: Box::new(move |args| {
      let mut slots = (call_inner.call)(args)?;
      let slot = &mut slots[0];
      slot.value = coerce(&slot.value)?;
      slot.info = target;
      Ok(slots)
    }),
  });

  for dep in deps {
    if let Source::Ctor(adapter) = &mut dep.source {
      *adapter = wrapped.clone();
    }
  }
  Ok(())
}
