//! The [`Container`] and the resolution engine around it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::core::{unerase, Adapter, AnyValue, Dependency, Key, Output, Source};
use crate::errors::{ConstructError, Error, ValidationFailures};
use crate::graph;
use crate::invoke::{Extractor, Invoker};
use crate::options::apply_expose;
use crate::register::Registrable;

/// A registry of typed, optionally tagged bindings, able to materialize any
/// of them by recursively resolving and invoking constructors.
///
/// The container is thread-safe: the entry map is guarded per access, and no
/// guard is ever held across a recursive resolution or a user constructor
/// body. A single logical owner is still assumed; two resolves racing on the
/// same uncached binding may each invoke its constructor once.
pub struct Container {
  entries: DashMap<Key, Dependency>,
  cache: bool,
  invoker: Invoker,
}

impl Default for Container {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Container {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_struct("Container");
    for entry in self.entries.iter() {
      let state = match (&entry.value().source, &entry.value().instance) {
        (Source::Literal(_), _) => "literal",
        (Source::Ctor(_), Some(_)) => "cached",
        (Source::Ctor(_), None) => "registered",
      };
      map.field(entry.key().type_name(), &state);
    }
    map.finish()
  }
}

impl Container {
  /// Creates an empty container with instance caching enabled.
  pub fn new() -> Self {
    Self {
      entries: DashMap::new(),
      cache: true,
      invoker: Invoker::Default,
    }
  }

  /// Creates an empty container with the given default caching policy.
  /// Per-binding `cache` overrides still take precedence.
  pub fn with_cache(cache: bool) -> Self {
    Self {
      cache,
      ..Self::new()
    }
  }

  /// Registers one unit, adding a binding per declared output.
  ///
  /// Validates the unit, runs cycle detection against the current registry
  /// contents, applies option directives, and rejects keys that are already
  /// bound. No instance is constructed.
  pub fn register<R: Registrable>(&self, unit: R) -> Result<(), Error> {
    let mut registration = unit.into_registration()?;
    graph::assert_no_cycle(&self.entries, &registration.deps)?;
    if let Some(expose) = registration.expose.take() {
      apply_expose(&mut registration.deps, expose)?;
    }

    for (mut key, mut dep) in registration.keys.into_iter().zip(registration.deps) {
      // Error results are picked out of outputs inline, never bound.
      if key.is_error_capability() {
        continue;
      }
      registration.options.apply(&mut key, &mut dep);
      if let Source::Ctor(adapter) = &dep.source {
        if adapter.outputs.is_empty() {
          return Err(Error::InvalidConstructor);
        }
      }
      log::debug!("registering {key}");
      match self.entries.entry(key) {
        Entry::Occupied(present) => {
          return Err(Error::AlreadyRegistered(present.key().clone()));
        }
        Entry::Vacant(slot) => {
          slot.insert(dep);
        }
      }
    }
    Ok(())
  }

  /// Resolves the binding for `T` (plus tag), constructing it and its whole
  /// dependency chain if nothing is cached yet.
  pub fn resolve<T: ?Sized + Any + Send + Sync>(&self, tag: Option<&str>) -> Result<Arc<T>, Error> {
    let key = Key::new::<T>(tag);
    let value = self.resolve_value(&key)?;
    unerase::<T>(&value)
  }

  /// Resolves every parameter of `function` as an untagged binding and
  /// invokes it. Any resolution failure aborts before invocation; the
  /// closure's return value is discarded.
  pub fn extract<F, Args, Ret>(&self, function: F) -> Result<(), Error>
  where
    F: Extractor<Args, Ret>,
  {
    let params = F::param_types();
    let mut args = Vec::with_capacity(params.len());
    for param in params {
      args.push(self.resolve_value(&Key::of(param, None))?);
    }
    function.call(args)?;
    Ok(())
  }

  /// Resolves the binding for `T` (through the normal path, caching side
  /// effects included), applies `transform`, and pins the transformed value
  /// as the cached instance regardless of the caching policy. Subsequent
  /// resolves return the decorated value without re-invoking the constructor.
  pub fn decorate<T, F>(&self, tag: Option<&str>, transform: F) -> Result<(), Error>
  where
    T: ?Sized + Any + Send + Sync,
    F: FnOnce(Arc<T>) -> Result<Arc<T>, ConstructError>,
  {
    let key = Key::new::<T>(tag);
    if !self.entries.contains_key(&key) {
      return Err(Error::NotFoundRegister(key));
    }
    let current = unerase::<T>(&self.resolve_value(&key)?)?;
    let decorated = transform(current).map_err(Error::Construct)?;

    log::debug!("decorating {key}");
    let mut dep = self
      .entries
      .get_mut(&key)
      .ok_or_else(|| Error::NotFoundRegister(key.clone()))?;
    dep.instance = Some(Arc::new(decorated) as AnyValue);
    dep.cache = Some(true);
    Ok(())
  }

  /// Replays every constructor-backed binding's full dependency chain on a
  /// disposable copy of the registry, with caching disabled and the dry-run
  /// invoker, so missing bindings surface without executing constructor
  /// bodies. All failures are collected, not just the first.
  pub fn validate(&self) -> Result<(), Error> {
    let scratch = Container {
      entries: self
        .entries
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect(),
      cache: false,
      invoker: Invoker::Dry,
    };

    let targets: Vec<Arc<Adapter>> = self
      .entries
      .iter()
      .filter_map(|entry| match &entry.value().source {
        Source::Ctor(adapter) => Some(Arc::clone(adapter)),
        Source::Literal(_) => None,
      })
      .collect();

    let mut failures = Vec::new();
    for adapter in targets {
      if let Err(failure) = scratch.call(&adapter) {
        failures.push(failure);
      }
    }
    if failures.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation(ValidationFailures { failures }))
    }
  }

  // --- Resolution internals ---

  pub(crate) fn resolve_value(&self, key: &Key) -> Result<AnyValue, Error> {
    // Snapshot what the entry tells us, then drop the guard: recursion and
    // the constructor body must run without any map guard held.
    let adapter = {
      let dep = self
        .entries
        .get(key)
        .ok_or_else(|| Error::NotFoundRegister(key.clone()))?;
      match &dep.source {
        Source::Literal(value) => return Ok(value.clone()),
        Source::Ctor(adapter) => {
          if let Some(instance) = &dep.instance {
            return Ok(instance.clone());
          }
          Arc::clone(adapter)
        }
      }
    };

    log::trace!("constructing {key}");
    let outputs = self.call(&adapter)?;
    let picked = self.pick(key, &outputs)?;
    self.commit(key, &outputs)?;
    Ok(picked)
  }

  /// Resolves each parameter as an untagged binding (tags apply to the entry
  /// being resolved, never to its dependencies) and invokes the constructor
  /// through the active invoker.
  fn call(&self, adapter: &Adapter) -> Result<Vec<Output>, Error> {
    let mut args = Vec::with_capacity(adapter.params.len());
    for param in &adapter.params {
      args.push(self.resolve_value(&Key::of(*param, None))?);
    }
    self.invoker.invoke(adapter, args)
  }

  /// Picks the output for the requested key. On ties the LAST matching slot
  /// wins: deterministic, source-order dependent, and kept that way.
  fn pick(&self, key: &Key, outputs: &[Output]) -> Result<AnyValue, Error> {
    let mut picked = None;
    for output in outputs {
      if output.info.id == key.info.id {
        picked = Some(output.value.clone());
      }
    }
    picked.ok_or_else(|| Error::NotFoundRegister(key.clone()))
  }

  /// Caches every output into its own binding, keyed by the slot's declared
  /// type plus the requested key's tag. Every declared output must have been
  /// registered.
  fn commit(&self, requested: &Key, outputs: &[Output]) -> Result<(), Error> {
    for output in outputs {
      let key = Key::of(output.info, requested.tag.clone());
      let mut dep = self
        .entries
        .get_mut(&key)
        .ok_or_else(|| Error::NotFoundRegister(key.clone()))?;
      let keep = dep.cache.unwrap_or(self.cache);
      if keep {
        dep.instance = Some(output.value.clone());
      }
    }
    Ok(())
  }
}
