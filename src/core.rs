//! Core, non-public data structures for the resolution engine.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::errors::{ConstructError, Error};

/// A shared, type-erased value.
///
/// The contained concrete type is always an `Arc<T>`, never a bare `T`. This
/// keeps unsized `T` representable, so trait objects (`Arc<dyn Trait>`) can
/// live in the same map as concrete values and be recovered by a single
/// `downcast_ref::<Arc<T>>()`.
pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// Erases a sized value into an [`AnyValue`].
pub(crate) fn erase<T: Any + Send + Sync>(value: T) -> AnyValue {
  Arc::new(Arc::new(value))
}

/// Recovers an `Arc<T>` from an [`AnyValue`].
pub(crate) fn unerase<T: ?Sized + Any + Send + Sync>(value: &AnyValue) -> Result<Arc<T>, Error> {
  value
    .downcast_ref::<Arc<T>>()
    .cloned()
    .ok_or_else(|| Error::Downcast {
      requested: TypeInfo::of::<T>(),
    })
}

/// Type identity plus the human-readable name, for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
  pub(crate) id: TypeId,
  pub(crate) name: &'static str,
}

impl TypeInfo {
  pub fn of<T: ?Sized + 'static>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  /// The fully qualified name of the described type.
  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl fmt::Display for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeInfo({})", self.name)
  }
}

/// Identity of a registrable, resolvable binding: a type plus an optional tag.
///
/// Equality is exact type identity AND exact tag equality. `None` is the
/// distinct "no tag" value; `Some("")` is a valid tag of its own.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
  pub(crate) info: TypeInfo,
  pub(crate) tag: Option<String>,
}

impl Key {
  pub(crate) fn new<T: ?Sized + 'static>(tag: Option<&str>) -> Self {
    Self {
      info: TypeInfo::of::<T>(),
      tag: tag.map(str::to_owned),
    }
  }

  pub(crate) fn of(info: TypeInfo, tag: Option<String>) -> Self {
    Self { info, tag }
  }

  /// Error results are picked out of constructor outputs inline, so the
  /// error-capability type itself is never an independent binding.
  pub(crate) fn is_error_capability(&self) -> bool {
    self.info.id == TypeId::of::<ConstructError>()
  }

  pub fn type_name(&self) -> &'static str {
    self.info.name
  }

  pub fn tag(&self) -> Option<&str> {
    self.tag.as_deref()
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.tag {
      Some(tag) => write!(f, "type={}, tag={}", self.info.name, tag),
      None => write!(f, "type={}, tag=''", self.info.name),
    }
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.tag {
      Some(tag) => write!(f, "Key({}, Tag({}))", self.info.name, tag),
      None => write!(f, "Key({})", self.info.name),
    }
  }
}

/// One declared output slot of a constructor invocation.
///
/// `info` carries the declared (static) type rather than the runtime type of
/// `value`, which is what lets the dry-run invoker substitute placeholder
/// values and still drive pick/commit over the real type graph.
pub(crate) struct Output {
  pub(crate) info: TypeInfo,
  pub(crate) value: AnyValue,
}

impl Output {
  pub(crate) fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self {
      info: TypeInfo::of::<T>(),
      value: erase(value),
    }
  }
}

pub(crate) type CallFn = Box<dyn Fn(Vec<AnyValue>) -> Result<Vec<Output>, Error> + Send + Sync>;

/// Uniform constructor adapter built at registration time from a closure's
/// type signature: parameter types, declared output types, and an erased
/// call function. This is the crate's replacement for runtime reflection.
pub(crate) struct Adapter {
  pub(crate) params: Vec<TypeInfo>,
  pub(crate) outputs: Vec<TypeInfo>,
  pub(crate) call: CallFn,
}

/// What a binding resolves from.
#[derive(Clone)]
pub(crate) enum Source {
  /// A literal value, returned as-is on every resolution.
  Literal(AnyValue),
  /// A constructor, shared between all bindings it produces.
  Ctor(Arc<Adapter>),
}

/// The stored binding for one [`Key`].
#[derive(Clone)]
pub(crate) struct Dependency {
  pub(crate) source: Source,
  /// Cached instance, written by resolve commits and by decoration.
  pub(crate) instance: Option<AnyValue>,
  /// Per-binding caching override; `None` defers to the container default.
  pub(crate) cache: Option<bool>,
}

impl Dependency {
  pub(crate) fn literal(value: AnyValue) -> Self {
    Self {
      source: Source::Literal(value),
      instance: None,
      cache: None,
    }
  }

  pub(crate) fn ctor(adapter: Arc<Adapter>) -> Self {
    Self {
      source: Source::Ctor(adapter),
      instance: None,
      cache: None,
    }
  }
}
