//! Registrable units: constructors and literal values, plus the option
//! builder methods applied to them at registration.

use std::any::Any;
use std::sync::Arc;

use crate::core::{erase, unerase, Adapter, AnyValue, CallFn, Dependency, Key, Output, TypeInfo};
use crate::errors::{ConstructError, Error};
use crate::invoke::Ctor;
use crate::options::{Expose, RegisterOptions};

/// The output declaration of a multi-output constructor: a tuple whose every
/// element becomes its own binding.
pub trait OutputTuple: 'static {
  fn output_types() -> Vec<TypeInfo>;
  #[doc(hidden)]
  fn into_outputs(self) -> Vec<Output>;
}

macro_rules! impl_output_tuple {
  ($($out:ident : $idx:tt),+) => {
    impl<$($out: Any + Send + Sync),+> OutputTuple for ($($out,)+) {
      fn output_types() -> Vec<TypeInfo> {
        vec![$(TypeInfo::of::<$out>()),+]
      }

      fn into_outputs(self) -> Vec<Output> {
        vec![$(Output::new(self.$idx)),+]
      }
    }
  };
}

impl_output_tuple!(O1: 0, O2: 1);
impl_output_tuple!(O1: 0, O2: 1, O3: 2);
impl_output_tuple!(O1: 0, O2: 1, O3: 2, O4: 3);

/// Everything the container needs to commit one registrable unit: the
/// derived keys, one dependency record per key, and the merged options.
pub struct Registration {
  pub(crate) keys: Vec<Key>,
  pub(crate) deps: Vec<Dependency>,
  pub(crate) expose: Option<Expose>,
  pub(crate) options: RegisterOptions,
}

/// A unit acceptable to [`Container::register`](crate::Container::register).
pub trait Registrable {
  fn into_registration(self) -> Result<Registration, Error>;
}

/// A constructor-backed registrable unit, produced by [`construct`] and its
/// variants. Option directives are chained before registration:
///
/// ```
/// use tether_ioc::{construct, Container};
///
/// struct Port(u16);
///
/// let container = Container::new();
/// container
///   .register(construct(|| Port(8080)).tag("admin").cache(false))
///   .unwrap();
/// ```
pub struct Construct {
  adapter: Adapter,
  tag: Option<String>,
  cache: Option<bool>,
  expose: Option<Expose>,
}

impl Construct {
  fn new(params: Vec<TypeInfo>, outputs: Vec<TypeInfo>, call: CallFn) -> Self {
    Self {
      adapter: Adapter {
        params,
        outputs,
        call,
      },
      tag: None,
      cache: None,
      expose: None,
    }
  }

  /// Tags every binding this unit produces, so multiple registrations of the
  /// same type can coexist.
  pub fn tag(mut self, tag: impl Into<String>) -> Self {
    self.tag = Some(tag.into());
    self
  }

  /// Overrides the container's default caching policy for these bindings.
  pub fn cache(mut self, enabled: bool) -> Self {
    self.cache = Some(enabled);
    self
  }

  /// Exposes the constructor's first output as a trait object, rewriting the
  /// binding's key to the trait. `coerce` is the unsizing step the registry
  /// cannot perform itself:
  ///
  /// ```
  /// use std::sync::Arc;
  /// use tether_ioc::{construct, Container};
  ///
  /// trait Greeter: Send + Sync {}
  /// struct English;
  /// impl Greeter for English {}
  ///
  /// let container = Container::new();
  /// container
  ///   .register(construct(|| English).implements(|e: Arc<English>| e as Arc<dyn Greeter>))
  ///   .unwrap();
  /// ```
  pub fn implements<T, I, F>(mut self, coerce: F) -> Self
  where
    T: ?Sized + Any + Send + Sync,
    I: ?Sized + Any + Send + Sync,
    F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
  {
    self.expose = Some(Expose {
      target: TypeInfo::of::<I>(),
      concrete: TypeInfo::of::<T>(),
      coerce: Box::new(move |value| {
        let concrete = unerase::<T>(value)?;
        Ok(Arc::new(coerce(concrete)) as AnyValue)
      }),
    });
    self
  }
}

impl Registrable for Construct {
  fn into_registration(self) -> Result<Registration, Error> {
    let exposed_as = self.expose.as_ref().map(|expose| expose.target);
    let adapter = Arc::new(self.adapter);
    // One untagged key and one record per declared output, all sharing the
    // same adapter. Tags and trait rewrites are applied by option merge.
    let keys = adapter
      .outputs
      .iter()
      .map(|info| Key::of(*info, None))
      .collect();
    let deps = adapter
      .outputs
      .iter()
      .map(|_| Dependency::ctor(adapter.clone()))
      .collect();
    Ok(Registration {
      keys,
      deps,
      expose: self.expose,
      options: RegisterOptions {
        tag: self.tag,
        cache: self.cache,
        exposed_as,
      },
    })
  }
}

/// A literal-value registrable unit produced by [`literal`]. Exactly one
/// binding: the value's concrete type plus the given tag.
pub struct Literal {
  key: Key,
  value: AnyValue,
}

impl Registrable for Literal {
  fn into_registration(self) -> Result<Registration, Error> {
    Ok(Registration {
      keys: vec![self.key],
      deps: vec![Dependency::literal(self.value)],
      expose: None,
      options: RegisterOptions::default(),
    })
  }
}

/// Wraps an infallible single-output constructor.
///
/// The closure's parameters are resolved recursively at resolution time; its
/// return value becomes the binding for `T`.
pub fn construct<F, Args, T>(ctor: F) -> Construct
where
  F: Ctor<Args, T>,
  T: Any + Send + Sync,
{
  Construct::new(
    F::param_types(),
    vec![TypeInfo::of::<T>()],
    Box::new(move |args| Ok(vec![Output::new(ctor.call(args)?)])),
  )
}

/// Wraps a fallible single-output constructor. An `Err` surfaces as the
/// resolve call's own error and is never cached.
pub fn try_construct<F, Args, T>(ctor: F) -> Construct
where
  F: Ctor<Args, Result<T, ConstructError>>,
  T: Any + Send + Sync,
{
  Construct::new(
    F::param_types(),
    vec![TypeInfo::of::<T>()],
    Box::new(move |args| match ctor.call(args)? {
      Ok(value) => Ok(vec![Output::new(value)]),
      Err(cause) => Err(Error::Construct(cause)),
    }),
  )
}

/// Wraps an infallible constructor declaring several outputs as a tuple.
/// Every tuple element becomes its own binding, and one invocation commits
/// all of them.
pub fn construct_multi<F, Args, O>(ctor: F) -> Construct
where
  F: Ctor<Args, O>,
  O: OutputTuple,
{
  Construct::new(
    F::param_types(),
    O::output_types(),
    Box::new(move |args| Ok(ctor.call(args)?.into_outputs())),
  )
}

/// Wraps a fallible multi-output constructor. An `Err` fails resolution of
/// every declared output.
pub fn try_construct_multi<F, Args, O>(ctor: F) -> Construct
where
  F: Ctor<Args, Result<O, ConstructError>>,
  O: OutputTuple,
{
  Construct::new(
    F::param_types(),
    O::output_types(),
    Box::new(move |args| match ctor.call(args)? {
      Ok(outputs) => Ok(outputs.into_outputs()),
      Err(cause) => Err(Error::Construct(cause)),
    }),
  )
}

/// Wraps an already-built value. Literals are returned as-is on every
/// resolution and are never invoked or cached.
///
/// The tag is supplied here rather than through an option: literals of the
/// same type can only be told apart by tag.
pub fn literal<T: Any + Send + Sync>(value: T, tag: Option<&str>) -> Literal {
  Literal {
    key: Key::new::<T>(tag),
    value: erase(value),
  }
}
