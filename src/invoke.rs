//! Invocation strategies and the closure adapter traits.
//!
//! `Ctor` and `Extractor` are what stands in for runtime reflection: they are
//! implemented for plain closures taking `Arc<Dep>` parameters, and hand the
//! container a uniform view of a callable (parameter types plus an erased
//! call over type-erased argument values).

use std::any::Any;
use std::sync::Arc;
use std::vec::IntoIter;

use crate::core::{erase, unerase, Adapter, AnyValue, Output, TypeInfo};
use crate::errors::Error;

/// How a constructor adapter is executed.
#[derive(Clone, Copy)]
pub(crate) enum Invoker {
  /// Run the constructor body for real.
  Default,
  /// Produce placeholder outputs labeled with the declared output types,
  /// without executing the constructor body. Used by whole-graph validation.
  Dry,
}

/// Placeholder value a dry run puts in every output slot.
struct DryValue;

impl Invoker {
  pub(crate) fn invoke(&self, adapter: &Adapter, args: Vec<AnyValue>) -> Result<Vec<Output>, Error> {
    match self {
      Invoker::Default => (adapter.call)(args),
      Invoker::Dry => Ok(
        adapter
          .outputs
          .iter()
          .map(|info| Output {
            info: *info,
            value: erase(DryValue),
          })
          .collect(),
      ),
    }
  }
}

fn next_arg<D: ?Sized + Any + Send + Sync>(args: &mut IntoIter<AnyValue>) -> Result<Arc<D>, Error> {
  let value = args.next().ok_or(Error::InvalidFunction)?;
  unerase::<D>(&value).map_err(|_| Error::InvalidFunction)
}

/// A constructor callable: a closure whose parameters are `Arc<Dep>` values
/// and whose return value declares its outputs.
///
/// Implemented for `Fn` closures of arity 0 through 8. `Args` and `Out` are
/// inferred from the closure's signature.
pub trait Ctor<Args, Out>: Send + Sync + 'static {
  /// Declared parameter types, in order.
  fn param_types() -> Vec<TypeInfo>;
  /// Invokes the callable with ordered, type-erased argument values.
  fn call(&self, args: Vec<AnyValue>) -> Result<Out, Error>;
}

macro_rules! impl_ctor {
  ($($dep:ident),*) => {
    impl<Fun, Out, $($dep),*> Ctor<($(Arc<$dep>,)*), Out> for Fun
    where
      Fun: Fn($(Arc<$dep>),*) -> Out + Send + Sync + 'static,
      Out: 'static,
      $($dep: ?Sized + Any + Send + Sync,)*
    {
      fn param_types() -> Vec<TypeInfo> {
        vec![$(TypeInfo::of::<$dep>()),*]
      }

      #[allow(unused_mut, unused_variables)]
      fn call(&self, args: Vec<AnyValue>) -> Result<Out, Error> {
        let mut args = args.into_iter();
        Ok((self)($(next_arg::<$dep>(&mut args)?),*))
      }
    }
  };
}

impl_ctor!();
impl_ctor!(D1);
impl_ctor!(D1, D2);
impl_ctor!(D1, D2, D3);
impl_ctor!(D1, D2, D3, D4);
impl_ctor!(D1, D2, D3, D4, D5);
impl_ctor!(D1, D2, D3, D4, D5, D6);
impl_ctor!(D1, D2, D3, D4, D5, D6, D7);
impl_ctor!(D1, D2, D3, D4, D5, D6, D7, D8);

/// A consumer callable for [`Container::extract`](crate::Container::extract):
/// every parameter is resolved as an untagged binding, and the return value
/// is discarded.
///
/// Implemented for `FnOnce` closures of arity 0 through 8.
pub trait Extractor<Args, Ret> {
  fn param_types() -> Vec<TypeInfo>;
  fn call(self, args: Vec<AnyValue>) -> Result<Ret, Error>;
}

macro_rules! impl_extractor {
  ($($dep:ident),*) => {
    impl<Fun, Ret, $($dep),*> Extractor<($(Arc<$dep>,)*), Ret> for Fun
    where
      Fun: FnOnce($(Arc<$dep>),*) -> Ret,
      $($dep: ?Sized + Any + Send + Sync,)*
    {
      fn param_types() -> Vec<TypeInfo> {
        vec![$(TypeInfo::of::<$dep>()),*]
      }

      #[allow(unused_mut, unused_variables)]
      fn call(self, args: Vec<AnyValue>) -> Result<Ret, Error> {
        let mut args = args.into_iter();
        Ok((self)($(next_arg::<$dep>(&mut args)?),*))
      }
    }
  };
}

impl_extractor!();
impl_extractor!(D1);
impl_extractor!(D1, D2);
impl_extractor!(D1, D2, D3);
impl_extractor!(D1, D2, D3, D4);
impl_extractor!(D1, D2, D3, D4, D5);
impl_extractor!(D1, D2, D3, D4, D5, D6);
impl_extractor!(D1, D2, D3, D4, D5, D6, D7);
impl_extractor!(D1, D2, D3, D4, D5, D6, D7, D8);
