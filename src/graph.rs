//! Registration-time cycle detection over constructor parameter-type edges.

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::{Adapter, Dependency, Key, Source, TypeInfo};
use crate::errors::{CyclePath, Error};

/// Checks the constructors being submitted against the registry as of this
/// register call. A parameter type with no registered constructor is a leaf;
/// only whichever dependencies already exist are walked, so a cycle that a
/// later registration would close is not detected retroactively.
pub(crate) fn assert_no_cycle(
  entries: &DashMap<Key, Dependency>,
  incoming: &[Dependency],
) -> Result<(), Error> {
  for dep in incoming {
    let Source::Ctor(adapter) = &dep.source else {
      continue;
    };
    // The path opens with the new constructor's declared outputs.
    walk(entries, adapter, adapter.outputs.clone())?;
  }
  Ok(())
}

/// Walks the declared inputs of `adapter`, threading the path explicitly so
/// the cycle error can report the full ordered type chain. The path is
/// snapshotted per recursion; sibling inputs accumulate within one frame.
fn walk(
  entries: &DashMap<Key, Dependency>,
  adapter: &Adapter,
  mut path: Vec<TypeInfo>,
) -> Result<(), Error> {
  for input in &adapter.params {
    if path.iter().any(|seen| seen.id == input.id) {
      path.push(*input);
      return Err(Error::CycleDependency(CyclePath { path }));
    }
    path.push(*input);

    // Dependencies are looked up untagged, same as the resolve path.
    let next = match entries.get(&Key::of(*input, None)) {
      Some(found) => match &found.source {
        Source::Ctor(next) => Arc::clone(next),
        Source::Literal(_) => continue,
      },
      None => continue,
    };
    walk(entries, &next, path.clone())?;
  }
  Ok(())
}
