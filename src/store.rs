use std::fmt::{self, Debug, Formatter};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::def::{AttrDef, AttrKind, Scope};
use crate::error::AttrError;
use crate::freeze::{FrozenValue, freeze};
use crate::hash::key_of;
use crate::value::Value;

/// Per-owner attribute state: the synchronization guard and, behind it, the
/// lazily created store.
///
/// Every owner holds exactly one cell. Instances embed one as a field; the
/// type scope gets a `static` cell per type. The cell is const-constructible,
/// so owners pay nothing until the first attribute access.
///
/// The mutex is the owner's single guard: every read-compute-write sequence
/// for this owner runs inside it, including the generator invocation itself.
/// All attribute computation on one owner is therefore serialized, and a
/// generator must not access attributes of its own owner, as that would
/// deadlock.
pub struct AttrCell {
    store: Mutex<Option<Store>>,
}

impl AttrCell {
    /// Create an empty cell.
    pub const fn new() -> Self {
        Self { store: Mutex::new(None) }
    }
}

impl Default for AttrCell {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for AttrCell {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("AttrCell(..)")
    }
}

/// The cached results for one owner.
#[derive(Default)]
struct Store {
    /// Results of no-argument attributes, keyed by attribute name. A slot,
    /// once populated, is never overwritten or cleared.
    cached: FxHashMap<&'static str, FrozenValue>,
    /// Memoization tables for parametrized attributes, keyed by attribute
    /// name and argument-tuple hash. Tables appear lazily on the first
    /// parametrized call; entries, once written, are never overwritten.
    memoized: FxHashMap<&'static str, FxHashMap<u128, FrozenValue>>,
}

/// Resolve an attribute on one owner, computing and caching as needed.
///
/// The entire sequence runs under the owner's guard: consult the cache,
/// invoke the generator on a miss, freeze the result, write it back. If the
/// generator fails, nothing is written and the error propagates, so a later
/// access retries the computation.
pub(crate) fn access<T>(
    cell: &AttrCell,
    def: &AttrDef<T>,
    scope: Scope<'_, T>,
    args: &[Value],
) -> Result<FrozenValue, AttrError> {
    let mut guard = cell.store.lock();
    let store = guard.get_or_insert_with(Store::default);

    match &def.kind {
        AttrKind::Static(value) => {
            expect_no_args(def.name, args)?;
            if let Some(hit) = store.cached.get(def.name) {
                #[cfg(feature = "testing")]
                crate::testing::register_hit();
                return Ok(hit.clone());
            }

            let frozen = freeze(value.clone());
            store.cached.insert(def.name, frozen.clone());

            #[cfg(feature = "testing")]
            crate::testing::register_miss();
            Ok(frozen)
        }
        AttrKind::Lazy(generator) => {
            expect_no_args(def.name, args)?;
            if let Some(hit) = store.cached.get(def.name) {
                #[cfg(feature = "testing")]
                crate::testing::register_hit();
                return Ok(hit.clone());
            }

            let frozen = freeze(generator(scope)?);
            store.cached.insert(def.name, frozen.clone());

            #[cfg(feature = "testing")]
            crate::testing::register_miss();
            Ok(frozen)
        }
        AttrKind::Parametrized { arity, generator } => {
            if args.len() != *arity {
                return Err(AttrError::WrongArity {
                    name: def.name,
                    expected: *arity,
                    got: args.len(),
                });
            }

            let key = key_of(args);
            if let Some(hit) =
                store.memoized.get(def.name).and_then(|table| table.get(&key))
            {
                #[cfg(feature = "testing")]
                crate::testing::register_hit();
                return Ok(hit.clone());
            }

            let frozen = freeze(generator(scope, args)?);
            store
                .memoized
                .entry(def.name)
                .or_default()
                .insert(key, frozen.clone());

            #[cfg(feature = "testing")]
            crate::testing::register_miss();
            Ok(frozen)
        }
    }
}

/// Reject arguments supplied to a no-argument attribute.
fn expect_no_args(name: &'static str, args: &[Value]) -> Result<(), AttrError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(AttrError::WrongArity { name, expected: 0, got: args.len() })
    }
}
