use std::collections::hash_map::Entry;
use std::fmt::{self, Debug, Formatter};

use rustc_hash::FxHashMap;

use crate::error::AttrError;
use crate::value::Value;

/// The owner context an attribute generator runs in.
///
/// An attribute is resolvable both on instances of its declaring type and on
/// the type itself, acting as a pseudo-instance with its own independent
/// cache. The generator receives the scope it is computing for.
pub enum Scope<'a, T> {
    /// The generator computes for a specific instance.
    Instance(&'a T),
    /// The generator computes for the type itself.
    Type,
}

impl<'a, T> Scope<'a, T> {
    /// The instance, if this is the instance scope.
    pub fn instance(self) -> Option<&'a T> {
        match self {
            Self::Instance(instance) => Some(instance),
            Self::Type => None,
        }
    }

    /// Whether this is the type scope.
    pub fn is_type(self) -> bool {
        matches!(self, Self::Type)
    }
}

impl<T> Copy for Scope<'_, T> {}

impl<T> Clone for Scope<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Debug for Scope<'_, T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Instance(_) => f.pad("Scope::Instance(..)"),
            Self::Type => f.pad("Scope::Type"),
        }
    }
}

/// A zero-argument generator.
type LazyFn<T> = Box<dyn Fn(Scope<T>) -> Result<Value, AttrError> + Send + Sync>;

/// An argument-taking generator.
type ParamFn<T> =
    Box<dyn Fn(Scope<T>, &[Value]) -> Result<Value, AttrError> + Send + Sync>;

/// How an attribute's value comes to be.
///
/// The kind is fixed once at declaration time. In particular, a parametrized
/// attribute of arity zero stays parametrized: it memoizes under the empty
/// argument key instead of occupying a store slot.
pub(crate) enum AttrKind<T> {
    /// A fixed value, frozen and cached on first access.
    Static(Value),
    /// Computed by a zero-argument generator, at most once per owner.
    Lazy(LazyFn<T>),
    /// Computed by an argument-taking generator, at most once per owner and
    /// distinct argument tuple.
    Parametrized {
        /// The number of arguments, fixed at declaration time.
        arity: usize,
        /// The generator.
        generator: ParamFn<T>,
    },
}

/// An immutable attribute recipe, shared by all owners of one type.
pub(crate) struct AttrDef<T> {
    pub name: &'static str,
    pub kind: AttrKind<T>,
}

/// The attribute definitions declared for one owner type.
///
/// Built once per type, at declaration time, and shared read-only by every
/// instance and by the type-scope pseudo-instance. The three `declare_*`
/// methods register exactly one kind per name; a second declaration under the
/// same name fails with [`AttrError::AlreadyDeclared`].
pub struct Definitions<T> {
    map: FxHashMap<&'static str, AttrDef<T>>,
}

impl<T> Definitions<T> {
    /// Create an empty set of definitions.
    pub fn new() -> Self {
        Self { map: FxHashMap::default() }
    }

    /// Declare an attribute with a fixed value.
    ///
    /// The value is deep-frozen and cached per owner on first access.
    pub fn declare_static(
        &mut self,
        name: &'static str,
        value: Value,
    ) -> Result<(), AttrError> {
        self.insert(name, AttrKind::Static(value))
    }

    /// Declare an attribute computed by a zero-argument generator.
    ///
    /// The generator runs at most once per owner; its frozen result is cached
    /// for the owner's lifetime.
    pub fn declare_lazy(
        &mut self,
        name: &'static str,
        generator: impl Fn(Scope<T>) -> Result<Value, AttrError> + Send + Sync + 'static,
    ) -> Result<(), AttrError> {
        self.insert(name, AttrKind::Lazy(Box::new(generator)))
    }

    /// Declare an attribute computed by an argument-taking generator.
    ///
    /// The generator runs at most once per owner and distinct argument tuple.
    /// Calls must supply exactly `arity` arguments.
    pub fn declare_parametrized(
        &mut self,
        name: &'static str,
        arity: usize,
        generator: impl Fn(Scope<T>, &[Value]) -> Result<Value, AttrError>
        + Send
        + Sync
        + 'static,
    ) -> Result<(), AttrError> {
        self.insert(name, AttrKind::Parametrized { arity, generator: Box::new(generator) })
    }

    fn insert(&mut self, name: &'static str, kind: AttrKind<T>) -> Result<(), AttrError> {
        match self.map.entry(name) {
            Entry::Occupied(_) => Err(AttrError::AlreadyDeclared { name }),
            Entry::Vacant(slot) => {
                slot.insert(AttrDef { name, kind });
                Ok(())
            }
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&AttrDef<T>> {
        self.map.get(name)
    }
}

impl<T> Default for Definitions<T> {
    fn default() -> Self {
        Self::new()
    }
}
