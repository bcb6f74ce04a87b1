use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::hash::hash_with_type;

/// A dynamically typed value, as produced by attribute generators and passed
/// as attribute arguments.
///
/// A `Value` is an owned tree: sequences and maps contain their children by
/// value, so reference cycles are unrepresentable and [freezing] always
/// terminates.
///
/// # Equality and hashing
/// Values are compared structurally. Maps preserve insertion order and two
/// maps are equal only if their entry sequences are equal. Floats hash by bit
/// pattern with `-0.0` normalized to `0.0`, so `a == b` implies equal hashes.
///
/// [freezing]: crate::freeze
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A text string.
    Str(String),
    /// An ordered sequence of values.
    Seq(Vec<Value>),
    /// An insertion-ordered mapping from values to values.
    Map(Vec<(Value, Value)>),
    /// An opaque host value. See [`Opaque`].
    Opaque(Opaque),
}

impl Value {
    /// Create a sequence from an iterator of values.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Create a map from an iterator of key-value pairs, preserving order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Wrap an arbitrary host value. See [`Opaque`].
    pub fn opaque<T: Any + Hash + Send + Sync>(value: T) -> Self {
        Self::Opaque(Opaque::new(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::seq(items)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => float_bits(*v).hash(state),
            Self::Str(v) => v.hash(state),
            Self::Seq(v) => v.hash(state),
            Self::Map(v) => v.hash(state),
            Self::Opaque(v) => v.hash(state),
        }
    }
}

/// The bit pattern a float hashes as. Folds `-0.0` into `0.0` so that equal
/// floats produce equal hashes.
pub(crate) fn float_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

/// An opaque host value with a precomputed hash.
///
/// This is the escape hatch for composite values that the [`Value`] model
/// does not describe. The value is moved behind an [`Arc`] when wrapped,
/// which makes it immutable from the outside; its interior is deliberately
/// not frozen any deeper (a one-level shallow guarantee).
///
/// The hash covers the value's [`TypeId`](std::any::TypeId) and its `Hash`
/// output. Equality compares by hash, relying on the quality of the 128-bit
/// hash to make collisions between distinct values vanishingly unlikely.
#[derive(Clone)]
pub struct Opaque {
    /// The precomputed hash.
    hash: u128,
    /// The wrapped value.
    value: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Move a value behind an immutable wrapper, precomputing its hash.
    pub fn new<T: Any + Hash + Send + Sync>(value: T) -> Self {
        Self { hash: hash_with_type(&value), value: Arc::new(value) }
    }

    /// Access the wrapped value, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Whether two wrappers share the same underlying allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Debug for Opaque {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("Opaque(..)")
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Hash for Opaque {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u128(self.hash);
    }
}
