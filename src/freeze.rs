use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::value::{Opaque, Value};

/// Recursively convert a computed value into an immutable snapshot.
///
/// Atomic kinds (null, booleans, integers, floats) pass through by value.
/// Strings, sequences, and maps become shared snapshots with all nested
/// contents frozen as well. Opaque values pass through unchanged, as wrapping
/// already made them immutable at one level.
///
/// This is a pure function. It consumes the freshly computed value, so no
/// other reference to the data can exist while it runs, and the owned tree
/// shape of [`Value`] guarantees termination.
pub fn freeze(value: Value) -> FrozenValue {
    match value {
        Value::Null => FrozenValue::Null,
        Value::Bool(v) => FrozenValue::Bool(v),
        Value::Int(v) => FrozenValue::Int(v),
        Value::Float(v) => FrozenValue::Float(v),
        Value::Str(v) => FrozenValue::Str(v.into()),
        Value::Seq(items) => {
            FrozenValue::Seq(items.into_iter().map(freeze).collect())
        }
        Value::Map(entries) => FrozenValue::Map(Arc::new(FrozenMap {
            entries: entries
                .into_iter()
                .map(|(k, v)| (freeze(k), freeze(v)))
                .collect(),
        })),
        Value::Opaque(opaque) => FrozenValue::Opaque(opaque),
    }
}

/// A recursively immutable snapshot of a computed value.
///
/// No mutating API exists on a frozen value or on anything reachable from
/// one; permanence of the snapshot is enforced by the type system. Cloning is
/// cheap, as all composite kinds are shared behind an [`Arc`].
#[derive(Clone, PartialEq)]
pub enum FrozenValue {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A shared text snapshot.
    Str(Arc<str>),
    /// A shared sequence snapshot with frozen elements.
    Seq(Arc<[FrozenValue]>),
    /// A shared map snapshot with frozen keys and values.
    Map(Arc<FrozenMap>),
    /// An opaque host value, immutable at one level. See [`Opaque`].
    Opaque(Opaque),
}

impl FrozenValue {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// The elements, if this is a sequence.
    pub fn as_seq(&self) -> Option<&[FrozenValue]> {
        match self {
            Self::Seq(v) => Some(v),
            _ => None,
        }
    }

    /// The map, if this is one.
    pub fn as_map(&self) -> Option<&FrozenMap> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// The opaque wrapper, if this is one.
    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Self::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Whether two frozen values are the same snapshot.
    ///
    /// Composite kinds compare by allocation identity, atomic kinds by value.
    /// This observes the sharing that caching produces: all callers of a
    /// cached attribute receive the same snapshot, not copies of it.
    pub fn ptr_eq(&self, other: &FrozenValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => Arc::ptr_eq(a, b),
            (Self::Seq(a), Self::Seq(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq<Value> for FrozenValue {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Null, Value::Null) => true,
            (Self::Bool(a), Value::Bool(b)) => a == b,
            (Self::Int(a), Value::Int(b)) => a == b,
            (Self::Float(a), Value::Float(b)) => a == b,
            (Self::Str(a), Value::Str(b)) => &**a == b.as_str(),
            (Self::Seq(a), Value::Seq(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (Self::Map(a), Value::Map(b)) => {
                a.entries.len() == b.len()
                    && a.entries
                        .iter()
                        .zip(b)
                        .all(|((k, v), (bk, bv))| k == bk && v == bv)
            }
            (Self::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq<FrozenValue> for Value {
    fn eq(&self, other: &FrozenValue) -> bool {
        other == self
    }
}

impl Hash for FrozenValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Mirrors the hash of the unfrozen value so that a thawed and a
        // frozen rendition of the same data agree.
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => crate::value::float_bits(*v).hash(state),
            Self::Str(v) => v.hash(state),
            Self::Seq(v) => v.hash(state),
            Self::Map(v) => v.entries.hash(state),
            Self::Opaque(v) => v.hash(state),
        }
    }
}

/// An immutable, insertion-ordered map snapshot.
#[derive(Debug, PartialEq)]
pub struct FrozenMap {
    entries: Vec<(FrozenValue, FrozenValue)>,
}

impl FrozenMap {
    /// Look up the value cached under a key.
    pub fn get(&self, key: &Value) -> Option<&FrozenValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the map contains a key.
    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FrozenValue, &FrozenValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl Debug for FrozenValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Null => f.pad("Null"),
            Self::Bool(v) => Debug::fmt(v, f),
            Self::Int(v) => Debug::fmt(v, f),
            Self::Float(v) => Debug::fmt(v, f),
            Self::Str(v) => Debug::fmt(v, f),
            Self::Seq(v) => f.debug_list().entries(v.iter()).finish(),
            Self::Map(v) => f.debug_map().entries(v.iter()).finish(),
            Self::Opaque(v) => Debug::fmt(v, f),
        }
    }
}
