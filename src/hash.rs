use std::any::Any;
use std::hash::Hash;

use siphasher::sip128::{Hasher128, SipHasher13};

use crate::value::Value;

/// Produce a 128-bit hash of a value.
#[inline]
pub fn hash<T: Hash + ?Sized>(value: &T) -> u128 {
    let mut state = SipHasher13::new();
    value.hash(&mut state);
    state.finish128().as_u128()
}

/// Produce a 128-bit hash of a value, including its type.
///
/// Mixing in the `TypeId` keeps two types with identical `Hash` output from
/// colliding when wrapped as opaque values.
#[inline]
pub(crate) fn hash_with_type<T: Any + Hash>(value: &T) -> u128 {
    let mut state = SipHasher13::new();
    value.type_id().hash(&mut state);
    value.hash(&mut state);
    state.finish128().as_u128()
}

/// Derive the memoization key for an ordered argument sequence.
///
/// Equal argument sequences always derive equal keys. Distinct sequences
/// alias only if the 128-bit hash collides. The slice hash writes the length
/// first, so a sequence can never collide with one of its prefixes.
#[inline]
pub(crate) fn key_of(args: &[Value]) -> u128 {
    hash(args)
}
