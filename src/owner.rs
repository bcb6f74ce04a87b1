use crate::def::{Definitions, Scope};
use crate::error::AttrError;
use crate::freeze::FrozenValue;
use crate::store::{self, AttrCell};
use crate::value::Value;

/// A type with memoized, deep-frozen attributes.
///
/// Implemented by hand or, more commonly, generated by
/// [`#[attributes]`](macro@crate::attributes). The trait wires a type's
/// attribute declarations to the two per-owner state cells the engine needs:
/// one embedded in each instance and one `static` for the type scope.
pub trait Memoize: Sized + 'static {
    /// The attribute definitions declared for this type.
    ///
    /// Built once and shared read-only by all owners.
    fn definitions() -> &'static Definitions<Self>;

    /// The cell holding this instance's attribute state.
    fn attr_cell(&self) -> &AttrCell;

    /// The cell holding the type-scope attribute state.
    fn type_cell() -> &'static AttrCell;
}

/// Resolve attribute `name` on an instance.
///
/// On the first access (per distinct argument tuple, for parametrized
/// attributes) the generator runs and its deep-frozen result is cached in the
/// instance's cell; later accesses return the cached snapshot without
/// invoking the generator. Fails with [`AttrError::Undeclared`] for unknown
/// names and propagates generator failures unchanged.
pub fn access_instance<T: Memoize>(
    instance: &T,
    name: &str,
    args: &[Value],
) -> Result<FrozenValue, AttrError> {
    let def = T::definitions()
        .get(name)
        .ok_or_else(|| AttrError::Undeclared { name: name.into() })?;
    store::access(instance.attr_cell(), def, Scope::Instance(instance), args)
}

/// Resolve attribute `name` on the type itself.
///
/// The type acts as a pseudo-instance with its own cache, fully independent
/// of every instance's cache. Otherwise behaves like [`access_instance`].
pub fn access_type<T: Memoize>(
    name: &str,
    args: &[Value],
) -> Result<FrozenValue, AttrError> {
    let def = T::definitions()
        .get(name)
        .ok_or_else(|| AttrError::Undeclared { name: name.into() })?;
    store::access(T::type_cell(), def, Scope::Type, args)
}
