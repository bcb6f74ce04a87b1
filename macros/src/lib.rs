extern crate proc_macro;

macro_rules! bail {
    ($item:expr, $fmt:literal $($tts:tt)*) => {
        return Err(Error::new_spanned(
            &$item,
            format!(concat!("memoattr: ", $fmt) $($tts)*)
        ))
    }
}

mod attributes;

use proc_macro::TokenStream;
use syn::{Error, Result};

/// Declare memoized, deep-frozen attributes on a type.
///
/// Applied to a non-generic inherent impl block in which every function
/// declares one attribute:
///
/// ```ignore
/// struct Server {
///     attrs: AttrCell,
///     port: i64,
/// }
///
/// #[attributes]
/// impl Server {
///     /// A fixed value, frozen and cached per owner.
///     fn version() -> Value {
///         Value::from(2)
///     }
///
///     /// Computed at most once per owner.
///     fn address(owner: Scope<Self>) -> Value {
///         match owner.instance() {
///             Some(server) => Value::from(format!("0.0.0.0:{}", server.port)),
///             None => Value::Null,
///         }
///     }
///
///     /// Computed at most once per owner and distinct argument tuple.
///     fn region_servers(owner: Scope<Self>, region: Value) -> Value {
///         // ...
///         # Value::Null
///     }
/// }
/// ```
///
/// A function without parameters declares a static attribute. A function
/// whose only parameter is `Scope<Self>` declares a lazy attribute. Further
/// parameters, which must be of type `Value`, make the attribute
/// parametrized with that arity. Generators may also return
/// `Result<Value, AttrError>`; failures propagate to the accessor's caller
/// and are never cached.
///
/// For each attribute the macro generates two accessors with the declared
/// function's visibility and documentation: an instance method
/// (`server.address()`) caching in the instance's cell, and an associated
/// function (`Server::type_address()`) caching in the type's own cell. It
/// also implements the `Memoize` trait, wiring up the per-instance cell
/// (the field named `attrs` by default, or the one named via
/// `#[attributes(cell = field)]`) and a per-type static cell.
#[proc_macro_attribute]
pub fn attributes(args: TokenStream, stream: TokenStream) -> TokenStream {
    let config = syn::parse_macro_input!(args as attributes::Config);
    let block = syn::parse_macro_input!(stream as syn::ItemImpl);
    attributes::expand(&config, &block)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
