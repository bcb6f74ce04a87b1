//! Memoized, deep-frozen attributes for instances and types.
//!
//! A type declares named attributes: a fixed value, a zero-argument
//! generator, or an argument-taking generator. Each attribute is computed at
//! most once per owner (and, for argument-taking attributes, per distinct
//! argument tuple), deep-frozen into an immutable snapshot, and cached for
//! the owner's lifetime. Owners come in two scopes with independent caches:
//! every instance, and the type itself acting as a pseudo-instance. A single
//! lock per owner serializes all computation, so concurrent callers never run
//! the same generator twice and never observe a partially written cache.
//!
//! ```
//! use memoattr::{AttrCell, Scope, Value, attributes};
//!
//! struct Server {
//!     attrs: AttrCell,
//!     port: i64,
//! }
//!
//! #[attributes]
//! impl Server {
//!     /// The protocol version.
//!     fn version() -> Value {
//!         Value::from(2)
//!     }
//!
//!     /// The address this server binds, computed once per instance.
//!     fn address(owner: Scope<Self>) -> Value {
//!         match owner.instance() {
//!             Some(server) => Value::from(format!("0.0.0.0:{}", server.port)),
//!             None => Value::Null,
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), memoattr::AttrError> {
//! let server = Server { attrs: AttrCell::new(), port: 8080 };
//! let address = server.address()?;
//! assert_eq!(address.as_str(), Some("0.0.0.0:8080"));
//!
//! // The second access returns the cached snapshot itself.
//! assert!(server.address()?.ptr_eq(&address));
//!
//! // The type scope caches independently.
//! assert!(Server::type_address()?.is_null());
//! # Ok(())
//! # }
//! ```

mod def;
mod error;
mod freeze;
mod hash;
mod owner;
mod store;
#[cfg(feature = "testing")]
pub mod testing;
mod value;

pub use crate::def::{Definitions, Scope};
pub use crate::error::AttrError;
pub use crate::freeze::{FrozenMap, FrozenValue, freeze};
pub use crate::owner::{Memoize, access_instance, access_type};
pub use crate::store::AttrCell;
pub use crate::value::{Opaque, Value};

#[cfg(feature = "macros")]
pub use memoattr_macros::attributes;

/// These are implementation details. Do not rely on them!
#[doc(hidden)]
pub mod internal {
    pub use crate::hash::hash;
    pub use crate::owner::{access_instance, access_type};
}
