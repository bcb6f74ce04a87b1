use thiserror::Error;

/// An error produced while declaring or resolving an attribute.
///
/// All variants besides [`Generator`](Self::Generator) are configuration
/// errors: they indicate a declaration or call shape that can never succeed
/// and should be surfaced during development, not handled at runtime.
#[derive(Debug, Error)]
pub enum AttrError {
    /// An attribute was declared twice under the same name.
    #[error("attribute `{name}` is already declared")]
    AlreadyDeclared {
        /// The contested name.
        name: &'static str,
    },

    /// An accessor was invoked for a name that was never declared.
    #[error("attribute `{name}` is not declared")]
    Undeclared {
        /// The unknown name.
        name: String,
    },

    /// An accessor was invoked with the wrong number of arguments.
    #[error("attribute `{name}` takes {expected} argument(s), but {got} were supplied")]
    WrongArity {
        /// The attribute's name.
        name: &'static str,
        /// The arity fixed at declaration time.
        expected: usize,
        /// The number of arguments supplied at the call site.
        got: usize,
    },

    /// A user-supplied generator failed.
    ///
    /// The failure is propagated unchanged to the accessor's caller. It is
    /// never cached: the next access runs the generator again.
    #[error("{0}")]
    Generator(Box<dyn std::error::Error + Send + Sync>),
}

impl AttrError {
    /// Wrap a generator failure.
    pub fn generator(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Generator(err.into())
    }
}
