use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{token::Token, types::DynError};

/// Errors while resolving a request
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// The value is neither a constructor-like token nor a recognized expression
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),
    /// A token was required but the slot was empty
    #[error("Undefined token at '{0}'")]
    UndefinedToken(String),
    /// The declared dependencies loop back onto themselves
    #[error("A circular dependency exists: {}", display_chain(.chain))]
    CyclicDependency { chain: Vec<Token> },
    /// A constructor failed, its error is passed through as is
    #[error(transparent)]
    InstantiationFailure(ConstructorError),
    /// The resolved instance is not of the requested type
    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

fn display_chain(chain: &[Token]) -> String {
    chain
        .iter()
        .map(|token| token.type_name())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The error a constructor returned
///
/// Display and source are the constructor's own, the original can be recovered with
/// [ConstructorError::downcast_ref].
#[derive(Clone)]
pub struct ConstructorError(Arc<DynError>);
impl ConstructorError {
    pub(crate) fn new(error: DynError) -> Self {
        Self(Arc::new(error))
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &**self.0
    }
}
impl fmt::Debug for ConstructorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.inner(), f)
    }
}
impl fmt::Display for ConstructorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.inner(), f)
    }
}
impl std::error::Error for ConstructorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner().source()
    }
}

/// Errors when reading resolved arguments
#[derive(Error, Debug, Clone)]
pub enum ArgumentError {
    #[error("Expected {expected} but found {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("No argument at position {0}")]
    MissingIndex(usize),
    #[error("No argument named '{0}'")]
    MissingKey(String),
    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("database is down")]
    struct DatabaseDown;

    #[test]
    fn constructor_errors_pass_through() {
        let error =
            ResolveError::InstantiationFailure(ConstructorError::new(Box::new(DatabaseDown)));

        assert_eq!(error.to_string(), "database is down");
        match error {
            ResolveError::InstantiationFailure(inner) => {
                assert!(inner.downcast_ref::<DatabaseDown>().is_some())
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
