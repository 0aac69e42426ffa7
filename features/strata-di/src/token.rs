use std::{
    fmt,
    hash::{Hash, Hasher},
};

use crate::{
    errors::ResolveError,
    provider::{Component, Provider},
    resolver::Scope,
    tag::Tagged,
    types::TypeInfo,
};

/// Identity of something that can be resolved
///
/// Tokens compare by the type they were created from, nothing else. A token created with
/// [Token::of] is constructor-like: when no provider is registered for it, a resolver binds it
/// to its own [Component] implementation. Tokens created with [Token::marker] have no
/// constructor and must be bound explicitly.
#[derive(Clone, Copy)]
pub struct Token {
    info: TypeInfo,
    kind: TokenKind,
}

#[derive(Clone, Copy)]
enum TokenKind {
    Component(fn() -> Provider),
    Marker,
    Scope,
}

impl Token {
    /// Token of a component, able to construct itself
    pub fn of<C: Component>() -> Token {
        Token {
            info: TypeInfo::of::<C>(),
            kind: TokenKind::Component(Provider::of::<C>),
        }
    }

    /// Pure identity token without a constructor
    pub fn marker<T: ?Sized + 'static>() -> Token {
        Token {
            info: TypeInfo::of::<T>(),
            kind: TokenKind::Marker,
        }
    }

    /// Token every resolver answers with a [Scope] handle on itself
    pub fn scope() -> Token {
        Token {
            info: TypeInfo::of::<Scope>(),
            kind: TokenKind::Scope,
        }
    }

    /// Distinct token for `T` tagged with `Tag`
    ///
    /// See [Tagged].
    pub fn tagged<Tag: ?Sized + 'static, T: ?Sized + 'static>() -> Token {
        Token::of::<Tagged<Tag, T>>()
    }

    pub fn info(&self) -> TypeInfo {
        self.info
    }

    pub fn type_name(&self) -> &'static str {
        self.info.type_name
    }

    pub fn is_scope(&self) -> bool {
        matches!(self.kind, TokenKind::Scope)
    }

    /// The provider a resolver falls back to when nothing is registered for this token
    pub(crate) fn default_provider(&self) -> Result<Provider, ResolveError> {
        match self.kind {
            TokenKind::Component(provider) => Ok(provider()),
            TokenKind::Scope => Ok(Provider::current_scope()),
            TokenKind::Marker => Err(ResolveError::UnsupportedToken(format!(
                "'{}' has no constructor and no provider was registered for it",
                self.info
            ))),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.info.type_id == other.info.type_id
    }
}
impl Eq for Token {}
impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.info.type_id.hash(state);
    }
}
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.info.type_name).finish()
    }
}
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock;

    #[test]
    fn identity_is_the_type() {
        assert_eq!(Token::marker::<Clock>(), Token::marker::<Clock>());
        assert_ne!(Token::marker::<Clock>(), Token::marker::<u8>());
        assert_eq!(Token::scope(), Token::marker::<Scope>());
        assert!(Token::scope().is_scope());
    }

    #[test]
    fn markers_cannot_construct_themselves() {
        match Token::marker::<Clock>().default_provider() {
            Err(ResolveError::UnsupportedToken(message)) => assert!(message.contains("Clock")),
            other => panic!("expected unsupported token, got {other:?}"),
        }
    }
}
