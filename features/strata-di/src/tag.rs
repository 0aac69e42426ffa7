use std::{convert::Infallible, fmt, marker::PhantomData};

use crate::{expression::Arguments, provider::Component};

/// A marker type distinct for every `Tag` and `T` pair
///
/// Tagging is idempotent: `Token::tagged::<Collection, Bar>()` always yields the same token,
/// while `Token::tagged::<Collection, Foo>()` and `Token::tagged::<Other, Bar>()` are different
/// ones. Unbound tagged tokens resolve to an empty `Tagged` value, so they are usually bound
/// to a real value with [crate::Provider::value] or [crate::Provider::from_fn].
///
/// ```rust
/// use strata_di::{Token, Provider, Resolver};
///
/// struct Plugins;
/// struct Http;
///
/// let resolver = Resolver::new();
/// resolver.provide(Provider::value(Token::tagged::<Plugins, Http>(), vec!["gzip", "cors"]));
/// ```
pub struct Tagged<Tag: ?Sized, T: ?Sized>(PhantomData<fn() -> (*const Tag, *const T)>);

impl<Tag: ?Sized, T: ?Sized> Default for Tagged<Tag, T> {
    fn default() -> Self {
        Tagged(PhantomData)
    }
}
impl<Tag: ?Sized, T: ?Sized> fmt::Debug for Tagged<Tag, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            std::any::type_name::<Tag>(),
            std::any::type_name::<T>()
        )
    }
}

impl<Tag: ?Sized + 'static, T: ?Sized + 'static> Component for Tagged<Tag, T> {
    type Provides = Tagged<Tag, T>;

    async fn construct(_args: Arguments) -> Result<Self::Provides, Infallible> {
        Ok(Tagged::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::token::Token;

    struct Collection;
    struct Other;
    struct Foo;
    struct Bar;

    #[test]
    fn tagging_is_idempotent_and_distinct() {
        assert_eq!(
            Token::tagged::<Collection, Bar>(),
            Token::tagged::<Collection, Bar>()
        );
        assert_ne!(
            Token::tagged::<Collection, Bar>(),
            Token::tagged::<Collection, Foo>()
        );
        assert_ne!(
            Token::tagged::<Collection, Bar>(),
            Token::tagged::<Other, Bar>()
        );
        assert_ne!(Token::tagged::<Collection, Bar>(), Token::marker::<Bar>());
    }
}
