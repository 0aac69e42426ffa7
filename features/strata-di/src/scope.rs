//! Child scopes
//!
//! A child resolves locally only what it has to: its own overrides, and every token whose
//! dependencies transitively reach one of them. Anything else is delegated to the parent, which
//! caches it, so independent subtrees are built once and shared by all descendant scopes.

use std::collections::HashSet;

use futures::{future, FutureExt};

use crate::{
    errors::ResolveError,
    provider::Provider,
    resolver::Resolver,
    token::Token,
    types::Instance,
};

impl Resolver {
    pub(crate) fn resolve_in_child(
        &self,
        parent: &Resolver,
        token: Token,
    ) -> future::BoxFuture<'static, Result<Instance, ResolveError>> {
        if token.is_scope() {
            return future::ready(Ok(self.scope_instance())).boxed();
        }

        let local = self.state().providers.get(&token).cloned();
        if let Some(provider) = local {
            return self.resolve(provider);
        }

        if self.state().delegated.contains(&token) {
            tracing::trace!("{} is owned by the parent scope", token);
            return parent.resolve_token(token);
        }

        let provider = match parent.provider_for(token) {
            Ok(provider) => provider,
            Err(error) => return future::ready(Err(error)).boxed(),
        };

        match self.specializes(parent, &provider) {
            Ok(true) => {
                tracing::debug!("{} depends on an override, resolving in child scope", token);
                self.state().providers.insert(token, provider.clone());
                self.resolve(provider)
            }
            Ok(false) => {
                tracing::debug!("Delegating {} to the parent scope", token);
                self.state().delegated.insert(token);
                parent.resolve_token(token)
            }
            Err(error) => future::ready(Err(error)).boxed(),
        }
    }

    /// True if any dependency of the provider is overridden in this scope, directly or through
    /// its own dependencies
    ///
    /// Dependencies already known to belong to the parent are not walked again. A token met
    /// again while it is still being classified is a cycle.
    pub(crate) fn specializes(
        &self,
        parent: &Resolver,
        provider: &Provider,
    ) -> Result<bool, ResolveError> {
        let mut classifying = vec![provider.token()];
        let mut cleared = HashSet::new();
        return specializes_recurse(self, parent, provider, &mut classifying, &mut cleared);

        fn specializes_recurse(
            scope: &Resolver,
            parent: &Resolver,
            provider: &Provider,
            classifying: &mut Vec<Token>,
            cleared: &mut HashSet<Token>,
        ) -> Result<bool, ResolveError> {
            for dependency in provider.dependencies().tokens() {
                let (local, delegated) = {
                    let state = scope.state();
                    (
                        state.providers.contains_key(&dependency),
                        state.delegated.contains(&dependency),
                    )
                };

                if local {
                    return Ok(true);
                }
                if delegated || cleared.contains(&dependency) {
                    continue;
                }
                if classifying.contains(&dependency) {
                    classifying.push(dependency);
                    return Err(ResolveError::CyclicDependency {
                        chain: classifying.clone(),
                    });
                }

                let next = parent.provider_for(dependency)?;
                classifying.push(dependency);
                let specialized = specializes_recurse(scope, parent, &next, classifying, cleared)?;
                classifying.pop();

                if specialized {
                    return Ok(true);
                }
                cleared.insert(dependency);
            }

            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::{
        expression::{Arguments, DependencyExpression},
        provider::Component,
    };

    struct Clock;
    impl Component for Clock {
        type Provides = u64;

        async fn construct(_args: Arguments) -> Result<u64, Infallible> {
            Ok(0)
        }
    }

    struct FrozenClock;
    impl Component for FrozenClock {
        type Provides = u64;

        fn attached_provider() -> Option<Provider> {
            Some(Provider::binding::<Clock, FrozenClock>())
        }

        async fn construct(_args: Arguments) -> Result<u64, Infallible> {
            Ok(42)
        }
    }

    struct Scheduler;
    impl Component for Scheduler {
        type Provides = Scheduler;

        fn dependencies() -> DependencyExpression {
            DependencyExpression::list([Token::of::<Clock>()])
        }

        async fn construct(_args: Arguments) -> Result<Scheduler, Infallible> {
            Ok(Scheduler)
        }
    }

    struct Jobs;
    impl Component for Jobs {
        type Provides = Jobs;

        fn dependencies() -> DependencyExpression {
            DependencyExpression::map([("scheduler", Token::of::<Scheduler>())])
        }

        async fn construct(_args: Arguments) -> Result<Jobs, Infallible> {
            Ok(Jobs)
        }
    }

    struct Mailer;
    impl Component for Mailer {
        type Provides = Mailer;

        async fn construct(_args: Arguments) -> Result<Mailer, Infallible> {
            Ok(Mailer)
        }
    }

    #[test]
    fn transitive_consumers_of_an_override_specialize() {
        let root = Resolver::new();
        let child = root.create_child([Provider::of::<FrozenClock>()]);

        let jobs = root.provider_for(Token::of::<Jobs>()).unwrap();
        let mailer = root.provider_for(Token::of::<Mailer>()).unwrap();

        assert!(child.specializes(&root, &jobs).unwrap());
        assert!(!child.specializes(&root, &mailer).unwrap());
    }

    #[test]
    fn delegated_tokens_are_not_walked_again() {
        let root = Resolver::new();
        let child = root.create_child([Provider::of::<FrozenClock>()]);
        child.state().delegated.insert(Token::of::<Scheduler>());

        let jobs = root.provider_for(Token::of::<Jobs>()).unwrap();

        assert!(!child.specializes(&root, &jobs).unwrap());
    }

    #[test]
    fn the_scope_token_specializes() {
        let root = Resolver::new();
        let child = root.create_child([]);
        let needs_scope = Provider::from_fn(
            Token::marker::<Mailer>(),
            DependencyExpression::item(Token::scope()),
            |_args| async { Ok::<_, Infallible>(()) },
        );

        assert!(child.specializes(&root, &needs_scope).unwrap());
    }
}
