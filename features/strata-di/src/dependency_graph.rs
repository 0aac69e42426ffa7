use std::collections::HashSet;

use crate::{errors::ResolveError, provider::Provider, resolver::Resolver, token::Token};

/// Walks the declared dependencies below `provider`, as seen from `scope`
///
/// Returns [ResolveError::CyclicDependency] for the first cycle found. Constructing a provider
/// which is part of a cycle would otherwise wait on itself forever.
pub(crate) fn check_acyclic(scope: &Resolver, provider: &Provider) -> Result<(), ResolveError> {
    let mut checked = HashSet::new();
    let mut dependency_chain = vec![provider.token()];

    return check_recurse(scope, &mut checked, &mut dependency_chain, provider);

    fn check_recurse(
        scope: &Resolver,
        checked: &mut HashSet<Token>,
        dependency_chain: &mut Vec<Token>,
        provider: &Provider,
    ) -> Result<(), ResolveError> {
        for dependency in provider.dependencies().tokens() {
            // Circular Dependency Check
            if dependency_chain.contains(&dependency) {
                dependency_chain.push(dependency); // Add current so chain is complete
                return Err(ResolveError::CyclicDependency {
                    chain: dependency_chain.clone(),
                });
            }

            // Skip if already checked
            if !checked.insert(dependency) {
                continue;
            }

            let next = scope.provider_for(dependency)?;

            dependency_chain.push(dependency);
            check_recurse(scope, checked, dependency_chain, &next)?;
            dependency_chain.pop();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use crate::expression::DependencyExpression;

    struct Left;
    struct Right;
    struct Shared;

    fn bind(token: Token, dependencies: DependencyExpression) -> Provider {
        Provider::from_fn(token, dependencies, |_args| async { Ok::<_, Infallible>(()) })
    }

    #[test]
    fn reports_the_full_cycle() {
        let left = Token::marker::<Left>();
        let right = Token::marker::<Right>();
        let resolver = Resolver::with_overrides([
            bind(left, DependencyExpression::list([right])),
            bind(right, DependencyExpression::map([("left", left)])),
        ]);

        let provider = resolver.provider_for(left).unwrap();

        match check_acyclic(&resolver, &provider) {
            Err(ResolveError::CyclicDependency { chain }) => {
                assert_eq!(chain, vec![left, right, left])
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let left = Token::marker::<Left>();
        let right = Token::marker::<Right>();
        let shared = Token::marker::<Shared>();
        let resolver = Resolver::with_overrides([
            bind(left, DependencyExpression::list([right, shared])),
            bind(right, DependencyExpression::list([shared])),
            bind(shared, DependencyExpression::empty()),
        ]);

        let provider = resolver.provider_for(left).unwrap();

        assert!(check_acyclic(&resolver, &provider).is_ok());
    }
}
