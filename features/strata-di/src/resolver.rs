use std::{
    collections::{HashMap, HashSet},
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use futures::{
    future::{self, BoxFuture, Shared},
    FutureExt,
};

use crate::{
    dependency_graph,
    errors::{ArgumentError, ConstructorError, ResolveError},
    expression::{DependencyExpression, RawDependency, Resolved},
    provider::{Component, Provider},
    token::Token,
    types::{Injectable, Instance},
};

type InstanceFuture = BoxFuture<'static, Result<Instance, ResolveError>>;
type PendingInstance = Shared<InstanceFuture>;

/// A resolution scope
///
/// A root resolver owns its provider registry and caches every instance it creates, once per
/// provider. Children created with [Resolver::create_child] layer overrides on top of their
/// parent and only build locally what transitively depends on an override, everything else is
/// shared with the parent.
///
/// Tokens without a registered provider are bound to their own constructor on first use. This
/// is convenient, but it also means that a token nobody meant to bind resolves silently instead
/// of failing.
///
/// Cloning is cheap and yields a handle to the same scope.
#[derive(Clone)]
pub struct Resolver(pub(crate) Arc<ResolverInner>);

pub(crate) struct ResolverInner {
    pub(crate) state: Mutex<ScopeState>,
    pub(crate) parent: Option<Resolver>,
    /// What [Token::scope] resolves to in this scope, holding a [Scope]
    handle: Instance,
}

/// Non-owning handle to a scope, the product of [Token::scope]
///
/// Components may keep it for as long as they like, it does not keep the scope alive.
/// [Scope::upgrade] fails once every [Resolver] handle to the scope is gone.
#[derive(Clone)]
pub struct Scope(Weak<ResolverInner>);

impl Scope {
    pub fn upgrade(&self) -> Option<Resolver> {
        self.0.upgrade().map(Resolver)
    }

    /// True if this is a handle to the given resolver's scope
    pub fn ptr_eq(&self, resolver: &Resolver) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&resolver.0))
    }
}
impl Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.0.strong_count() > 0 {
            "alive"
        } else {
            "dropped"
        };
        f.debug_tuple("Scope").field(&state).finish()
    }
}

#[derive(Default)]
pub(crate) struct ScopeState {
    pub(crate) providers: HashMap<Token, Provider>,
    /// Completed instances, written once per provider
    pub(crate) instances: HashMap<Provider, Instance>,
    /// Resolutions which are still running
    pub(crate) pending: HashMap<Provider, PendingInstance>,
    /// Tokens a child scope leaves to its parent
    pub(crate) delegated: HashSet<Token>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        let mut map = f.debug_struct("Resolver");
        for provider in state.instances.keys() {
            map.field(provider.token().type_name(), &"ready");
        }
        for provider in state.pending.keys() {
            map.field(provider.token().type_name(), &"pending");
        }
        map.finish()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_overrides([])
    }

    /// Root scope with the given providers registered up front
    pub fn with_overrides(overrides: impl IntoIterator<Item = Provider>) -> Self {
        Self::build(overrides, None)
    }

    fn build(overrides: impl IntoIterator<Item = Provider>, parent: Option<Resolver>) -> Self {
        let resolver = Resolver(Arc::new_cyclic(|this| ResolverInner {
            state: Mutex::new(ScopeState::default()),
            parent,
            handle: Instance::new(Scope(this.clone())),
        }));

        for provider in overrides {
            resolver.provide(provider);
        }
        resolver.provide(Provider::current_scope());

        resolver
    }

    /// Child scope using the given providers instead of the ones it would inherit
    pub fn create_child(&self, overrides: impl IntoIterator<Item = Provider>) -> Resolver {
        let child = Self::build(overrides, Some(self.clone()));
        tracing::debug!(
            "Created child scope with {} local providers",
            child.state().providers.len()
        );
        child
    }

    pub fn parent(&self) -> Option<&Resolver> {
        self.0.parent.as_ref()
    }

    /// True if both handles refer to the same scope
    pub fn ptr_eq(&self, other: &Resolver) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A handle to this scope which does not keep it alive
    pub fn downgrade(&self) -> Scope {
        Scope(Arc::downgrade(&self.0))
    }

    /// The instance every request for [Token::scope] receives
    pub(crate) fn scope_instance(&self) -> Instance {
        self.0.handle.clone()
    }

    /// Registers a provider, replacing any previous one for its token
    pub fn provide(&self, provider: Provider) {
        tracing::debug!("Registering {:?}", provider);
        self.state().providers.insert(provider.token(), provider);
    }

    /// The provider this scope uses for a token
    ///
    /// Falls back to the parent scope, and at the root binds unknown tokens to their default
    /// provider.
    pub fn provider_for(&self, token: Token) -> Result<Provider, ResolveError> {
        if let Some(provider) = self.state().providers.get(&token) {
            return Ok(provider.clone());
        }

        match &self.0.parent {
            Some(parent) => parent.provider_for(token),
            None => {
                let provider = Provider::from_token(token)?;
                tracing::debug!("Binding {} to its default {:?}", token, provider);
                Ok(self
                    .state()
                    .providers
                    .entry(token)
                    .or_insert(provider)
                    .clone())
            }
        }
    }

    /// Resolves a request, preserving its shape
    ///
    /// Accepts a token, a list or map of tokens, or a ready [DependencyExpression]. Every
    /// leaf is requested before this returns, so concurrent requests for the same token share
    /// one construction.
    pub fn get(
        &self,
        request: impl Into<RawDependency>,
    ) -> BoxFuture<'static, Result<Resolved, ResolveError>> {
        match DependencyExpression::from_expression(request.into()) {
            Ok(expression) => self.get_expression(&expression),
            Err(error) => future::ready(Err(error)).boxed(),
        }
    }

    pub fn get_expression(
        &self,
        expression: &DependencyExpression,
    ) -> BoxFuture<'static, Result<Resolved, ResolveError>> {
        let scope = self.clone();
        expression.resolve_shape(move |token| scope.resolve_token(token))
    }

    /// Resolves a component and downcasts it to its product
    pub async fn require<C: Component>(&self) -> Result<Arc<C::Provides>, ResolveError> {
        self.require_token(Token::of::<C>()).await
    }

    /// Resolves any token and downcasts the instance
    pub async fn require_token<T: Injectable>(&self, token: Token) -> Result<Arc<T>, ResolveError> {
        let instance = self.resolve_token(token).await?;
        instance.downcast::<T>().map_err(|actual_type| {
            ArgumentError::DowncastFailed {
                required_type: std::any::type_name::<T>(),
                actual_type,
            }
            .into()
        })
    }

    /// Resolves a single token in this scope
    pub(crate) fn resolve_token(&self, token: Token) -> InstanceFuture {
        if let Some(parent) = &self.0.parent {
            return self.resolve_in_child(parent, token);
        }

        match self.provider_for(token) {
            Ok(provider) => self.resolve(provider),
            Err(error) => future::ready(Err(error)).boxed(),
        }
    }

    /// Resolves a provider in this scope
    ///
    /// Returns the cached instance, joins a running resolution, or starts a new one. A new
    /// resolution is registered as pending before any of its dependencies are requested.
    pub fn resolve(&self, provider: Provider) -> InstanceFuture {
        if provider.is_current_scope() {
            return future::ready(Ok(self.scope_instance())).boxed();
        }

        if let Some(cached) = Self::cached(&self.state(), &provider) {
            return cached;
        }

        // Walk the graph outside the lock, it looks up providers
        if let Err(error) = dependency_graph::check_acyclic(self, &provider) {
            tracing::error!("Refusing to construct {}: {}", provider.token(), error);
            return future::ready(Err(error)).boxed();
        }

        let mut state = self.state();
        // Someone may have started it while the lock was released
        if let Some(cached) = Self::cached(&state, &provider) {
            return cached;
        }

        let pending = self.create(provider.clone());
        state.pending.insert(provider, pending.clone());

        pending.boxed()
    }

    fn cached(state: &ScopeState, provider: &Provider) -> Option<InstanceFuture> {
        if let Some(instance) = state.instances.get(provider) {
            tracing::trace!("Using cached instance of {}", provider.token());
            return Some(future::ready(Ok(instance.clone())).boxed());
        }

        if let Some(pending) = state.pending.get(provider) {
            tracing::trace!("Joining pending resolution of {}", provider.token());
            return Some(pending.clone().boxed());
        }

        None
    }

    /// Resolution of a provider, not started until first polled
    fn create(&self, provider: Provider) -> PendingInstance {
        let scope = self.clone();

        async move {
            let result = scope.instantiate(&provider).await;

            let mut state = scope.state();
            state.pending.remove(&provider);
            match &result {
                Ok(instance) => {
                    tracing::debug!(
                        "Constructed instance of {} for {}",
                        instance.info.type_name,
                        provider.token()
                    );
                    state.instances.insert(provider, instance.clone());
                }
                Err(error) => {
                    tracing::error!("Failed to construct {}: {}", provider.token(), error);
                }
            }

            result
        }
        .boxed()
        .shared()
    }

    async fn instantiate(&self, provider: &Provider) -> Result<Instance, ResolveError> {
        let args = self.get_expression(provider.dependencies()).await?;

        provider
            .instantiate(self, args)
            .await
            .map_err(|error| ResolveError::InstantiationFailure(ConstructorError::new(error)))
    }

    /// Snapshot of every instance created so far, by token
    ///
    /// Child scopes include their ancestors' instances, local ones winning.
    pub fn dump(&self) -> HashMap<Token, Instance> {
        let mut snapshot = match &self.0.parent {
            Some(parent) => parent.dump(),
            None => HashMap::new(),
        };

        let state = self.state();
        for (provider, instance) in &state.instances {
            snapshot.insert(provider.token(), instance.clone());
        }

        snapshot
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, ScopeState> {
        self.0.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use futures::executor::block_on;

    use super::*;

    static COUNTER_BUILDS: AtomicUsize = AtomicUsize::new(0);

    struct Counter;
    impl Component for Counter {
        type Provides = Counter;

        async fn construct(_args: crate::Arguments) -> Result<Counter, Infallible> {
            COUNTER_BUILDS.fetch_add(1, Ordering::SeqCst);
            Ok(Counter)
        }
    }

    #[test]
    fn pending_is_registered_before_the_first_poll() {
        let resolver = Resolver::new();

        let first = resolver.get(Token::of::<Counter>());
        let second = resolver.get(Token::of::<Counter>());
        assert_eq!(resolver.state().pending.len(), 1);

        let (first, second) = block_on(future::join(first, second));
        let first = first.unwrap();
        let second = second.unwrap();

        assert!(first.instance().unwrap().ptr_eq(second.instance().unwrap()));
        assert_eq!(COUNTER_BUILDS.load(Ordering::SeqCst), 1);
        assert!(resolver.state().pending.is_empty());
    }

    #[test]
    fn lazily_bound_tokens_are_registered() {
        let resolver = Resolver::new();

        let provider = resolver.provider_for(Token::of::<Counter>()).unwrap();

        assert_eq!(provider, resolver.provider_for(Token::of::<Counter>()).unwrap());
    }

    #[test]
    fn last_registration_wins() {
        let token = Token::marker::<str>();
        let resolver = Resolver::with_overrides([Provider::value(token, 1_u8)]);
        resolver.provide(Provider::value(token, 2_u8));

        let value = block_on(resolver.require_token::<u8>(token)).unwrap();

        assert_eq!(*value, 2);
    }
}
