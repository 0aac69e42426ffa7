use std::{
    fmt,
    future::Future,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::Arc,
};

use futures::{
    future::{self, BoxFuture},
    FutureExt,
};

use crate::{
    errors::ResolveError,
    expression::{Arguments, DependencyExpression, RawDependency},
    resolver::Resolver,
    token::Token,
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// A type which knows how to construct its product from declared dependencies
///
/// The implementing type doubles as the token identifying it, see [Token::of].
///
/// ```rust
/// use std::{convert::Infallible, sync::Arc};
/// use strata_di::{Arguments, ArgumentError, Component, DependencyExpression, Token};
///
/// struct Database;
/// impl Component for Database {
///     type Provides = Database;
///
///     async fn construct(_args: Arguments) -> Result<Database, Infallible> {
///         Ok(Database)
///     }
/// }
///
/// struct Users {
///     database: Arc<Database>,
/// }
/// impl Component for Users {
///     type Provides = Users;
///
///     fn dependencies() -> DependencyExpression {
///         DependencyExpression::map([("database", Token::of::<Database>())])
///     }
///
///     async fn construct(args: Arguments) -> Result<Users, ArgumentError> {
///         Ok(Users {
///             database: args.field("database")?.get()?,
///         })
///     }
/// }
/// ```
pub trait Component: 'static {
    type Provides: Injectable;

    /// The dependencies handed to [Component::construct], none by default
    fn dependencies() -> DependencyExpression {
        DependencyExpression::empty()
    }

    /// A provider this component declares for itself
    ///
    /// Used by mocks standing in for another component, see [Provider::binding].
    fn attached_provider() -> Option<Provider> {
        None
    }

    /// Constructs the product from the resolved dependencies
    fn construct(
        args: Arguments,
    ) -> impl Future<Output = Result<Self::Provides, impl Into<DynError>>> + Send + 'static;
}

/// Wrapper Trait for constructors, providing instances of Any
pub trait DynFactory: Send + Sync {
    /// The type of the constructed instances
    fn supplies(&self) -> TypeInfo;

    fn dependencies(&self) -> DependencyExpression;

    fn construct(&self, args: Arguments) -> BoxFuture<'static, Result<Instance, DynError>>;
}

struct ComponentFactory<C>(PhantomData<fn() -> C>);

impl<C: Component> DynFactory for ComponentFactory<C> {
    fn supplies(&self) -> TypeInfo {
        TypeInfo::of::<C::Provides>()
    }

    fn dependencies(&self) -> DependencyExpression {
        C::dependencies()
    }

    fn construct(&self, args: Arguments) -> BoxFuture<'static, Result<Instance, DynError>> {
        C::construct(args)
            .map(|result| result.map(Instance::new).map_err(Into::into))
            .boxed()
    }
}

struct FnFactory<T, F> {
    dependencies: DependencyExpression,
    construct: F,
    _product: PhantomData<fn() -> T>,
}

impl<T, F, Fut, E> DynFactory for FnFactory<T, F>
where
    T: Injectable,
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Into<DynError>,
{
    fn supplies(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn dependencies(&self) -> DependencyExpression {
        self.dependencies.clone()
    }

    fn construct(&self, args: Arguments) -> BoxFuture<'static, Result<Instance, DynError>> {
        (self.construct)(args)
            .map(|result| result.map(Instance::new).map_err(Into::into))
            .boxed()
    }
}

struct ValueFactory(Instance);

impl DynFactory for ValueFactory {
    fn supplies(&self) -> TypeInfo {
        self.0.info
    }

    fn dependencies(&self) -> DependencyExpression {
        DependencyExpression::empty()
    }

    fn construct(&self, _args: Arguments) -> BoxFuture<'static, Result<Instance, DynError>> {
        future::ready(Ok(self.0.clone())).boxed()
    }
}

#[derive(Clone)]
enum Mock {
    Factory(Arc<dyn DynFactory>),
    /// Instantiates to a handle on the resolver doing the resolution
    CurrentScope,
}

/// Binding from a token to the constructor producing its instance
///
/// Providers have identity: instances are cached per provider, so two providers for the same
/// token never share an instance.
#[derive(Clone)]
pub struct Provider(Arc<ProviderInner>);

struct ProviderInner {
    token: Token,
    mock: Mock,
    dependencies: DependencyExpression,
}

impl Provider {
    pub fn new(token: Token, factory: impl DynFactory + 'static) -> Self {
        let dependencies = factory.dependencies();
        Provider(Arc::new(ProviderInner {
            token,
            mock: Mock::Factory(Arc::new(factory)),
            dependencies,
        }))
    }

    /// The provider of a component: its attached provider, else the component itself
    pub fn of<C: Component>() -> Self {
        C::attached_provider()
            .unwrap_or_else(|| Provider::new(Token::of::<C>(), ComponentFactory::<C>(PhantomData)))
    }

    /// Binds `Target`'s token to the `Stand` component, which must produce the same type
    pub fn binding<Target, Stand>() -> Self
    where
        Target: Component,
        Stand: Component<Provides = Target::Provides>,
    {
        Provider::new(Token::of::<Target>(), ComponentFactory::<Stand>(PhantomData))
    }

    /// Binds a token to a constructor function
    pub fn from_fn<T, F, Fut, E>(
        token: Token,
        dependencies: DependencyExpression,
        construct: F,
    ) -> Self
    where
        T: Injectable,
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<DynError>,
    {
        Provider::new(
            token,
            FnFactory {
                dependencies,
                construct,
                _product: PhantomData,
            },
        )
    }

    /// Binds a token to an already existing value
    pub fn value<T: Injectable>(token: Token, value: T) -> Self {
        Provider::new(token, ValueFactory(Instance::new(value)))
    }

    /// Binds a token to an already shared value
    pub fn shared<T: Injectable>(token: Token, value: Arc<T>) -> Self {
        Provider::new(token, ValueFactory(Instance::from_arc(value)))
    }

    /// The default provider for a token
    ///
    /// Components answer with their attached provider if they declare one, otherwise with
    /// themselves. Marker tokens have no constructor and fail with
    /// [ResolveError::UnsupportedToken].
    pub fn from_token(token: Token) -> Result<Self, ResolveError> {
        token.default_provider()
    }

    pub(crate) fn current_scope() -> Self {
        Provider(Arc::new(ProviderInner {
            token: Token::scope(),
            mock: Mock::CurrentScope,
            dependencies: DependencyExpression::empty(),
        }))
    }

    pub fn token(&self) -> Token {
        self.0.token
    }

    pub fn dependencies(&self) -> &DependencyExpression {
        &self.0.dependencies
    }

    pub(crate) fn is_current_scope(&self) -> bool {
        matches!(self.0.mock, Mock::CurrentScope)
    }

    /// Invokes the constructor with the resolved dependencies
    ///
    /// Constructor errors are returned untouched.
    pub fn instantiate(
        &self,
        scope: &Resolver,
        args: Arguments,
    ) -> BoxFuture<'static, Result<Instance, DynError>> {
        match &self.0.mock {
            Mock::Factory(factory) => factory.construct(args),
            Mock::CurrentScope => future::ready(Ok(scope.scope_instance())).boxed(),
        }
    }

    pub fn ptr_eq(&self, other: &Provider) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Provider {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
impl Eq for Provider {}
impl Hash for Provider {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}
impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mock = match &self.0.mock {
            Mock::Factory(factory) => factory.supplies().type_name,
            Mock::CurrentScope => "current scope",
        };
        write!(f, "Provider({} => {})", self.0.token, mock)
    }
}

impl TryFrom<Token> for Provider {
    type Error = ResolveError;

    fn try_from(token: Token) -> Result<Self, Self::Error> {
        Provider::from_token(token)
    }
}

impl TryFrom<RawDependency> for Provider {
    type Error = ResolveError;

    /// Accepts a token or a ready provider, anything else is unsupported
    fn try_from(raw: RawDependency) -> Result<Self, Self::Error> {
        match raw {
            RawDependency::Token(token) => Provider::from_token(token),
            RawDependency::Provider(provider) => Ok(provider),
            RawDependency::Undefined => Err(ResolveError::UndefinedToken("$".to_string())),
            other => Err(ResolveError::UnsupportedToken(format!(
                "cannot build a provider from {other:?}"
            ))),
        }
    }
}
