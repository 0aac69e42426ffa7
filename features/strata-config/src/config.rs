use std::{fmt, ops::Deref, sync::Arc};

use strata_di::{ArgumentError, Resolved, Token};

/// A wrapper type to allow for config injections
///
/// Every config added to a [ConfigProvider](crate::provider::ConfigProvider) is bound to
/// [Config::token], so components declare it like any other dependency and read it through
/// `Deref`.
///
/// # Example
/// ```rust
/// use std::convert::Infallible;
///
/// use strata_config::{config::Config, provider::ConfigProvider};
/// use strata_di::{Arguments, Component, DependencyExpression};
///
/// struct ServerConfig {
///     port: u16,
/// }
///
/// struct Server {
///     port: u16,
/// }
/// impl Component for Server {
///     type Provides = Server;
///
///     fn dependencies() -> DependencyExpression {
///         DependencyExpression::item(Config::<ServerConfig>::token())
///     }
///
///     async fn construct(args: Arguments) -> Result<Server, strata_di::ArgumentError> {
///         let config = Config::<ServerConfig>::from_resolved(&args)?;
///         Ok(Server { port: config.port })
///     }
/// }
///
/// let mut configs = ConfigProvider::new();
/// configs.add_config(ServerConfig { port: 8080 }).unwrap();
///
/// let resolver = configs.into_resolver();
/// let server = futures::executor::block_on(resolver.require::<Server>()).unwrap();
/// assert_eq!(server.port, 8080);
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Config {
            inner: self.inner.clone(),
        }
    }
}
impl<T> fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Config")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Config<T> {
    pub(crate) fn new(inner: Arc<T>) -> Self {
        Config { inner }
    }

    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Send + Sync + 'static> Config<T> {
    /// The token configs of type `T` are bound to
    pub fn token() -> Token {
        Token::marker::<Config<T>>()
    }

    /// Reads the config out of a resolved item
    pub fn from_resolved(resolved: &Resolved) -> Result<Config<T>, ArgumentError> {
        resolved.get::<Config<T>>().map(|config| (*config).clone())
    }
}

#[cfg(test)]
mod tests {
    use strata_di::Instance;

    use super::*;

    struct Limits {
        max_connections: usize,
    }

    #[test]
    fn derefs_to_the_config() {
        let config = Config::new(Arc::new(Limits {
            max_connections: 16,
        }));

        assert_eq!(config.max_connections, 16);
        assert!(Arc::ptr_eq(&config.inner(), &config.clone().into_inner()));
    }

    #[test]
    fn tokens_differ_per_config_type() {
        assert_eq!(Config::<Limits>::token(), Config::<Limits>::token());
        assert_ne!(Config::<Limits>::token(), Config::<String>::token());
    }

    #[test]
    fn reads_configs_from_resolved_items() {
        let config = Config::new(Arc::new(Limits { max_connections: 4 }));
        let resolved = Resolved::Item(Instance::new(config));

        let read = Config::<Limits>::from_resolved(&resolved).unwrap();

        assert_eq!(read.max_connections, 4);
        assert!(Config::<String>::from_resolved(&resolved).is_err());
    }
}
