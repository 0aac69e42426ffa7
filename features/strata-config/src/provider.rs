use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use strata_di::{Provider, Resolver, TypeInfo};

use crate::{config::Config, errors::ConfigError};

struct ConfigEntry {
    value: Arc<dyn Any + Send + Sync + 'static>,
    provider: Provider,
}

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type. Once complete, the registry is
/// installed into a [Resolver] which then hands out [Config] instances.
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, ConfigEntry>,
}

impl ConfigProvider {
    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// If the config type is not available, it will return [ConfigError::Missing]
    pub fn get_config<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ConfigError> {
        self.configs
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.clone().downcast().ok())
            .ok_or(ConfigError::Missing(TypeInfo::of::<T>()))
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return
    /// [ConfigError::AlreadyRegistered]
    pub fn add_config<T: Send + Sync + 'static>(
        &mut self,
        config: T,
    ) -> Result<&mut Self, ConfigError> {
        let type_id = TypeId::of::<T>();

        if self.configs.contains_key(&type_id) {
            return Err(ConfigError::AlreadyRegistered(TypeInfo::of::<T>()));
        }

        let value = Arc::new(config);
        let provider = Provider::value(Config::<T>::token(), Config::new(value.clone()));
        tracing::debug!("Registered config {}", std::any::type_name::<T>());

        self.configs.insert(type_id, ConfigEntry { value, provider });
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling
    /// [`ConfigProvider::add_config`]. If the config provided is `None`, then the function just
    /// returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Send + Sync + 'static>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    /// One provider per registered config, bound to its [Config::token]
    pub fn providers(&self) -> Vec<Provider> {
        self.configs
            .values()
            .map(|entry| entry.provider.clone())
            .collect()
    }

    /// Registers every config in the given scope
    ///
    /// Installing into a child scope overrides the configs it inherits, and rebuilds what
    /// depends on them in that scope only.
    pub fn install(&self, resolver: &Resolver) {
        for provider in self.providers() {
            resolver.provide(provider);
        }
    }

    /// A root resolver with every config registered
    pub fn into_resolver(self) -> Resolver {
        Resolver::with_overrides(self.providers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct AppConfig {
        host: String,
        port: u16,
    }

    #[test]
    fn stores_and_retrieves_configs() {
        let mut provider = ConfigProvider::new();
        provider
            .add_config(AppConfig {
                host: "localhost".to_string(),
                port: 8080,
            })
            .unwrap()
            .maybe_add_config(Some(3_u8))
            .unwrap()
            .maybe_add_config(None::<String>)
            .unwrap();

        let config = provider.get_config::<AppConfig>().unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(*provider.get_config::<u8>().unwrap(), 3);
        assert_eq!(provider.providers().len(), 2);
    }

    #[test]
    fn missing_configs_are_errors() {
        let provider = ConfigProvider::new();

        assert!(matches!(
            provider.get_config::<AppConfig>(),
            Err(ConfigError::Missing(info)) if info == TypeInfo::of::<AppConfig>()
        ));
    }

    #[test]
    fn registering_twice_is_an_error() {
        let mut provider = ConfigProvider::new();
        provider.add_config(1_u16).unwrap();

        assert!(matches!(
            provider.add_config(2_u16),
            Err(ConfigError::AlreadyRegistered(_))
        ));
        assert_eq!(*provider.get_config::<u16>().unwrap(), 1);
    }
}
