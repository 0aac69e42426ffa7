//! Strata Config provides a registry of configs that can be injected in the rest of the
//! components.
//!
//! Strata Config is split into two major parts:
//! 1. ConfigProvider: Used to create the registry of all configs
//! 2. Config<T>: A wrapper type to be able to resolve and retrieve configs
//!
//! # Examples
//!
//! ```rust
//! use strata_config::{config::Config, provider::ConfigProvider};
//!
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! let mut config_provider = ConfigProvider::default();
//! config_provider
//!     .add_config(AppConfig {
//!         host: "localhost".to_string(),
//!         port: 8080_u16,
//!     })
//!     .unwrap();
//!
//! let resolver = config_provider.into_resolver();
//! let config = futures::executor::block_on(
//!     resolver.require_token::<Config<AppConfig>>(Config::<AppConfig>::token()),
//! )
//! .unwrap();
//!
//! assert_eq!(config.host, "localhost");
//! assert_eq!(config.port, 8080);
//! ```
//!
//! Strata Config consists of the following components:
//!
//! 1. Config - for declaring a struct as a config and reading it from resolved dependencies
//! 2. Provider - for creating a registry of configs, adding, retrieving and installing configs
//! 3. Errors - for config errors

pub mod config;
pub mod errors;
pub mod provider;
