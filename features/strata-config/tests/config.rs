use std::sync::Arc;

use futures::executor::block_on;
use strata_config::{config::Config, provider::ConfigProvider};
use strata_di::{ArgumentError, Arguments, Component, DependencyExpression, ResolveError, Resolver};

#[derive(Clone)]
struct DatabaseConfig {
    url: &'static str,
}

struct Database {
    url: &'static str,
}
impl Component for Database {
    type Provides = Database;

    fn dependencies() -> DependencyExpression {
        DependencyExpression::item(Config::<DatabaseConfig>::token())
    }

    async fn construct(args: Arguments) -> Result<Database, ArgumentError> {
        let config = Config::<DatabaseConfig>::from_resolved(&args)?;
        Ok(Database { url: config.url })
    }
}

struct Cache;
impl Component for Cache {
    type Provides = Cache;

    async fn construct(_args: Arguments) -> Result<Cache, std::convert::Infallible> {
        Ok(Cache)
    }
}

#[test]
fn components_receive_their_config() {
    let mut configs = ConfigProvider::new();
    configs
        .add_config(DatabaseConfig {
            url: "postgres://prod",
        })
        .unwrap();

    let resolver = configs.into_resolver();
    let database = block_on(resolver.require::<Database>()).unwrap();

    assert_eq!(database.url, "postgres://prod");
}

#[test]
fn configs_are_shared_with_the_registry() {
    let mut configs = ConfigProvider::new();
    configs.add_config(DatabaseConfig { url: "sqlite://" }).unwrap();
    let resolver = Resolver::new();
    configs.install(&resolver);

    let resolved = block_on(
        resolver.require_token::<Config<DatabaseConfig>>(Config::<DatabaseConfig>::token()),
    )
    .unwrap();

    assert!(Arc::ptr_eq(
        &resolved.inner(),
        &configs.get_config::<DatabaseConfig>().unwrap()
    ));
}

#[test]
fn child_scopes_can_override_configs() {
    let mut production = ConfigProvider::new();
    production
        .add_config(DatabaseConfig {
            url: "postgres://prod",
        })
        .unwrap();
    let mut testing = ConfigProvider::new();
    testing
        .add_config(DatabaseConfig {
            url: "sqlite://memory",
        })
        .unwrap();

    let root = production.into_resolver();
    let child = root.create_child(testing.providers());

    let test_database = block_on(child.require::<Database>()).unwrap();
    let database = block_on(root.require::<Database>()).unwrap();
    let test_cache = block_on(child.require::<Cache>()).unwrap();
    let cache = block_on(root.require::<Cache>()).unwrap();

    assert_eq!(test_database.url, "sqlite://memory");
    assert_eq!(database.url, "postgres://prod");
    assert!(Arc::ptr_eq(&test_cache, &cache));
}

#[test]
fn missing_configs_fail_resolution() {
    let resolver = Resolver::new();

    assert!(matches!(
        block_on(resolver.require::<Database>()),
        Err(ResolveError::UnsupportedToken(_))
    ));
}
