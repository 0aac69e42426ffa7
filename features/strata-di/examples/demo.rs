use std::{convert::Infallible, sync::Arc};

use strata_di::{
    ArgumentError, Arguments, Component, DependencyExpression, Provider, Resolver, Token,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = Resolver::new();
    let child = root.create_child([Provider::of::<StubGreeting>()]);

    let (app, test_app) = futures::executor::block_on(async {
        let app = root.require::<App>().await.unwrap();
        let test_app = child.require::<App>().await.unwrap();
        (app, test_app)
    });

    println!("{} / {}", app.greeting.0, test_app.greeting.0);
    println!("shared settings: {}", Arc::ptr_eq(&app.settings, &test_app.settings));
    println!("{:?}", root);
}

#[derive(Debug)]
struct Settings {
    name: String,
}
impl Component for Settings {
    type Provides = Settings;

    async fn construct(_args: Arguments) -> Result<Settings, Infallible> {
        Ok(Settings {
            name: "demo".to_string(),
        })
    }
}

#[derive(Debug)]
struct Greeting(String);
impl Component for Greeting {
    type Provides = Greeting;

    fn dependencies() -> DependencyExpression {
        DependencyExpression::item(Token::of::<Settings>())
    }

    async fn construct(args: Arguments) -> Result<Greeting, ArgumentError> {
        let settings = args.get::<Settings>()?;
        Ok(Greeting(format!("Hello from {}", settings.name)))
    }
}

struct StubGreeting;
impl Component for StubGreeting {
    type Provides = Greeting;

    fn attached_provider() -> Option<Provider> {
        Some(Provider::binding::<Greeting, StubGreeting>())
    }

    async fn construct(_args: Arguments) -> Result<Greeting, Infallible> {
        Ok(Greeting("stub".to_string()))
    }
}

#[derive(Debug)]
struct App {
    settings: Arc<Settings>,
    greeting: Arc<Greeting>,
}
impl Component for App {
    type Provides = App;

    fn dependencies() -> DependencyExpression {
        DependencyExpression::list([Token::of::<Settings>(), Token::of::<Greeting>()])
    }

    async fn construct(args: Arguments) -> Result<App, ArgumentError> {
        Ok(App {
            settings: args.at(0)?.get()?,
            greeting: args.at(1)?.get()?,
        })
    }
}
