//! Strata DI resolves object graphs asynchronously, once per scope.
//!
//! Callers describe what they need as a [DependencyExpression] (a single token, a list or a
//! named map of tokens) and get back a [Resolved] value of the same shape. Every provider is
//! instantiated at most once per scope, concurrent requests for it share one construction.
//!
//! Strata DI consists of the following parts:
//!
//! 1. [Token] and [Component] - the identity of a dependency and how it constructs itself
//! 2. [Provider] - binds a token to a constructor, mocks included
//! 3. [Resolver] - the root scope holding the registry and the instance caches
//! 4. Child scopes - [Resolver::create_child] overrides some bindings and rebuilds only what
//!    depends on them, sharing everything else with the parent
//!
//! # Example
//!
//! ```rust
//! use std::{convert::Infallible, sync::Arc};
//! use strata_di::{
//!     ArgumentError, Arguments, Component, DependencyExpression, Provider, Resolver, Token,
//! };
//!
//! struct Clock;
//! impl Component for Clock {
//!     type Provides = u64;
//!
//!     async fn construct(_args: Arguments) -> Result<u64, Infallible> {
//!         Ok(1_700_000_000)
//!     }
//! }
//!
//! struct FrozenClock;
//! impl Component for FrozenClock {
//!     type Provides = u64;
//!
//!     fn attached_provider() -> Option<Provider> {
//!         Some(Provider::binding::<Clock, FrozenClock>())
//!     }
//!
//!     async fn construct(_args: Arguments) -> Result<u64, Infallible> {
//!         Ok(0)
//!     }
//! }
//!
//! struct Report {
//!     generated_at: Arc<u64>,
//! }
//! impl Component for Report {
//!     type Provides = Report;
//!
//!     fn dependencies() -> DependencyExpression {
//!         DependencyExpression::map([("clock", Token::of::<Clock>())])
//!     }
//!
//!     async fn construct(args: Arguments) -> Result<Report, ArgumentError> {
//!         Ok(Report {
//!             generated_at: args.field("clock")?.get()?,
//!         })
//!     }
//! }
//!
//! futures::executor::block_on(async {
//!     let root = Resolver::new();
//!     let test = root.create_child([Provider::of::<FrozenClock>()]);
//!
//!     let report = test.require::<Report>().await.unwrap();
//!     assert_eq!(*report.generated_at, 0);
//!
//!     let report = root.require::<Report>().await.unwrap();
//!     assert_eq!(*report.generated_at, 1_700_000_000);
//! });
//! ```

mod dependency_graph;
mod scope;

pub mod errors;
pub mod expression;
pub mod provider;
pub mod resolver;
pub mod tag;
pub mod token;
pub mod types;

pub use errors::{ArgumentError, ConstructorError, ResolveError};
pub use expression::{Arguments, DependencyExpression, RawDependency, Resolved};
pub use provider::{Component, DynFactory, Provider};
pub use resolver::{Resolver, Scope};
pub use tag::Tagged;
pub use token::Token;
pub use types::{DynError, Injectable, Instance, TypeInfo};
