use std::{collections::BTreeMap, sync::Arc};

use futures::{
    future::{self, BoxFuture},
    FutureExt,
};

use crate::{
    errors::{ArgumentError, ResolveError},
    provider::{Component, Provider},
    token::Token,
    types::{Injectable, Instance},
};

/// Shape-preserving tree of tokens describing what to resolve
///
/// The result of resolving an expression is a [Resolved] of the very same shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DependencyExpression {
    /// A single dependency
    Item(Token),
    /// Positional dependencies
    List(Vec<DependencyExpression>),
    /// Named dependencies
    Map(BTreeMap<String, DependencyExpression>),
}

/// A request as written by a caller, before normalization
///
/// Only [DependencyExpression::from_expression] looks at this shape, everything downstream
/// works on the normalized expression.
#[derive(Clone, Debug)]
pub enum RawDependency {
    /// An empty slot where a token was expected
    Undefined,
    Token(Token),
    /// A binding, accepted where providers are expected but never inside an expression
    Provider(Provider),
    List(Vec<RawDependency>),
    Map(Vec<(String, RawDependency)>),
    /// Already normalized, taken as is
    Expression(DependencyExpression),
}

impl DependencyExpression {
    /// No dependencies at all
    pub fn empty() -> Self {
        DependencyExpression::List(Vec::new())
    }

    pub fn item(token: Token) -> Self {
        DependencyExpression::Item(token)
    }

    /// A single component dependency
    pub fn of<C: Component>() -> Self {
        DependencyExpression::Item(Token::of::<C>())
    }

    pub fn list<E: Into<DependencyExpression>>(items: impl IntoIterator<Item = E>) -> Self {
        DependencyExpression::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<String>, E: Into<DependencyExpression>>(
        entries: impl IntoIterator<Item = (K, E)>,
    ) -> Self {
        DependencyExpression::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Classifies and normalizes a raw request
    ///
    /// Fails with [ResolveError::UndefinedToken] on the first empty slot and with
    /// [ResolveError::UnsupportedToken] if a provider shows up where a token is expected.
    pub fn from_expression(raw: RawDependency) -> Result<Self, ResolveError> {
        return normalize(raw, &mut String::from("$"));

        fn normalize(
            raw: RawDependency,
            position: &mut String,
        ) -> Result<DependencyExpression, ResolveError> {
            match raw {
                RawDependency::Undefined => Err(ResolveError::UndefinedToken(position.clone())),
                RawDependency::Token(token) => Ok(DependencyExpression::Item(token)),
                RawDependency::Expression(expression) => Ok(expression),
                RawDependency::Provider(provider) => Err(ResolveError::UnsupportedToken(format!(
                    "{provider:?} at '{position}' is a provider, expected a token"
                ))),
                RawDependency::List(items) => {
                    let mut list = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        let len = position.len();
                        position.push_str(&format!("[{index}]"));
                        list.push(normalize(item, position)?);
                        position.truncate(len);
                    }
                    Ok(DependencyExpression::List(list))
                }
                RawDependency::Map(entries) => {
                    let mut map = BTreeMap::new();
                    for (key, value) in entries {
                        let len = position.len();
                        position.push('.');
                        position.push_str(&key);
                        let value = normalize(value, position)?;
                        position.truncate(len);
                        map.insert(key, value);
                    }
                    Ok(DependencyExpression::Map(map))
                }
            }
        }
    }

    /// Merges named expressions into one, later keys winning
    pub fn merge(
        expressions: impl IntoIterator<Item = DependencyExpression>,
    ) -> Result<Self, ResolveError> {
        let mut merged = BTreeMap::new();
        for expression in expressions {
            match expression {
                DependencyExpression::Map(entries) => merged.extend(entries),
                other => {
                    return Err(ResolveError::UnsupportedToken(format!(
                        "only named dependencies can be merged, got {other:?}"
                    )))
                }
            }
        }
        Ok(DependencyExpression::Map(merged))
    }

    /// All leaf tokens, depth first in declaration order
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        collect(self, &mut tokens);
        return tokens;

        fn collect(expression: &DependencyExpression, tokens: &mut Vec<Token>) {
            match expression {
                DependencyExpression::Item(token) => tokens.push(*token),
                DependencyExpression::List(items) => {
                    items.iter().for_each(|item| collect(item, tokens))
                }
                DependencyExpression::Map(entries) => {
                    entries.values().for_each(|value| collect(value, tokens))
                }
            }
        }
    }

    /// True if any leaf token matches
    pub fn some(&self, mut predicate: impl FnMut(&Token) -> bool) -> bool {
        self.tokens().iter().any(|token| predicate(token))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DependencyExpression::Item(_) => false,
            DependencyExpression::List(items) => items.is_empty(),
            DependencyExpression::Map(entries) => entries.is_empty(),
        }
    }

    /// Resolves every leaf and reassembles the results in the shape of the expression
    ///
    /// Leaves are requested immediately, siblings run concurrently and the first failure fails
    /// the whole.
    pub fn resolve_shape<F>(
        &self,
        resolve_leaf: F,
    ) -> BoxFuture<'static, Result<Resolved, ResolveError>>
    where
        F: Fn(Token) -> BoxFuture<'static, Result<Instance, ResolveError>> + Clone + Send + 'static,
    {
        match self {
            DependencyExpression::Item(token) => resolve_leaf(*token)
                .map(|result| result.map(Resolved::Item))
                .boxed(),
            DependencyExpression::List(items) => {
                let siblings: Vec<_> = items
                    .iter()
                    .map(|item| item.resolve_shape(resolve_leaf.clone()))
                    .collect();

                future::try_join_all(siblings)
                    .map(|result| result.map(Resolved::List))
                    .boxed()
            }
            DependencyExpression::Map(entries) => {
                let keys: Vec<String> = entries.keys().cloned().collect();
                let siblings: Vec<_> = entries
                    .values()
                    .map(|value| value.resolve_shape(resolve_leaf.clone()))
                    .collect();

                future::try_join_all(siblings)
                    .map(move |result| {
                        result.map(|values| Resolved::Map(keys.into_iter().zip(values).collect()))
                    })
                    .boxed()
            }
        }
    }
}

impl From<Token> for DependencyExpression {
    fn from(token: Token) -> Self {
        DependencyExpression::Item(token)
    }
}

impl RawDependency {
    pub fn list<R: Into<RawDependency>>(items: impl IntoIterator<Item = R>) -> Self {
        RawDependency::List(items.into_iter().map(Into::into).collect())
    }

    pub fn map<K: Into<String>, R: Into<RawDependency>>(
        entries: impl IntoIterator<Item = (K, R)>,
    ) -> Self {
        RawDependency::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Deep check for empty slots
    pub fn contains_undefined(&self) -> bool {
        match self {
            RawDependency::Undefined => true,
            RawDependency::Token(_) | RawDependency::Provider(_) | RawDependency::Expression(_) => {
                false
            }
            RawDependency::List(items) => items.iter().any(RawDependency::contains_undefined),
            RawDependency::Map(entries) => {
                entries.iter().any(|(_, value)| value.contains_undefined())
            }
        }
    }
}

impl From<Token> for RawDependency {
    fn from(token: Token) -> Self {
        RawDependency::Token(token)
    }
}
impl From<Option<Token>> for RawDependency {
    fn from(token: Option<Token>) -> Self {
        match token {
            Some(token) => RawDependency::Token(token),
            None => RawDependency::Undefined,
        }
    }
}
impl From<Provider> for RawDependency {
    fn from(provider: Provider) -> Self {
        RawDependency::Provider(provider)
    }
}
impl From<DependencyExpression> for RawDependency {
    fn from(expression: DependencyExpression) -> Self {
        RawDependency::Expression(expression)
    }
}
impl<R: Into<RawDependency>> From<Vec<R>> for RawDependency {
    fn from(items: Vec<R>) -> Self {
        RawDependency::list(items)
    }
}
impl<R: Into<RawDependency>, const N: usize> From<[R; N]> for RawDependency {
    fn from(items: [R; N]) -> Self {
        RawDependency::list(items)
    }
}
impl<K: Into<String>, R: Into<RawDependency>> From<BTreeMap<K, R>> for RawDependency {
    fn from(entries: BTreeMap<K, R>) -> Self {
        RawDependency::map(entries)
    }
}

/// Resolved values in the shape of the requested expression
#[derive(Clone, Debug)]
pub enum Resolved {
    Item(Instance),
    List(Vec<Resolved>),
    Map(BTreeMap<String, Resolved>),
}

/// What a constructor receives: its declared dependencies, resolved
///
/// Positional for a list declaration, named for a map, a single item for a token and an empty
/// list when nothing was declared.
pub type Arguments = Resolved;

impl Resolved {
    /// The single instance, downcasted
    pub fn get<T: Injectable>(&self) -> Result<Arc<T>, ArgumentError> {
        self.instance()?
            .downcast::<T>()
            .map_err(|actual_type| ArgumentError::DowncastFailed {
                required_type: std::any::type_name::<T>(),
                actual_type,
            })
    }

    pub fn instance(&self) -> Result<&Instance, ArgumentError> {
        match self {
            Resolved::Item(instance) => Ok(instance),
            other => Err(other.mismatch("a single instance")),
        }
    }

    /// Positional argument
    pub fn at(&self, index: usize) -> Result<&Resolved, ArgumentError> {
        match self {
            Resolved::List(items) => items.get(index).ok_or(ArgumentError::MissingIndex(index)),
            other => Err(other.mismatch("a list")),
        }
    }

    /// Named argument
    pub fn field(&self, key: &str) -> Result<&Resolved, ArgumentError> {
        match self {
            Resolved::Map(entries) => entries
                .get(key)
                .ok_or_else(|| ArgumentError::MissingKey(key.to_string())),
            other => Err(other.mismatch("a map")),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Resolved::Item(_) => 1,
            Resolved::List(items) => items.len(),
            Resolved::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Resolved::Item(_) => "a single instance",
            Resolved::List(_) => "a list",
            Resolved::Map(_) => "a map",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ArgumentError {
        ArgumentError::ShapeMismatch {
            expected,
            found: self.kind(),
        }
    }
}
