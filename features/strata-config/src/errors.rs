use strata_di::TypeInfo;

/// Errors of the config registry
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The required Config is not known
    #[error("Config type {0} is not known")]
    Missing(TypeInfo),
    /// The Config is already registered
    #[error("Config type {0} is already registered")]
    AlreadyRegistered(TypeInfo),
}
