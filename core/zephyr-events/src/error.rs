//! Error types

use crate::key::EventKey;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmitterError>;

#[derive(Debug, Error)]
pub enum EmitterError {
    /// A unary handler on the wildcard key, or a wildcard handler on a
    /// regular key
    #[error("listener signature does not match key `{key}`")]
    SignatureMismatch { key: EventKey },

    #[error("invalid emitter config: {0}")]
    Config(String),
}

impl From<toml::de::Error> for EmitterError {
    fn from(err: toml::de::Error) -> Self {
        EmitterError::Config(err.to_string())
    }
}
