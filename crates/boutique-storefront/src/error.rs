//! Storefront error types.

use boutique_commerce::CommerceError;
use thiserror::Error;

/// Errors raised by the storefront.
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed.
    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Config values are unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A UI event was rejected by the cart or checkout.
    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

impl StorefrontError {
    /// The underlying commerce error, if this is one.
    pub fn as_commerce(&self) -> Option<&CommerceError> {
        match self {
            Self::Commerce(e) => Some(e),
            _ => None,
        }
    }
}
