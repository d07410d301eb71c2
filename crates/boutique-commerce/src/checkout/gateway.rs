//! Payment gateway client seam.
//!
//! The storefront never sees raw card numbers. A hosted card widget is
//! attached to a mount point and asked for a one-time token. These traits
//! describe that widget; implementations wrap a real SDK or a sandbox.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Merchant-account identifiers handed to the gateway client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCredentials {
    pub application_id: String,
    pub location_id: String,
}

/// Faults raised by the gateway client. All are recoverable by the page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway client could not be loaded or constructed.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The card input could not be created or attached.
    #[error("card input could not be attached: {0}")]
    Attach(String),

    /// The tokenize call itself failed (network, SDK exception).
    #[error("tokenization failed: {0}")]
    Tokenize(String),
}

/// Status reported by a tokenize call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenStatus {
    Ok,
    Other(String),
}

impl TokenStatus {
    /// Check if the gateway accepted the card details.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<String> for TokenStatus {
    fn from(status: String) -> Self {
        if status == "OK" {
            Self::Ok
        } else {
            Self::Other(status)
        }
    }
}

impl From<TokenStatus> for String {
    fn from(status: TokenStatus) -> Self {
        match status {
            TokenStatus::Ok => "OK".to_string(),
            TokenStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A field-level validation error returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayFieldError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Result of a tokenize call that reached the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeResult {
    pub status: TokenStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GatewayFieldError>,
}

impl TokenizeResult {
    /// An accepted card.
    pub fn ok(token: impl Into<String>) -> Self {
        Self {
            status: TokenStatus::Ok,
            token: Some(token.into()),
            errors: Vec::new(),
        }
    }

    /// A rejected card with validation messages.
    pub fn failed<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: TokenStatus::Other("FAILED".to_string()),
            token: None,
            errors: messages
                .into_iter()
                .map(|m| GatewayFieldError {
                    message: m.into(),
                    field: None,
                })
                .collect(),
        }
    }

    /// Validation messages joined for display, if there are any.
    pub fn joined_messages(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Hosted card-entry widget.
#[async_trait]
pub trait CardInput: Send + Sync {
    /// Attach the widget to a mount point in the page.
    async fn attach(&mut self, mount_point: &str) -> Result<(), GatewayError>;

    /// Tokenize whatever card details are currently entered.
    async fn tokenize(&self) -> Result<TokenizeResult, GatewayError>;
}

/// A constructed gateway client.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a new card input.
    async fn card(&self) -> Result<Box<dyn CardInput>, GatewayError>;
}

/// Loads the gateway client, standing in for the vendor script tag.
pub trait GatewayLoader: Send + Sync {
    /// Construct a client for the given merchant account.
    fn load(&self, credentials: &GatewayCredentials)
        -> Result<Arc<dyn PaymentGateway>, GatewayError>;
}

/// Load the gateway, create a card input and attach it.
///
/// This is the whole initialization sequence. Any failure along the way is
/// a configuration fault for the page.
pub async fn initialize_card(
    loader: &dyn GatewayLoader,
    credentials: &GatewayCredentials,
    mount_point: &str,
) -> Result<Arc<dyn CardInput>, GatewayError> {
    let gateway = loader.load(credentials)?;
    let mut card = gateway.card().await?;
    card.attach(mount_point).await?;
    Ok(Arc::from(card))
}
