//! Client error taxonomy.
//!
//! Remote failures are mapped by status: login/register rejections become
//! [`ClientError::Authentication`], 401/403 on an authenticated call becomes
//! [`ClientError::Authorization`] (and forces a logout), 404 becomes
//! [`ClientError::NotFound`], anything else non-2xx is [`ClientError::Api`].
//! The remaining variants are raised locally before any request is made.

use forkline_core::{FoodId, OrderId, Role, TransitionError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::StoreError;

/// Result alias used throughout the client.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Everything that can go wrong in a client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input failed local validation; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The auth service rejected the credentials or registration.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The backend refused an authenticated call (401/403).
    #[error("not authorized (HTTP {status})")]
    Authorization { status: u16 },

    /// The backend returned 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// Any other non-2xx response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A 2xx response whose body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error(transparent)]
    IllegalTransition(#[from] TransitionError),

    #[error("not signed in")]
    NotAuthenticated,

    #[error("this action requires the {required} role")]
    WrongRole { required: Role },

    #[error("unknown menu item #{0}")]
    UnknownItem(FoodId),

    #[error("unknown order #{0}")]
    UnknownOrder(OrderId),

    /// The user declined a confirmation prompt.
    #[error("delete cancelled")]
    DeleteDeclined,

    #[error("session storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Text suitable for a notification body: the server message where there
    /// is one, the error's display text otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message)
            | Self::Authentication(message)
            | Self::Api { message, .. } => message.clone(),
            Self::Authorization { .. } => "Your session has expired. Please sign in again.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the backend rejected the session token.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
