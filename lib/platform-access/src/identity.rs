//! Identity-provider contract.
//!
//! The provider turns an authorization code from the login redirect into a
//! stable external identity plus an opaque upstream token. How it does so
//! (OAuth exchange, profile lookup) is up to the implementation.

use async_trait::async_trait;
use std::fmt;

/// Profile returned by a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable identifier assigned by the provider.
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// Provider access token, carried opaquely in session credentials.
    pub upstream_token: String,
}

/// Where to send the user to start a login.
#[derive(Debug, Clone)]
pub struct LoginInitiation {
    /// The URL to redirect the user to for authentication.
    pub authorization_url: String,
    /// State parameter echoed back on the callback.
    pub state: String,
}

/// Errors from an identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider is misconfigured.
    Configuration { reason: String },
    /// The code could not be exchanged for a token.
    Exchange { reason: String },
    /// The token was issued but the profile lookup failed.
    Profile { reason: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => write!(f, "configuration error: {reason}"),
            Self::Exchange { reason } => write!(f, "code exchange failed: {reason}"),
            Self::Profile { reason } => write!(f, "profile lookup failed: {reason}"),
        }
    }
}

impl std::error::Error for IdentityError {}

/// An external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Builds the URL that starts a login.
    fn authorization_url(&self) -> Result<LoginInitiation, IdentityError>;

    /// Exchanges an authorization code for the user's identity.
    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, IdentityError>;
}
