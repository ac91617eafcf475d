//! Login flow: provider exchange, directory resolution, credential issuance.

use crate::directory::UserDirectory;
use crate::error::AuthenticationError;
use crate::identity::{IdentityProvider, LoginInitiation};
use crate::token::{Credential, TokenService};
use crate::user::User;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub credential: Credential,
    /// Whether this login created the user.
    pub is_new_user: bool,
}

/// Drives a login from authorization code to session credential.
#[derive(Clone)]
pub struct LoginService {
    provider: Arc<dyn IdentityProvider>,
    directory: UserDirectory,
    tokens: TokenService,
}

impl LoginService {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        directory: UserDirectory,
        tokens: TokenService,
    ) -> Self {
        Self {
            provider,
            directory,
            tokens,
        }
    }

    /// Returns where to send the user to start a login.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the provider is misconfigured.
    pub fn initiate(&self) -> Result<LoginInitiation, Report<AuthenticationError>> {
        Ok(self
            .provider
            .authorization_url()
            .map_err(|e| AuthenticationError::ProviderError {
                provider: self.provider.name().to_string(),
                reason: e.to_string(),
            })?)
    }

    /// Completes a login with the code returned by the provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the exchange fails, `AccountInactive` for
    /// deactivated accounts and `Internal` if the directory or the credential
    /// encoder fails.
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn authenticate(&self, code: &str) -> Result<LoginOutcome, Report<AuthenticationError>> {
        let identity = self.provider.exchange_code(code).await.map_err(|e| {
            warn!(error = %e, "identity provider exchange failed");
            AuthenticationError::ProviderError {
                provider: self.provider.name().to_string(),
                reason: e.to_string(),
            }
        })?;

        let (user, is_new_user) = self
            .directory
            .resolve_login(&identity)
            .await
            .map_err(|report| AuthenticationError::Internal {
                details: report.to_string(),
            })?;

        if !user.is_active() {
            return Err(AuthenticationError::AccountInactive { user_id: user.id() }.into());
        }

        let credential = self.tokens.issue(&user, &identity.upstream_token)?;
        info!(user_id = %user.id(), is_new_user, "login succeeded");

        Ok(LoginOutcome {
            user,
            credential,
            is_new_user,
        })
    }
}
