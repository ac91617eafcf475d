//! Facebook login.
//!
//! Exchanges the authorization code for an access token with the `oauth2`
//! crate, then reads the profile from the Graph API
//! (`/me?fields=id,name,picture`).

use async_trait::async_trait;
use factnotes_platform_access::{
    ExternalIdentity, IdentityError, IdentityProvider, LoginInitiation,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::Deserialize;

use crate::config::FacebookConfig;

/// Scopes requested from Facebook.
const FACEBOOK_SCOPES: &[&str] = &["email", "public_profile"];

/// Facebook OAuth client and profile fetcher.
#[derive(Clone)]
pub struct FacebookProvider {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    graph_url: String,
    http_client: reqwest::Client,
}

impl FacebookProvider {
    /// Creates the provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &FacebookConfig) -> Result<Self, IdentityError> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| configuration(format!("invalid redirect URL: {e}")))?;

        // Redirects are not followed during the token exchange.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            auth_url,
            token_url,
            redirect_url,
            graph_url: config.graph_url.clone(),
            http_client,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GraphProfile, IdentityError> {
        let response = self
            .http_client
            .get(&self.graph_url)
            .query(&[("fields", "id,name,picture"), ("access_token", access_token)])
            .send()
            .await
            .map_err(|e| profile(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(profile(format!("graph API returned {}", response.status())));
        }

        response
            .json::<GraphProfile>()
            .await
            .map_err(|e| profile(format!("unexpected response: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for FacebookProvider {
    fn name(&self) -> &str {
        "facebook"
    }

    fn authorization_url(&self) -> Result<LoginInitiation, IdentityError> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let mut auth_request = client.authorize_url(CsrfToken::new_random);
        for scope in FACEBOOK_SCOPES {
            auth_request = auth_request.add_scope(Scope::new((*scope).to_string()));
        }
        let (url, csrf_token) = auth_request.url();

        Ok(LoginInitiation {
            authorization_url: url.to_string(),
            state: csrf_token.secret().clone(),
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, IdentityError> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| IdentityError::Exchange {
                reason: e.to_string(),
            })?;
        let access_token = token.access_token().secret().clone();

        let profile = self.fetch_profile(&access_token).await?;
        Ok(profile.into_identity(access_token))
    }
}

/// Subset of the Graph API `/me` response.
#[derive(Debug, Deserialize)]
struct GraphProfile {
    id: String,
    name: String,
    #[serde(default)]
    picture: Option<GraphPicture>,
}

#[derive(Debug, Deserialize)]
struct GraphPicture {
    data: GraphPictureData,
}

#[derive(Debug, Deserialize)]
struct GraphPictureData {
    url: String,
}

impl GraphProfile {
    fn into_identity(self, upstream_token: String) -> ExternalIdentity {
        ExternalIdentity {
            external_id: self.id,
            display_name: self.name,
            avatar_url: self.picture.map(|p| p.data.url),
            upstream_token,
        }
    }
}

fn configuration(reason: String) -> IdentityError {
    IdentityError::Configuration { reason }
}

fn profile(reason: String) -> IdentityError {
    IdentityError::Profile { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FacebookConfig {
        FacebookConfig {
            client_id: "app-id".to_string(),
            client_secret: "app-secret".to_string(),
            redirect_uri: "http://localhost:8080/api/auth/login/callback".to_string(),
            auth_url: "https://www.facebook.com/v16.0/dialog/oauth".to_string(),
            token_url: "https://graph.facebook.com/v16.0/oauth/access_token".to_string(),
            graph_url: "https://graph.facebook.com/me".to_string(),
        }
    }

    #[test]
    fn authorization_url_carries_client_and_redirect() {
        let provider = FacebookProvider::new(&config()).expect("provider");
        let initiation = provider.authorization_url().expect("url");

        assert!(
            initiation
                .authorization_url
                .starts_with("https://www.facebook.com/v16.0/dialog/oauth?")
        );
        assert!(initiation.authorization_url.contains("client_id=app-id"));
        assert!(initiation.authorization_url.contains("redirect_uri="));
        assert!(
            initiation
                .authorization_url
                .contains(&format!("state={}", initiation.state))
        );
    }

    #[test]
    fn invalid_redirect_is_a_configuration_error() {
        let mut config = config();
        config.redirect_uri = "not a url".to_string();
        assert!(matches!(
            FacebookProvider::new(&config),
            Err(IdentityError::Configuration { .. })
        ));
    }

    #[test]
    fn graph_profile_maps_picture() {
        let profile: GraphProfile = serde_json::from_value(serde_json::json!({
            "id": "10001",
            "name": "Alice",
            "picture": { "data": { "url": "https://cdn.example/alice.jpg" } }
        }))
        .expect("profile");

        let identity = profile.into_identity("upstream".to_string());
        assert_eq!(identity.external_id, "10001");
        assert_eq!(identity.display_name, "Alice");
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://cdn.example/alice.jpg")
        );
    }
}
