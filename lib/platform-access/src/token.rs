//! Signed session credentials.
//!
//! A credential is an HS256 JWT carrying the user's id, the role they held
//! at issuance and the opaque upstream token obtained from the identity
//! provider. Verification needs only the signing secret and the in-process
//! [`RevocationList`]; it never touches the user store.

use crate::error::AuthenticationError;
use crate::revocation::RevocationList;
use crate::role::Role;
use crate::user::User;
use chrono::{DateTime, Duration, TimeZone, Utc};
use factnotes_core::{CredentialId, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Configuration for credential issuance.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Deserialize)]
pub struct TokenConfig {
    /// HMAC secret used to sign credentials.
    secret: String,
    /// Credential lifetime in hours.
    /// Default: 72
    #[serde(default = "default_ttl_hours")]
    ttl_hours: i64,
    /// Value of the `iss` claim.
    /// Default: "factnotes"
    #[serde(default = "default_issuer")]
    issuer: String,
}

fn default_ttl_hours() -> i64 {
    72
}

/// Longest credential lifetime accepted, one year.
pub const MAX_TTL_HOURS: i64 = 24 * 366;

fn default_issuer() -> String {
    "factnotes".to_string()
}

impl TokenConfig {
    /// Creates a configuration with the default lifetime and issuer.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_hours: default_ttl_hours(),
            issuer: default_issuer(),
        }
    }

    /// Sets the credential lifetime.
    #[must_use]
    pub fn with_ttl_hours(mut self, ttl_hours: i64) -> Self {
        self.ttl_hours = ttl_hours;
        self
    }

    /// Configured lifetime, saturating for out-of-range values.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::try_hours(self.ttl_hours).unwrap_or(Duration::MAX)
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_hours", &self.ttl_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// An encoded credential as handed to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<String> for Credential {
    fn from(encoded: String) -> Self {
        Self(encoded)
    }
}

/// Claims embedded in a credential. Immutable once issued.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    sub: UserId,
    role: Role,
    /// Opaque token from the identity provider.
    access_token: String,
    iss: String,
    iat: i64,
    /// Issue time in microseconds, compared against revocation watermarks.
    iat_micros: i64,
    exp: i64,
    jti: CredentialId,
}

impl SessionClaims {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// The role the user held when the credential was issued.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn upstream_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn credential_id(&self) -> CredentialId {
        self.jti
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.iat_micros).unwrap_or_default()
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_default()
    }
}

impl fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClaims")
            .field("sub", &self.sub)
            .field("role", &self.role)
            .field("access_token", &"<redacted>")
            .field("iss", &self.iss)
            .field("iat", &self.iat)
            .field("iat_micros", &self.iat_micros)
            .field("exp", &self.exp)
            .field("jti", &self.jti)
            .finish()
    }
}

/// Issues and verifies credentials.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    issuer: String,
    revocations: RevocationList,
}

impl TokenService {
    /// Creates a token service.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty or the lifetime is outside
    /// `1..=MAX_TTL_HOURS`.
    pub fn new(
        config: &TokenConfig,
        revocations: RevocationList,
    ) -> Result<Self, Report<AuthenticationError>> {
        if config.secret.is_empty() {
            return Err(AuthenticationError::Internal {
                details: "credential signing secret must not be empty".to_string(),
            }
            .into());
        }
        if !(1..=MAX_TTL_HOURS).contains(&config.ttl_hours) {
            return Err(AuthenticationError::Internal {
                details: format!(
                    "credential lifetime must be between 1h and {MAX_TTL_HOURS}h, got {}h",
                    config.ttl_hours
                ),
            }
            .into());
        }

        // Expiry is checked by hand against the caller-supplied instant.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl(),
            issuer: config.issuer.clone(),
            revocations,
        })
    }

    /// The revocation list consulted by [`verify`](Self::verify).
    #[must_use]
    pub fn revocations(&self) -> &RevocationList {
        &self.revocations
    }

    /// Credential lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a credential for `user` valid from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue(
        &self,
        user: &User,
        upstream_token: &str,
    ) -> Result<Credential, Report<AuthenticationError>> {
        self.issue_at(user, upstream_token, Utc::now())
    }

    /// Issues a credential as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be encoded.
    pub fn issue_at(
        &self,
        user: &User,
        upstream_token: &str,
        now: DateTime<Utc>,
    ) -> Result<Credential, Report<AuthenticationError>> {
        let claims = SessionClaims {
            sub: user.id(),
            role: user.role(),
            access_token: upstream_token.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            iat_micros: now.timestamp_micros(),
            exp: (now + self.ttl).timestamp(),
            jti: CredentialId::new(),
        };

        let encoded = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| AuthenticationError::Internal {
                details: format!("failed to encode credential: {e}"),
            },
        )?;

        debug!(user_id = %claims.sub, role = %claims.role, jti = %claims.jti, "issued credential");
        Ok(Credential(encoded))
    }

    /// Verifies a credential against the current time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredential`, `CredentialExpired` or `CredentialRevoked`.
    pub fn verify(&self, credential: &str) -> Result<SessionClaims, Report<AuthenticationError>> {
        self.verify_at(credential, Utc::now())
    }

    /// Verifies a credential as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredential`, `CredentialExpired` or `CredentialRevoked`.
    pub fn verify_at(
        &self,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, Report<AuthenticationError>> {
        let data = decode::<SessionClaims>(credential, &self.decoding, &self.validation).map_err(
            |e| AuthenticationError::InvalidCredential {
                reason: e.to_string(),
            },
        )?;
        let claims = data.claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthenticationError::CredentialExpired.into());
        }

        if self.revocations.is_revoked(claims.sub, claims.issued_at()) {
            return Err(AuthenticationError::CredentialRevoked {
                user_id: claims.sub,
            }
            .into());
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn service() -> TokenService {
        TokenService::new(&TokenConfig::new("test-secret"), RevocationList::new())
            .expect("token service")
    }

    fn moderator() -> User {
        let mut user = User::new("fb_42".to_string(), "Mo".to_string(), None);
        user.set_role(Role::Moderator);
        user
    }

    #[test]
    fn issued_credential_verifies_with_same_identity() {
        let tokens = service();
        let user = moderator();

        let credential = tokens.issue(&user, "upstream-abc").expect("issue");
        let claims = tokens.verify(credential.as_str()).expect("verify");

        assert_eq!(claims.user_id(), user.id());
        assert_eq!(claims.role(), Role::Moderator);
        assert_eq!(claims.upstream_token(), "upstream-abc");
    }

    #[test]
    fn credential_expires_after_seventy_two_hours() {
        let tokens = service();
        let user = moderator();
        let issued = Utc::now() - Duration::hours(100);

        let credential = tokens.issue_at(&user, "t", issued).expect("issue");

        let claims = tokens
            .verify_at(credential.as_str(), issued + Duration::hours(71))
            .expect("still valid");
        assert_eq!(
            claims.expires_at().timestamp() - claims.issued_at().timestamp(),
            Duration::hours(72).num_seconds()
        );

        let report = tokens
            .verify_at(credential.as_str(), issued + Duration::hours(72))
            .expect_err("expired");
        assert_eq!(
            report.current_context(),
            &AuthenticationError::CredentialExpired
        );
    }

    #[test]
    fn tampered_credential_is_invalid() {
        let tokens = service();
        let credential = tokens.issue(&moderator(), "t").expect("issue");
        let mut tampered = credential.into_string();
        tampered.push('x');

        let report = tokens.verify(&tampered).expect_err("tampered");
        assert!(matches!(
            report.current_context(),
            AuthenticationError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn credential_from_other_secret_is_invalid() {
        let other = TokenService::new(&TokenConfig::new("other-secret"), RevocationList::new())
            .expect("token service");
        let credential = other.issue(&moderator(), "t").expect("issue");

        let report = service().verify(credential.as_str()).expect_err("foreign");
        assert!(matches!(
            report.current_context(),
            AuthenticationError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        let report = service().verify("not-a-jwt").expect_err("garbage");
        assert!(matches!(
            report.current_context(),
            AuthenticationError::InvalidCredential { .. }
        ));
    }

    #[test]
    fn revoked_credential_is_rejected_but_newer_one_is_not() {
        let tokens = service();
        let user = moderator();
        let now = Utc::now();

        let stale = tokens
            .issue_at(&user, "t", now - Duration::minutes(10))
            .expect("issue");
        tokens
            .revocations()
            .revoke_at(user.id(), now - Duration::minutes(5));
        let fresh = tokens.issue_at(&user, "t", now).expect("issue");

        let report = tokens.verify_at(stale.as_str(), now).expect_err("revoked");
        assert_eq!(
            report.current_context(),
            &AuthenticationError::CredentialRevoked { user_id: user.id() }
        );
        tokens.verify_at(fresh.as_str(), now).expect("fresh credential");
    }

    #[test]
    fn demotion_later_in_the_same_second_revokes_credential() {
        let tokens = service();
        let user = moderator();
        let second = Utc::now()
            .with_nanosecond(0)
            .expect("whole second");

        let credential = tokens
            .issue_at(&user, "t", second + Duration::milliseconds(100))
            .expect("issue");
        tokens
            .revocations()
            .revoke_at(user.id(), second + Duration::milliseconds(900));

        let report = tokens
            .verify_at(credential.as_str(), second + Duration::milliseconds(1900))
            .expect_err("revoked");
        assert_eq!(
            report.current_context(),
            &AuthenticationError::CredentialRevoked { user_id: user.id() }
        );
    }

    #[test]
    fn lifetime_outside_bounds_is_rejected() {
        for hours in [0, -1, MAX_TTL_HOURS + 1, i64::MAX] {
            let config = TokenConfig::new("s").with_ttl_hours(hours);
            assert!(
                TokenService::new(&config, RevocationList::new()).is_err(),
                "{hours}h accepted"
            );
        }
        let config = TokenConfig::new("s").with_ttl_hours(MAX_TTL_HOURS);
        assert!(TokenService::new(&config, RevocationList::new()).is_ok());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let result = TokenService::new(&TokenConfig::new(""), RevocationList::new());
        assert!(result.is_err());
    }

    #[test]
    fn config_debug_redacts_secret() {
        let rendered = format!("{:?}", TokenConfig::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn config_defaults() {
        let config: TokenConfig =
            serde_json::from_str(r#"{"secret": "s"}"#).expect("deserialize");
        assert_eq!(config.ttl(), Duration::hours(72));
        assert_eq!(config.issuer(), "factnotes");
    }
}
