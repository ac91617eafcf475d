//! Authentication for the factnotes server.
//!
//! This module provides:
//! - Facebook login through the [`IdentityProvider`] contract
//! - Bearer-credential extractors for Axum routes
//! - The shared [`AppState`]
//!
//! # Authorization Model
//!
//! Credentials are stateless signed tokens carrying the user's role at
//! issuance. Extractors verify them without a store lookup; the revocation
//! list held by the token service rejects credentials that predate a role
//! or status change. Domain operations receive a [`Caller`] and apply the
//! role hierarchy themselves, so the route-level extractors only reject
//! early.
//!
//! [`IdentityProvider`]: factnotes_platform_access::IdentityProvider
//! [`Caller`]: factnotes_platform_access::Caller

pub mod facebook;
pub mod middleware;
pub mod routes;

use factnotes_moderation::{ModerationWorkflow, ResourceLinkRegistry};
use factnotes_platform_access::{LoginService, TokenService, UserDirectory};

pub use facebook::FacebookProvider;
pub use middleware::{AuthRejection, OptionalAuth, RequireAdmin, RequireAuth, RequireModerator};
pub use routes::{callback, login};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub login: LoginService,
    pub directory: UserDirectory,
    pub workflow: ModerationWorkflow,
    pub links: ResourceLinkRegistry,
}
