//! Platform access, authentication, and authorization for factnotes.
//!
//! This crate provides:
//! - Roles and the single hierarchy check (`Role`, `authorize`)
//! - Signed, stateless session credentials (`TokenService`, `SessionClaims`)
//! - Per-user revocation watermarks (`RevocationList`)
//! - User lifecycle (`User`, `UserDirectory`, `UserStore`)
//! - The identity-provider contract and login flow (`IdentityProvider`,
//!   `LoginService`)
//!
//! # Access Control Model
//!
//! Roles form one ordered hierarchy, `user < moderator < admin`. The role
//! is copied into the credential at issuance so that verifying a request
//! needs no store lookup. Role changes and deactivations revoke earlier
//! credentials through the revocation list, and admin-only changes also
//! re-check the caller's role against the store.
//!
//! # Example
//!
//! ```
//! use factnotes_platform_access::{
//!     Caller, RevocationList, Role, TokenConfig, TokenService, User,
//! };
//!
//! let tokens = TokenService::new(&TokenConfig::new("secret"), RevocationList::new())
//!     .expect("token service");
//!
//! let mut user = User::new("fb_1001".to_string(), "Alice".to_string(), None);
//! user.set_role(Role::Moderator);
//!
//! let credential = tokens.issue(&user, "upstream-token").expect("issue");
//! let claims = tokens.verify(credential.as_str()).expect("verify");
//!
//! let caller = Caller::User((&claims).into());
//! assert!(caller.require("moderate summary", &[Role::Moderator]).is_ok());
//! assert!(caller.require("change user role", &[Role::Admin]).is_err());
//! ```

pub mod auth;
pub mod directory;
pub mod error;
pub mod identity;
pub mod login;
pub mod memory;
pub mod revocation;
pub mod role;
pub mod store;
pub mod token;
pub mod user;

// Re-export main types at crate root
pub use auth::{AuthenticatedUser, Caller};
pub use directory::UserDirectory;
pub use error::{AuthenticationError, AuthorizationError, DirectoryError};
pub use identity::{ExternalIdentity, IdentityError, IdentityProvider, LoginInitiation};
pub use login::{LoginOutcome, LoginService};
pub use memory::InMemoryUserStore;
pub use revocation::RevocationList;
pub use role::{ParseRoleError, Role, authorize};
pub use store::UserStore;
pub use token::{Credential, SessionClaims, TokenConfig, TokenService};
pub use user::User;
