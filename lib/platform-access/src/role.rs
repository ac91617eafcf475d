//! Role hierarchy and authorization checks.
//!
//! Roles form a single ordered hierarchy: `User < Moderator < Admin`.
//! A role satisfies a requirement when it is at least as high as the
//! required role, so an admin passes every moderator check while an
//! admin-only requirement accepts nothing but `Admin`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform role stored on the user record and copied into credentials.
///
/// Variant order is the privilege order; the derived `Ord` is the hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can submit and rate summaries.
    #[default]
    User,
    /// Can moderate and edit summaries and manage resource links.
    Moderator,
    /// Can additionally change other users' roles.
    Admin,
}

impl Role {
    /// Returns true if this role is at least `required`.
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    /// Returns true if this role has moderation capability.
    #[must_use]
    pub fn is_moderator(self) -> bool {
        self.satisfies(Self::Moderator)
    }

    /// Returns true if this role has admin privileges.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    pub value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(ParseRoleError {
                value: other.to_string(),
            }),
        }
    }
}

/// Returns true if `presented` satisfies any of the `required` roles.
///
/// An empty requirement list grants nothing.
#[must_use]
pub fn authorize(presented: Role, required: &[Role]) -> bool {
    required.iter().any(|r| presented.satisfies(*r))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 3] = [Role::User, Role::Moderator, Role::Admin];

    #[test]
    fn moderator_requirement_accepts_moderator_and_admin() {
        for role in ALL {
            let expected = matches!(role, Role::Moderator | Role::Admin);
            assert_eq!(authorize(role, &[Role::Moderator]), expected, "{role}");
        }
    }

    #[test]
    fn admin_requirement_accepts_only_admin() {
        assert!(!authorize(Role::User, &[Role::Admin]));
        assert!(!authorize(Role::Moderator, &[Role::Admin]));
        assert!(authorize(Role::Admin, &[Role::Admin]));
    }

    #[test]
    fn user_requirement_accepts_everyone() {
        for role in ALL {
            assert!(authorize(role, &[Role::User]));
        }
    }

    #[test]
    fn empty_requirement_grants_nothing() {
        for role in ALL {
            assert!(!authorize(role, &[]));
        }
    }

    #[test]
    fn role_predicates() {
        assert!(!Role::User.is_moderator());
        assert!(Role::Moderator.is_moderator());
        assert!(Role::Admin.is_moderator());
        assert!(!Role::Moderator.is_admin());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn role_parses_from_lowercase_names() {
        for role in ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.value, "superuser");
    }

    #[test]
    fn role_serialization_format() {
        let json = serde_json::to_string(&Role::Moderator).expect("serialize");
        assert_eq!(json, "\"moderator\"");

        let role: Role = serde_json::from_str("\"admin\"").expect("deserialize");
        assert_eq!(role, Role::Admin);
    }
}
