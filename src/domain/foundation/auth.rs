//! Authentication types for the domain layer.
//!
//! These types represent a verified principal extracted from a bearer token.
//! They carry no provider dependencies: the `SessionValidator` port populates
//! them from whatever token scheme the deployment uses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::UserId;

/// Role of a platform user, as recorded in the user directory.
///
/// The messaging core never constrains which roles may talk to each other;
/// the role is carried for presentation and auditing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Coach,
    Athlete,
}

impl UserRole {
    /// Returns the canonical lowercase name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Coach => "coach",
            UserRole::Athlete => "athlete",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coach" => Ok(UserRole::Coach),
            "athlete" => Ok(UserRole::Athlete),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown user role: {0}")]
pub struct UnknownRole(pub String);

/// Verified principal bound to a request or a real-time connection.
///
/// Produced exclusively by the `SessionValidator` port; every engine and
/// gateway operation receives it as an explicit argument, never via ambient
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the token's subject claim.
    pub id: UserId,

    /// The user's email address from the token claims.
    pub email: String,

    /// The user's platform role from the token claims.
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Creates a new verified principal.
    pub fn new(id: UserId, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential was presented at all.
    #[error("Missing credentials")]
    MissingCredentials,

    /// The token is malformed, has an invalid signature, or carries
    /// claims this service cannot interpret.
    #[error("Invalid token")]
    InvalidToken,

    /// The token has expired (kept separate from `InvalidToken` so callers
    /// can tell clients to re-authenticate rather than retry).
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new("user-123").unwrap()
    }

    #[test]
    fn authenticated_user_carries_identity_and_role() {
        let user = AuthenticatedUser::new(test_user_id(), "coach@gymlink.io", UserRole::Coach);

        assert_eq!(user.id.as_str(), "user-123");
        assert_eq!(user.email, "coach@gymlink.io");
        assert_eq!(user.role, UserRole::Coach);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("coach".parse::<UserRole>().unwrap(), UserRole::Coach);
        assert_eq!("ATHLETE".parse::<UserRole>().unwrap(), UserRole::Athlete);
    }

    #[test]
    fn role_rejects_unknown_names() {
        let err = "admin".parse::<UserRole>().unwrap_err();
        assert_eq!(err, UnknownRole("admin".to_string()));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Coach).unwrap(), "\"coach\"");
        assert_eq!(
            serde_json::to_string(&UserRole::Athlete).unwrap(),
            "\"athlete\""
        );
    }

    #[test]
    fn auth_error_display_messages() {
        assert_eq!(format!("{}", AuthError::MissingCredentials), "Missing credentials");
        assert_eq!(format!("{}", AuthError::TokenExpired), "Token expired");
        assert_eq!(
            format!("{}", AuthError::service_unavailable("boom")),
            "Auth service unavailable: boom"
        );
    }

    #[test]
    fn only_service_errors_are_transient() {
        assert!(AuthError::service_unavailable("timeout").is_transient());
        assert!(!AuthError::InvalidToken.is_transient());
        assert!(!AuthError::TokenExpired.is_transient());
        assert!(!AuthError::MissingCredentials.is_transient());
    }
}
