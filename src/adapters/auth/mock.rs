//! Mock session validator for testing.
//!
//! Maps literal token strings to principals, avoiding real JWT plumbing in
//! handler and integration tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

/// Mock session validator.
///
/// Tokens not in the map return `InvalidToken`. An error can be forced for
/// every validation to exercise failure paths.
#[derive(Debug, Default)]
pub struct MockSessionValidator {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    force_error: RwLock<Option<AuthError>>,
}

impl MockSessionValidator {
    /// Creates a new empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a principal.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.tokens.write().unwrap().insert(token.into(), user);
        self
    }

    /// Makes every subsequent validation fail with the given error.
    pub fn failing_with(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap() = Some(error);
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self.force_error.read().unwrap().clone() {
            return Err(error);
        }
        self.tokens
            .read()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{UserId, UserRole};

    fn athlete() -> AuthenticatedUser {
        AuthenticatedUser::new(
            UserId::new("42").unwrap(),
            "athlete@gymlink.io",
            UserRole::Athlete,
        )
    }

    #[tokio::test]
    async fn known_token_returns_its_principal() {
        let validator = MockSessionValidator::new().with_user("tok", athlete());
        let principal = validator.validate("tok").await.unwrap();
        assert_eq!(principal.id.as_str(), "42");
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let validator = MockSessionValidator::new();
        let err = validator.validate("nope").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn forced_error_overrides_token_lookup() {
        let validator = MockSessionValidator::new()
            .with_user("tok", athlete())
            .failing_with(AuthError::TokenExpired);
        let err = validator.validate("tok").await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }
}
