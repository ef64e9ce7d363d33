//! JWT adapter for bearer-credential validation.
//!
//! Implements the `SessionValidator` port against the platform's
//! HMAC-SHA256-signed tokens. The auth service issues tokens whose claims
//! carry the user id (subject), email, and role; this adapter verifies the
//! signature and expiry, then maps the claims onto the domain principal.
//!
//! Token issuing lives here too so that integration tests (and the local dev
//! loop) can mint credentials with the same claim layout the auth service
//! uses.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId, UserRole};
use crate::ports::SessionValidator;

/// Claims layout shared with the platform's auth service.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject - the user id.
    sub: String,

    /// The user's email address.
    email: String,

    /// The user's platform role ("coach" / "athlete").
    role: String,

    /// Expiry timestamp (Unix epoch seconds).
    exp: i64,

    /// Issued at timestamp.
    #[serde(default)]
    iat: Option<i64>,
}

/// HMAC-SHA256 session validator.
pub struct JwtSessionValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionValidator {
    /// Creates a validator for the given shared signing secret.
    pub fn new(secret: &Secret<String>) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issues a signed token for a principal, valid for `ttl`.
    ///
    /// Mirrors the claim layout the auth service uses, so tokens minted here
    /// validate interchangeably with production ones.
    pub fn issue_token(
        &self,
        user: &AuthenticatedUser,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.to_string(),
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Token signing failed");
            AuthError::service_unavailable("token signing failed")
        })
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "Token rejected");
                    AuthError::InvalidToken
                }
            }
        })?;

        let id = UserId::new(data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let role: UserRole = data.claims.role.parse().map_err(|_| {
            tracing::debug!("Token carried unknown role claim");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(id, data.claims.email, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(&Secret::new(
            "test-signing-secret-of-decent-length".to_string(),
        ))
    }

    fn coach() -> AuthenticatedUser {
        AuthenticatedUser::new(
            UserId::new("17").unwrap(),
            "coach@gymlink.io",
            UserRole::Coach,
        )
    }

    #[tokio::test]
    async fn issued_tokens_validate_back_to_the_principal() {
        let validator = validator();
        let token = validator.issue_token(&coach(), Duration::minutes(15)).unwrap();

        let principal = validator.validate(&token).await.unwrap();

        assert_eq!(principal.id.as_str(), "17");
        assert_eq!(principal.email, "coach@gymlink.io");
        assert_eq!(principal.role, UserRole::Coach);
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected_as_expired() {
        let validator = validator();
        let token = validator
            .issue_token(&coach(), Duration::seconds(-120))
            .unwrap();

        let err = validator.validate(&token).await.unwrap_err();
        assert_eq!(err, AuthError::TokenExpired);
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected_as_invalid() {
        let validator = validator();
        let err = validator.validate("not-a-jwt").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn tokens_signed_with_another_secret_are_rejected() {
        let other =
            JwtSessionValidator::new(&Secret::new("a-completely-different-secret".to_string()));
        let token = other.issue_token(&coach(), Duration::minutes(15)).unwrap();

        let err = validator().validate(&token).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn unknown_role_claims_are_rejected() {
        let validator = validator();
        let now = Utc::now();
        let claims = Claims {
            sub: "17".to_string(),
            email: "x@gymlink.io".to_string(),
            role: "superadmin".to_string(),
            exp: (now + Duration::minutes(5)).timestamp(),
            iat: Some(now.timestamp()),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &validator.encoding_key,
        )
        .unwrap();

        let err = validator.validate(&token).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }
}
