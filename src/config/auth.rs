//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// JWT authentication configuration.
///
/// The signing secret is shared with the platform's auth service, which
/// issues the tokens this service verifies.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing secret
    pub jwt_secret: Secret<String>,
}

impl AuthConfig {
    /// Validate authentication configuration.
    ///
    /// Production requires a secret of at least 32 bytes; development only
    /// requires it to be non-empty.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("auth.jwt_secret"));
        }
        if *environment == Environment::Production && secret.len() < 32 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        Ok(())
    }
}
