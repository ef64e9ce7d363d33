//! Session validation port for bearer-credential verification.
//!
//! This port defines the contract for validating access tokens and
//! extracting the caller's identity. It is provider-agnostic: the production
//! adapter verifies the platform's HMAC-signed JWTs, and a mock exists for
//! tests.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates access tokens and extracts the verified principal.
///
/// Both the HTTP middleware and the WebSocket handshake use this port, so
/// REST requests and real-time connections authenticate identically.
///
/// # Contract
///
/// Implementations must:
/// - Verify the token signature and expiry before trusting any claim
/// - Return `AuthError::TokenExpired` for expired tokens (clients
///   re-authenticate instead of retrying)
/// - Return `AuthError::InvalidToken` for anything malformed or forged
/// - Never panic on attacker-controlled token bytes
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validates a bearer token and returns the principal it names.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
