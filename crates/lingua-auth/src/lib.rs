//! Credential hashing and session tokens for the Lingua backend.
//!
//! Passwords are hashed with Argon2id (salted, fixed default cost) and
//! verified in constant time. Sessions are stateless HS256 JWTs carrying the
//! user id as subject with a fixed 24-hour lifetime; verification failures
//! collapse to "unauthenticated" regardless of cause.

mod credentials;
mod token;

pub use credentials::{hash_password, verify_password};
pub use token::{issue_token, verify_token, Claims, TOKEN_TTL_SECS};

use thiserror::Error;

/// Errors produced by credential and token operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing failed (out of memory, malformed parameters).
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The token's signature or structure is invalid.
    #[error("invalid token")]
    InvalidToken,

    /// The token is structurally valid but past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// Signing a new token failed.
    #[error("failed to sign token: {0}")]
    Signing(String),
}
