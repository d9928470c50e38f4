use crate::AuthError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token lifetime: 24 hours from issuance.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user id.
    pub sub: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues a signed session token for the given user id.
///
/// The token is an HS256 JWT with subject, issued-at, and a fixed
/// [`TOKEN_TTL_SECS`] expiry.
pub fn issue_token(secret: &str, user_id: &str) -> Result<String, AuthError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verifies a session token and returns the subject user id.
///
/// Expired and malformed tokens are reported as distinct errors, but callers
/// must treat both as unauthenticated.
pub fn verify_token(secret: &str, token: &str) -> Result<String, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_then_verify_returns_subject() {
        let token = issue_token(SECRET, "user-123").expect("issuing should succeed");
        let subject = verify_token(SECRET, &token).expect("verification should succeed");
        assert_eq!(subject, "user-123");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = issue_token(SECRET, "user-123").expect("issuing should succeed");
        let err = verify_token("other-secret", &token).expect_err("should reject wrong secret");
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn garbage_token_rejected() {
        let err = verify_token(SECRET, "not.a.jwt").expect_err("should reject garbage");
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn token_older_than_ttl_rejected() {
        // Forge claims a day past expiry; the signature is valid, only time fails.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-123".to_string(),
            iat: now - 2 * TOKEN_TTL_SECS,
            exp: now - TOKEN_TTL_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("encoding should succeed");

        let err = verify_token(SECRET, &token).expect_err("should reject expired token");
        assert!(matches!(err, AuthError::TokenExpired));
    }
}
