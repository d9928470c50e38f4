use crate::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use std::sync::OnceLock;

/// Hashes a password with Argon2id and a fresh random salt.
///
/// The cost parameters are the crate defaults and are fixed for the lifetime
/// of the deployment; stored hashes embed their parameters so a future bump
/// would not invalidate existing rows.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored hash.
///
/// When `stored_hash` is `None` (unknown username), the password is verified
/// against a fixed dummy hash instead so the call performs the same amount of
/// work either way; the result is always `false` in that case. Callers must
/// not branch on username existence before calling this.
pub fn verify_password(password: &str, stored_hash: Option<&str>) -> bool {
    let dummy = dummy_hash();
    let (hash, known) = match stored_hash {
        Some(h) => (h, true),
        None => (dummy.as_str(), false),
    };

    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };

    let ok = Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok();

    ok && known
}

/// A hash of a fixed throwaway password, computed once per process.
fn dummy_hash() -> &'static String {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        hash_password("lingua-timing-baseline").expect("hashing a fixed password cannot fail")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("pw1").expect("hashing should succeed");
        assert!(verify_password("pw1", Some(&hash)));
        assert!(!verify_password("pw2", Some(&hash)));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").expect("hashing should succeed");
        let b = hash_password("same-password").expect("hashing should succeed");
        assert_ne!(a, b, "two hashes of one password should differ by salt");
    }

    #[test]
    fn unknown_user_always_fails() {
        assert!(!verify_password("anything", None));
        // Even the dummy baseline password must not verify for an absent user.
        assert!(!verify_password("lingua-timing-baseline", None));
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify_password("pw", Some("not-a-phc-string")));
    }
}
