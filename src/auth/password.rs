//! Password Hashing
//! Mission: One-way bcrypt digests for stored credentials

use crate::auth::errors::AuthError;
use bcrypt::{hash, verify, DEFAULT_COST};
use lazy_static::lazy_static;
use tracing::warn;

lazy_static! {
    /// Digest checked when the account does not exist, so both login failures cost one bcrypt round.
    static ref DUMMY_DIGEST: Option<String> = hash("kira-dummy-password", DEFAULT_COST).ok();
}

/// bcrypt only reads this many bytes of input; longer passwords are refused, never truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    if plain.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Validation(format!(
            "password must not exceed {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    hash(plain, DEFAULT_COST).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a plaintext password against a stored digest.
///
/// A malformed digest never matches, and neither does input too long to have been hashed.
pub fn verify_password(digest: &str, plain: &str) -> bool {
    if plain.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    match verify(plain, digest) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Stored password digest could not be checked: {}", e);
            false
        }
    }
}

/// Spend the same work as a real verification without any account behind it.
pub fn burn_verification(plain: &str) {
    if let Some(digest) = DUMMY_DIGEST.as_deref() {
        let _ = verify(plain, digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let digest = hash_password("longenough1").unwrap();
        assert!(digest.starts_with("$2"));
        assert_ne!(digest, "longenough1");
        assert!(verify_password(&digest, "longenough1"));
        assert!(!verify_password(&digest, "longenough2"));
        assert!(!verify_password(&digest, ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "same-password"));
        assert!(verify_password(&b, "same-password"));
    }

    #[test]
    fn test_shared_72_byte_prefix_does_not_match() {
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let real = format!("{}X-real-secret", prefix);
        let other = format!("{}totally-different", prefix);

        assert!(matches!(hash_password(&real), Err(AuthError::Validation(_))));

        let digest = hash_password(&prefix).unwrap();
        assert!(verify_password(&digest, &prefix));
        assert!(!verify_password(&digest, &real));
        assert!(!verify_password(&digest, &other));
    }

    #[test]
    fn test_multibyte_limit_counts_bytes() {
        // 24 chars, 72 bytes
        let at_limit = "\u{20ac}".repeat(24);
        assert!(hash_password(&at_limit).is_ok());
        let over = "\u{20ac}".repeat(25);
        assert!(matches!(hash_password(&over), Err(AuthError::Validation(_))));
    }

    #[test]
    fn test_malformed_digest_never_matches() {
        assert!(!verify_password("not-a-bcrypt-digest", "anything"));
    }

    #[test]
    fn test_burn_verification_is_silent() {
        burn_verification("whatever");
    }
}
