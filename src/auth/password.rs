//! Password hashing with bcrypt. Salts are generated per call and embedded
//! in the digest.

use crate::error::ApiError;

const COST: u32 = bcrypt::DEFAULT_COST;

pub fn hash(plaintext: &str) -> Result<String, ApiError> {
    bcrypt::hash(plaintext, COST).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to process credentials")
    })
}

/// Verify a plaintext password against a stored digest. A malformed digest
/// verifies as false rather than erroring; callers treat both as denied.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let digest = hash("hunter2!").unwrap();
        assert!(verify("hunter2!", &digest));
    }

    #[test]
    fn wrong_password_fails() {
        let digest = hash("hunter2!").unwrap();
        assert!(!verify("hunter3!", &digest));
    }

    #[test]
    fn same_password_hashes_differently_per_call() {
        let a = hash("hunter2!").unwrap();
        let b = hash("hunter2!").unwrap();
        assert_ne!(a, b);
        assert!(verify("hunter2!", &a));
        assert!(verify("hunter2!", &b));
    }

    #[test]
    fn malformed_digest_verifies_as_false() {
        assert!(!verify("hunter2!", "not-a-bcrypt-digest"));
        assert!(!verify("hunter2!", ""));
    }
}
