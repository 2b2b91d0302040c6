//! Password hashing via bcrypt.
//!
//! Hashes are self-describing (`$2b$10$<salt><digest>`), so verification
//! needs no separately stored salt or cost.

use super::AuthError;

/// Work factor for new hashes. Existing hashes keep the cost they were made with.
pub const BCRYPT_COST: u32 = 10;

/// Hash `plaintext` with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    bcrypt::hash(plaintext, BCRYPT_COST).map_err(|e| AuthError::Internal(format!("hash: {e}")))
}

/// Check `plaintext` against a stored hash.
///
/// A wrong password is `Ok(false)`. `Err` means the stored value is not a
/// bcrypt hash at all; login reports that as an internal error, not as bad
/// credentials.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(plaintext, stored_hash).map_err(|e| {
        AuthError::Internal(format!("stored password hash is unreadable: {e}"))
    })
}
