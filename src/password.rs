//! Password hashing for stored credentials.
//!
//! bcrypt keeps verification deliberately expensive, which is the only
//! brute-force bound this service applies.

/// Hash a plaintext password for storage. Salting makes repeated calls
/// produce different hashes that all verify against the same plaintext.
pub fn hash(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
}

/// Check a plaintext password against a stored hash. A malformed hash is
/// treated as a mismatch rather than an error.
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}
