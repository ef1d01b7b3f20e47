use crate::error::AppError;
use bcrypt::{hash, verify};

/// Derives a salted bcrypt hash of `password` at the given work factor.
/// The cost comes from configuration so operators can trade login latency
/// against offline brute-force resistance.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Compares a candidate password against a stored hash. bcrypt's comparison
/// does not short-circuit on the first mismatching byte.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
