use app_error::{AppError, AppResult};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, error};

/// Hash a password using Argon2id. The random salt is embedded in the
/// returned PHC string, so nothing is stored beside the hash itself.
/// This is the one deliberately expensive code path; it must never be
/// skipped, batched, or cached.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    debug!("Hashing password");
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            AppError::Storage(anyhow::anyhow!("Failed to hash password: {}", e))
        })?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash. A mismatch yields `Ok(false)`,
/// never an error; comparison inside argon2 is constant-time.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        error!("Invalid password hash: {}", e);
        AppError::Storage(anyhow::anyhow!("Invalid password hash: {}", e))
    })?;

    let is_valid = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    debug!("Password verification result: {}", is_valid);
    Ok(is_valid)
}
