use crate::errors::AppErrors;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;

fn generate_salt() -> Result<SaltString, AppErrors> {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    SaltString::encode_b64(&bytes).map_err(|e| AppErrors::PasswordHash(e.to_string()))
}

/// Argon2id hash in PHC string format, salt included.
pub fn hash_password(password: &str) -> Result<String, AppErrors> {
    let salt = generate_salt()?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppErrors::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppErrors> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AppErrors::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
