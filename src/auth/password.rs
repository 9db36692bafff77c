use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::internal(format!("Password hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AppError::internal(format!("Invalid password hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};
    use crate::error::ErrorKind;

    #[test]
    fn hashes_verify_and_never_echo_the_password() {
        let hash = hash_password("correct horse").expect("hash should succeed");
        assert!(!hash.contains("correct horse"));
        assert!(verify_password("correct horse", &hash).expect("verify should run"));
        assert!(!verify_password("wrong horse", &hash).expect("verify should run"));
    }

    #[test]
    fn short_passwords_are_rejected() {
        let err = hash_password("short").expect_err("short password should fail");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
