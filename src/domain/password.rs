//! Password value object - Domain layer password handling.
//!
//! Local accounts store Argon2 PHC strings. Directory entries receive the
//! same hash behind a `{ARGON2}` scheme prefix so the directory server can
//! verify binds against it.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};

use crate::config::{DIRECTORY_HASH_SCHEME, MIN_PASSWORD_LENGTH, TEMPORARY_PASSWORD_LENGTH};
use crate::errors::{AppError, AppResult};

/// Password value object that handles hashing and verification.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Create a new password by hashing the plain text.
    ///
    /// # Errors
    /// Returns validation error if password is shorter than 8 characters.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        if plain_text.len() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let hash = Self::hash(plain_text)?;
        Ok(Self { hash })
    }

    /// Create a Password from an existing hash (from database).
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Hash in the form expected by the directory `userPassword` attribute.
    pub fn to_directory_hash(&self) -> String {
        format!("{}{}", DIRECTORY_HASH_SCHEME, self.hash)
    }

    /// Directory hash of a plain text password.
    ///
    /// The directory keeps its own password policy, so no length rule applies.
    pub fn hash_for_directory(plain_text: &str) -> AppResult<String> {
        Ok(Self::from_hash(Self::hash(plain_text)?).to_directory_hash())
    }

    /// Verify a plain text password against this hash.
    pub fn verify(&self, plain_text: &str) -> bool {
        Self::verify_hash(plain_text, &self.hash).unwrap_or(false)
    }

    /// Random alphanumeric password handed out with new directory accounts.
    pub fn generate_temporary() -> String {
        (0..TEMPORARY_PASSWORD_LENGTH)
            .map(|_| rand::rngs::OsRng.sample(Alphanumeric) as char)
            .collect()
    }

    fn hash(plain_text: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_hash(plain_text: &str, hash: &str) -> AppResult<bool> {
        let hash = hash.strip_prefix(DIRECTORY_HASH_SCHEME).unwrap_or(hash);
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Password {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let plain = "SecurePassword123!";
        let password = Password::new(plain).unwrap();

        assert!(password.verify(plain));
        assert!(!password.verify("WrongPassword123"));
    }

    #[test]
    fn test_password_from_hash() {
        let plain = "TestPassword123";
        let password = Password::new(plain).unwrap();
        let hash = password.as_str().to_string();

        let restored = Password::from_hash(hash);
        assert!(restored.verify(plain));
    }

    #[test]
    fn test_same_password_different_salts() {
        let plain = "SamePassword123";
        let pass1 = Password::new(plain).unwrap();
        let pass2 = Password::new(plain).unwrap();

        assert_ne!(pass1.as_str(), pass2.as_str());
        assert!(pass1.verify(plain));
        assert!(pass2.verify(plain));
    }

    #[test]
    fn test_password_too_short() {
        assert!(Password::new("short").is_err());
        assert!(Password::new("12345678").is_ok());
    }

    #[test]
    fn test_directory_hash_keeps_scheme_and_verifies() {
        let password = Password::new("DirectoryPass1").unwrap();
        let directory_hash = password.to_directory_hash();

        assert!(directory_hash.starts_with("{ARGON2}$argon2"));
        assert!(Password::from_hash(directory_hash).verify("DirectoryPass1"));
    }

    #[test]
    fn test_directory_hash_has_no_length_rule() {
        let hash = Password::hash_for_directory("abc").unwrap();

        assert!(hash.starts_with("{ARGON2}$argon2"));
        assert!(Password::from_hash(hash).verify("abc"));
        assert!(Password::hash_for_directory("").is_ok());
    }

    #[test]
    fn test_temporary_passwords_are_random_and_usable() {
        let first = Password::generate_temporary();
        let second = Password::generate_temporary();

        assert_eq!(first.len(), TEMPORARY_PASSWORD_LENGTH);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
        assert!(Password::new(&first).is_ok());
    }
}
