//! Credential generation for newly promoted applicants.

use anyhow::anyhow;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use rand::Rng;

use crate::errors::AppError;

/// Alphabet for generated one-time passwords: 26 + 26 + 10 letters/digits
/// plus 8 symbols.
pub const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

pub const PASSWORD_LENGTH: usize = 12;

/// Derives a username: the lowercase ASCII letters of first name + surname,
/// followed by a zero-padded 3-digit suffix. Uniqueness is the store's job;
/// callers retry with a fresh suffix on collision.
pub fn derive_username(first_name: &str, surname: &str) -> String {
    let base: String = first_name
        .chars()
        .chain(surname.chars())
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_lowercase)
        .collect();

    let mut rng = rand::rng();
    format!("{base}{:03}", rng.random_range(0..1000))
}

/// Generates a one-time password, each character drawn independently and
/// uniformly from [`PASSWORD_ALPHABET`].
pub fn generate_password() -> String {
    let mut rng = rand::rng();
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_ALPHABET[rng.random_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Hashes a password with Argon2id, producing a PHC-format string with a
/// fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow!("Password hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn password_has_fixed_length() {
        assert_eq!(generate_password().len(), PASSWORD_LENGTH);
    }

    #[test]
    fn password_draws_only_from_alphabet() {
        for _ in 0..50 {
            let password = generate_password();
            assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn passwords_differ_between_calls() {
        assert_ne!(generate_password(), generate_password());
    }

    #[test]
    fn username_is_lowercase_letters_plus_three_digits() {
        let username = derive_username("Jane", "Doe");
        assert!(username.starts_with("janedoe"));
        let suffix = &username["janedoe".len()..];
        assert_eq!(suffix.len(), 3);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn username_strips_non_alphabetic_characters() {
        let username = derive_username("Mary-Anne", "O'Neil 2nd");
        assert!(username.starts_with("maryanneoneilnd"));
        assert_eq!(username.len(), "maryanneoneilnd".len() + 3);
    }

    #[test]
    fn username_suffix_is_zero_padded() {
        // 1000 draws make an unpadded single-digit suffix overwhelmingly
        // likely to show up if padding were broken.
        for _ in 0..1000 {
            let username = derive_username("A", "B");
            assert_eq!(username.len(), 5);
        }
    }

    #[test]
    fn hash_verifies_against_original_password() {
        let hash = hash_password("hunter2hunter").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2hunter", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong-password", &parsed)
            .is_err());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }
}
