use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sha2::{Digest, Sha256};
use tokio::task;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| PasswordError(err.to_string()))
}

/// False for a wrong password as well as for an unparsable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// [`hash_password`] on the blocking pool; Argon2 is too slow for a runtime worker.
pub async fn hash(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();
    task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| PasswordError(err.to_string()))?
}

/// [`verify_password`] on the blocking pool. A failed task counts as a mismatch.
pub async fn verify(password: &str, stored_hash: &str) -> bool {
    let (password, stored_hash) = (password.to_owned(), stored_hash.to_owned());
    task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .unwrap_or(false)
}

/// Short digest of the stored hash. Embedded in reset tokens so they stop
/// verifying as soon as the password changes.
pub fn hash_fingerprint(stored_hash: &str) -> String {
    let digest = Sha256::digest(stored_hash.as_bytes());
    hex::encode(&digest[..12])
}

pub fn is_acceptable(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_verify_and_differ_per_salt() {
        let first = hash_password("Baustelle2025").expect("hash");
        let second = hash_password("Baustelle2025").expect("hash");
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password("Baustelle2025", &first));
        assert!(!verify_password("baustelle2025", &first));
        assert!(!verify_password("Baustelle2025", "not-a-hash"));
    }

    #[tokio::test]
    async fn async_wrappers_match_the_blocking_functions() {
        let hash = hash("Baustelle2025").await.expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify("Baustelle2025", &hash).await);
        assert!(verify_password("Baustelle2025", &hash));
        assert!(!verify("Baustelle2026", &hash).await);
        assert!(!verify("Baustelle2025", "not-a-hash").await);
    }

    #[test]
    fn fingerprint_tracks_the_hash() {
        let hash = hash_password("Baustelle2025").expect("hash");
        assert_eq!(hash_fingerprint(&hash), hash_fingerprint(&hash));
        assert_ne!(hash_fingerprint(&hash), hash_fingerprint("other"));
        assert_eq!(hash_fingerprint(&hash).len(), 24);
    }

    #[test]
    fn length_rule() {
        assert!(!is_acceptable("kurz"));
        assert!(is_acceptable("genügend"));
    }
}
