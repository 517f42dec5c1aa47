//! Argon2 password hashing for actor credentials.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use rand_core::OsRng;

/// PHC string for `password`, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default()
    .hash_password(password.as_bytes(), &salt)?
    .to_string())
}

/// Whether `password` matches the stored PHC string. A malformed hash never
/// matches.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let phc = hash_password("s3cret").unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(verify_password("s3cret", &phc));
    assert!(!verify_password("S3cret", &phc));
  }

  #[test]
  fn garbage_hash_never_matches() {
    assert!(!verify_password("anything", "not-a-phc-string"));
  }
}
