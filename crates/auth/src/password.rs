//! Passwort-Hashing mit Argon2id
//!
//! Argon2id mit den OWASP-empfohlenen Parametern. Der gespeicherte Wert
//! ist ein PHC-String und enthaelt Algorithmus, Parameter und Salt.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

use crate::error::AuthError;

/// Argon2id-Instanz mit festen Parametern
///
/// - Speicher: 64 MiB
/// - Iterationen: 3
/// - Parallelismus: 1
fn argon2_instanz() -> Argon2<'static> {
    let params = Params::new(64 * 1024, 3, 1, None).expect("Argon2-Parameter ungueltig");
    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
}

/// Hasht ein Passwort mit einem zufaelligen Salt
pub fn passwort_hashen(passwort: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2_instanz()
        .hash_password(passwort.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
pub fn passwort_verifizieren(passwort: &str, hash: &str) -> Result<bool, AuthError> {
    let geparster_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::PasswortHashing(format!("Ungueltiges Hash-Format: {e}")))?;

    match argon2_instanz().verify_password(passwort.as_bytes(), &geparster_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswortHashing(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn korrektes_passwort_verifiziert() {
        let hash = passwort_hashen("geheim123!").expect("Hashing fehlgeschlagen");
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwort_verifizieren("geheim123!", &hash).unwrap());
    }

    #[test]
    fn falsches_passwort_abgelehnt() {
        let hash = passwort_hashen("richtig").unwrap();
        assert!(!passwort_verifizieren("falsch", &hash).unwrap());
    }

    #[test]
    fn salt_macht_hashes_verschieden() {
        let hash1 = passwort_hashen("gleich").unwrap();
        let hash2 = passwort_hashen("gleich").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn kaputtes_hash_format_ist_fehler() {
        assert!(passwort_verifizieren("egal", "kein-phc-string").is_err());
    }
}
