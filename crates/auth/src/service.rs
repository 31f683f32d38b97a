//! Auth-Service fuer Klatsch
//!
//! Zentraler Service fuer Registrierung und Anmeldung gegen den
//! Credential-Store. Beide Operationen duerfen auf Datenbank-I/O
//! blockieren; sie werden deshalb nie unter dem Registry-Lock
//! aufgerufen.

use std::sync::Arc;

use klatsch_db::{BenutzerRecord, BenutzerRepository, NeuerBenutzer};

use crate::{
    error::{AuthError, AuthResult},
    password::{passwort_hashen, passwort_verifizieren},
};

/// Auth-Service – Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U: BenutzerRepository> {
    user_repo: Arc<U>,
}

impl<U: BenutzerRepository> AuthService<U> {
    /// Erstellt einen neuen AuthService
    pub fn neu(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Schlaegt fehl wenn der Benutzername bereits vergeben ist; der
    /// Bestand bleibt dann unveraendert.
    pub async fn registrieren(&self, username: &str, passwort: &str) -> AuthResult<BenutzerRecord> {
        if self.user_repo.exists(username).await? {
            return Err(AuthError::BenutzernameVergeben(username.to_string()));
        }

        let passwort_hash = passwort_hashen(passwort)?;

        let benutzer = self
            .user_repo
            .create(NeuerBenutzer {
                username,
                password_hash: &passwort_hash,
            })
            .await
            .map_err(|e| {
                // Wettlauf zweier gleichzeitiger Registrierungen
                if e.ist_eindeutigkeit() {
                    AuthError::BenutzernameVergeben(username.to_string())
                } else {
                    AuthError::Datenbank(e)
                }
            })?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Neuer Benutzer registriert"
        );

        Ok(benutzer)
    }

    /// Meldet einen Benutzer an
    ///
    /// Gibt `UngueltigeAnmeldedaten` zurueck wenn der Benutzer nicht
    /// existiert oder das Passwort nicht zum gespeicherten Hash passt.
    pub async fn anmelden(&self, username: &str, passwort: &str) -> AuthResult<BenutzerRecord> {
        let benutzer = self
            .user_repo
            .get_by_name(username)
            .await?
            .ok_or(AuthError::UngueltigeAnmeldedaten)?;

        let korrekt = passwort_verifizieren(passwort, &benutzer.password_hash)?;
        if !korrekt {
            tracing::warn!(username = %username, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        self.user_repo.update_last_login(benutzer.id).await?;

        tracing::info!(
            user_id = %benutzer.id,
            username = %benutzer.username,
            "Benutzer angemeldet"
        );

        Ok(benutzer)
    }
}
