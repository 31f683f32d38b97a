//! Repository-Trait-Definitionen
//!
//! Das Repository-Pattern entkoppelt den Chat-Kern von der konkreten
//! Datenbank-Implementierung. Die Traits verwenden `async fn` ohne
//! Send-Garantie (async_fn_in_trait); Verbindungs-Tasks laufen deshalb
//! in einer `tokio::task::LocalSet`.

use uuid::Uuid;

use crate::error::DbError;
use crate::models::{BenutzerRecord, ChatLogEintrag, NeuerBenutzer};

/// Result-Typ fuer alle Repository-Operationen
pub type DbResult<T> = Result<T, DbError>;

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Verbindungs-URL (z.B. "sqlite://klatsch.db")
    pub url: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
    /// Ob WAL-Modus bei SQLite aktiviert werden soll
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://klatsch.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

/// Repository fuer den Credential-Store
///
/// Die Passwort-Verifikation selbst findet im Auth-Service statt; das
/// Repository liefert nur den gespeicherten Hash.
#[allow(async_fn_in_trait)]
pub trait BenutzerRepository {
    /// Legt einen neuen Benutzer an
    ///
    /// Schlaegt mit `DbError::Eindeutigkeit` fehl wenn der Benutzername
    /// bereits vergeben ist; der Bestand bleibt dann unveraendert.
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Laedt einen Benutzer anhand seines Namens
    async fn get_by_name(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Prueft ob ein Benutzername bereits vergeben ist
    async fn exists(&self, username: &str) -> DbResult<bool>;

    /// Aktualisiert den Zeitpunkt des letzten Logins
    async fn update_last_login(&self, id: Uuid) -> DbResult<()>;
}

/// Repository fuer das append-only Chat-Log
#[allow(async_fn_in_trait)]
pub trait ChatLogRepository {
    /// Haengt einen Eintrag an; der Zeitstempel wird hier vergeben
    async fn append(&self, sender: &str, content: &str) -> DbResult<ChatLogEintrag>;

    /// Gibt die Gesamtzahl der Eintraege zurueck
    async fn count(&self) -> DbResult<i64>;

    /// Gibt die juengsten Eintraege zurueck, chronologisch sortiert
    async fn list_recent(&self, limit: i64) -> DbResult<Vec<ChatLogEintrag>>;
}
