//! Datenbankmodelle fuer Klatsch
//!
//! Reine Datenuebertragungsobjekte zwischen Repository und Aufrufern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
}

// ---------------------------------------------------------------------------
// Chat-Log
// ---------------------------------------------------------------------------

/// Ein Eintrag im append-only Chat-Log
///
/// Der Zeitstempel wird erst beim Protokollieren vergeben; auf der
/// Leitung traegt eine Nachricht keinen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatLogEintrag {
    pub id: Uuid,
    pub sender: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
