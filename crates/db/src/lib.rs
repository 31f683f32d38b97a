//! klatsch-db – Datenbank-Abstraktion
//!
//! Dieses Crate stellt die beiden externen Kollaborateure des Chat-Kerns
//! hinter Repository-Traits bereit:
//!
//! - `BenutzerRepository` – der Credential-Store (Anlegen und Nachschlagen
//!   von Benutzername/Passwort-Hash-Paaren)
//! - `ChatLogRepository` – das append-only Nachrichten-Log
//!
//! Die konkrete Implementierung laeuft auf SQLite via sqlx; fuer Tests
//! gibt es eine In-Memory-Variante.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

// Bequeme Re-Exporte
pub use error::DbError;
pub use models::{BenutzerRecord, ChatLogEintrag, NeuerBenutzer};
pub use repository::{BenutzerRepository, ChatLogRepository, DatabaseConfig, DbResult};
pub use sqlite::SqliteDb;
