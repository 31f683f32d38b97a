//! Fehlertypen fuer den Relay-Kern
//!
//! Fehler hier sind session-lokal: sie beenden genau die betroffene
//! Verbindung, nie den Server. Fatale Startfehler (Bind) laufen als
//! `io::Error` aus `RelayServer::binden` heraus.

use thiserror::Error;

/// Fehlertyp fuer die Verarbeitung einer einzelnen Verbindung
#[derive(Debug, Error)]
pub enum RelayError {
    /// IO-Fehler auf der Verbindung (Lesen/Schreiben/Dekodieren)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Die eigene Send-Queue der Session ist geschlossen
    #[error("Senden an Session fehlgeschlagen")]
    SendFehler,
}

/// Result-Typ fuer den Relay-Kern
pub type RelayResult<T> = Result<T, RelayError>;
