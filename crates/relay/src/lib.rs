//! klatsch-relay – Session-Registry und Broadcast-Engine
//!
//! Dieser Crate implementiert den nebenlaeufigen Kern des Chat-Servers:
//! er akzeptiert TCP-Verbindungen, fuehrt jede Verbindung durch die
//! Authentifizierungs-Zustandsmaschine und stellt Chat-Nachrichten an
//! alle registrierten Sessions zu, waehrend Verbindungen jederzeit
//! kommen und gehen.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RelayServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  State Machine: Unauthentifiziert -> Authentifiziert -> Geschlossen
//!     |
//!     +-- auth_handler  (LOGIN, REGISTER: Bestaetigung + Join-Benachrichtigung)
//!     +-- chat_handler  (Absender-Pruefung, Weiterleitung an die Registry)
//!
//! SessionRegistry – geteilte Mitgliedschaft, eine Send-Queue pro Session
//! RelayState      – injizierbarer Zustand (Config, Auth, DB, Registry)
//! ```
//!
//! Die Registry ist der einzige von mehreren Tasks mutierte Zustand.
//! Rundrufe reihen Nachrichten ueber einen kurzlebigen Mitgliedschafts-
//! Schnappschuss in die Send-Queues ein; die eigentlichen Socket-
//! Schreibvorgaenge passieren im Task der jeweiligen Empfaenger-Session.

pub mod connection;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use connection::{ClientConnection, VerbindungsZustand};
pub use error::{RelayError, RelayResult};
pub use registry::{SessionHandle, SessionRegistry};
pub use server_state::{RelayConfig, RelayState};
pub use tcp::RelayServer;
