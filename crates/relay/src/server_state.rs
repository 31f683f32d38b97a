//! Gemeinsamer Zustand des Relay-Servers
//!
//! Haelt Konfiguration, Auth-Service, Datenbank-Handle und die
//! Session-Registry als explizit injizierte Komponenten: beim
//! Server-Start erzeugt, per Arc an jede Session gereicht. Kein
//! prozessweiter globaler Zustand.

use klatsch_auth::AuthService;
use klatsch_db::{BenutzerRepository, ChatLogRepository};
use klatsch_protocol::{ChatMessage, DEFAULT_MAX_FRAME_SIZE};
use std::sync::Arc;

use crate::registry::{SessionRegistry, SEND_QUEUE_GROESSE};

/// Konfiguration fuer den Relay-Kern
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Groesse der Send-Queue pro Session
    pub sende_queue_groesse: usize,
    /// Maximale Frame-Groesse auf der Leitung in Bytes
    pub max_frame_groesse: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sende_queue_groesse: SEND_QUEUE_GROESSE,
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct RelayState<U>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    /// Relay-Konfiguration
    pub config: Arc<RelayConfig>,
    /// Auth-Gateway (Login, Registrierung)
    pub auth_service: Arc<AuthService<U>>,
    /// Datenbank-Zugriff (Chat-Log)
    pub db: Arc<U>,
    /// Registry der authentifizierten Sessions
    pub registry: SessionRegistry,
}

impl<U> RelayState<U>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    /// Erstellt einen neuen RelayState
    pub fn neu(config: RelayConfig, auth_service: Arc<AuthService<U>>, db: Arc<U>) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            auth_service,
            db,
            registry: SessionRegistry::neu(),
        })
    }

    /// Rundruf an alle registrierten Sessions
    ///
    /// Haengt genau einen Eintrag an das Chat-Log an, unter dem
    /// Benutzernamen der aufrufenden Session, und stellt die Nachricht
    /// dann an die Mitgliedschaft zum Zeitpunkt des Aufrufs zu. Ein
    /// fehlgeschlagener Log-Append bricht die Zustellung nicht ab.
    pub async fn rundruf(&self, absender: &str, nachricht: ChatMessage) -> usize {
        if let Err(fehler) = self.db.append(absender, &nachricht.content).await {
            tracing::warn!(
                absender = %absender,
                fehler = %fehler,
                "Chat-Log-Append fehlgeschlagen"
            );
        }

        let empfaenger = self.registry.an_alle_senden(nachricht);

        tracing::debug!(absender = %absender, empfaenger, "Rundruf zugestellt");
        empfaenger
    }
}
