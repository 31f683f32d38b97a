//! Session-Registry – der Synchronisationspunkt des Chat-Kerns
//!
//! Die Registry haelt die Mitgliedschaft aller authentifizierten
//! Sessions, indiziert nach `SessionId` (nicht nach Benutzername:
//! gleichzeitige Logins mit demselben Namen laufen unbeanstandet durch).
//! Sie besitzt die Sessions nicht – pro Session haelt sie nur den
//! Sende-Endpunkt einer bounded Queue fuer das Routing.
//!
//! ## Nebenlaeufigkeit
//! Mitgliedschafts-Mutation und Schnappschuss laufen ueber die
//! kurzlebigen Shard-Locks der DashMap. Das Einreihen von Nachrichten
//! passiert auf einem Schnappschuss ausserhalb der Locks, die
//! eigentlichen Socket-Schreibvorgaenge im Task der Empfaenger-Session.
//! Eine langsame Session blockiert damit weder einen Rundruf noch
//! gleichzeitige Joins/Leaves.

use dashmap::DashMap;
use klatsch_core::SessionId;
use klatsch_protocol::ChatMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Standard-Groesse der Send-Queue pro Session
pub const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer registrierten Session
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub username: String,
    pub tx: mpsc::Sender<ChatMessage>,
}

impl SessionHandle {
    /// Reiht eine Nachricht nicht-blockierend in die Send-Queue ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    /// Ein Fehlschlag betrifft nur diesen Empfaenger und wird nie zum
    /// Absender durchgereicht.
    pub fn senden(&self, nachricht: ChatMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    username = %self.username,
                    "Send-Queue voll – Nachricht verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    "Send-Queue geschlossen (Session getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Registry aller authentifizierten Sessions
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct SessionRegistry {
    mitglieder: Arc<DashMap<SessionId, SessionHandle>>,
}

impl SessionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self {
            mitglieder: Arc::new(DashMap::new()),
        }
    }

    /// Nimmt eine Session in die Mitgliedschaft auf
    ///
    /// Duplikat-tolerant: eine bereits registrierte SessionId wird
    /// ueberschrieben.
    pub fn registrieren(&self, handle: SessionHandle) {
        tracing::debug!(
            session_id = %handle.session_id,
            username = %handle.username,
            "Session registriert"
        );
        self.mitglieder.insert(handle.session_id, handle);
    }

    /// Entfernt eine Session; No-op wenn nicht vorhanden
    pub fn entfernen(&self, session_id: &SessionId) -> bool {
        let entfernt = self.mitglieder.remove(session_id).is_some();
        if entfernt {
            tracing::debug!(session_id = %session_id, "Session entfernt");
        }
        entfernt
    }

    /// Reiht eine Nachricht bei allen registrierten Sessions ein
    ///
    /// Gibt die Anzahl der erfolgreichen Einreihungen zurueck.
    pub fn an_alle_senden(&self, nachricht: ChatMessage) -> usize {
        let mut gesendet = 0;
        for handle in self.schnappschuss() {
            if handle.senden(nachricht.clone()) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Kurzlebiger Schnappschuss der Mitgliedschaft
    ///
    /// Haelt die Shard-Locks nur fuer das Einsammeln, nicht waehrend
    /// des Einreihens.
    fn schnappschuss(&self) -> Vec<SessionHandle> {
        self.mitglieder
            .iter()
            .map(|eintrag| eintrag.value().clone())
            .collect()
    }

    /// Gibt die Anzahl der registrierten Sessions zurueck
    pub fn anzahl(&self) -> usize {
        self.mitglieder.len()
    }

    /// Prueft ob eine Session registriert ist
    pub fn ist_registriert(&self, session_id: &SessionId) -> bool {
        self.mitglieder.contains_key(session_id)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
