//! Client-Connection – Verwaltet eine einzelne TCP-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientConnection` in einem eigenen
//! tokio-Task. Die Zustandsmaschine:
//!
//! ```text
//! Unauthentifiziert --LOGIN/REGISTER ok--> Authentifiziert
//!        |                                      |
//!        +-----------(DISCONNECT, IO-Fehler)----+--> Geschlossen
//! ```
//!
//! `username` und `zustand` werden genau einmal gesetzt, durch den
//! erfolgreichen Login/Register dieser Session selbst. Es gibt keinen
//! Idle-Timeout: eine Session blockiert beliebig lange auf dem
//! naechsten Frame, bis der Peer sendet, trennt oder die Verbindung
//! fehlschlaegt.

use futures_util::{SinkExt, StreamExt};
use klatsch_core::SessionId;
use klatsch_db::{BenutzerRepository, ChatLogRepository};
use klatsch_protocol::{wire::FrameCodec, Befehl, ChatMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

use crate::error::{RelayError, RelayResult};
use crate::handlers::{auth_handler, chat_handler};
use crate::server_state::RelayState;

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Zustand einer Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Verbunden, noch nicht authentifiziert
    Unauthentifiziert,
    /// Authentifiziert und in der Registry
    Authentifiziert,
    /// Verbindung getrennt, Ressourcen freigegeben
    Geschlossen,
}

/// Ergebnis der Verarbeitung eines eingehenden Frames
#[derive(Debug, PartialEq, Eq)]
enum Ablauf {
    Weiter,
    Trennen,
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// Verbindungsgebundener Zustand einer Session
pub struct SessionContext {
    pub session_id: SessionId,
    pub peer_addr: SocketAddr,
    /// Gesetzt genau einmal, beim erfolgreichen Login/Register
    pub username: Option<String>,
    pub zustand: VerbindungsZustand,
    /// Sende-Endpunkt der eigenen Queue; wird bei der Registrierung
    /// mit der Registry geteilt
    pub sende_tx: mpsc::Sender<ChatMessage>,
}

impl SessionContext {
    /// Reiht eine Bestaetigung in die eigene Send-Queue ein
    ///
    /// Bestaetigungen laufen ueber dieselbe Queue wie Rundrufe; damit
    /// erreicht die Login-Bestaetigung den Client vor der eigenen
    /// Join-Benachrichtigung.
    pub(crate) async fn bestaetigung_senden(&self, text: &str) -> RelayResult<()> {
        self.sende_tx
            .send(ChatMessage::system(text))
            .await
            .map_err(|_| RelayError::SendFehler)
    }
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Frames via `FrameCodec`, fuehrt die Zustandsmaschine und
/// schreibt ausgehende Nachrichten aus der eigenen Send-Queue zurueck.
pub struct ClientConnection<U>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    state: Arc<RelayState<U>>,
    peer_addr: SocketAddr,
}

impl<U> ClientConnection<U>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState<U>>, peer_addr: SocketAddr) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Peer trennt, ein Fehler auftritt, DISCONNECT
    /// eintrifft oder das Shutdown-Signal kommt.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let mut framed = Framed::new(
            stream,
            FrameCodec::mit_max_groesse(self.state.config.max_frame_groesse),
        );

        // Eigene Send-Queue: Bestaetigungen und Rundrufe landen hier,
        // geschrieben wird ausschliesslich in dieser Schleife
        let (sende_tx, mut sende_rx) =
            mpsc::channel::<ChatMessage>(self.state.config.sende_queue_groesse);

        let mut ctx = SessionContext {
            session_id: SessionId::new(),
            peer_addr,
            username: None,
            zustand: VerbindungsZustand::Unauthentifiziert,
            sende_tx,
        };

        loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = framed.next() => {
                    match frame {
                        Some(Ok(nachricht)) => {
                            match self.eingehend_verarbeiten(nachricht, &mut ctx).await {
                                Ok(Ablauf::Weiter) => {}
                                Ok(Ablauf::Trennen) => {
                                    tracing::info!(peer = %peer_addr, "DISCONNECT empfangen");
                                    break;
                                }
                                Err(fehler) => {
                                    tracing::warn!(
                                        peer = %peer_addr,
                                        fehler = %fehler,
                                        "Verarbeitung fehlgeschlagen"
                                    );
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            let fehler = RelayError::Io(e);
                            tracing::warn!(peer = %peer_addr, fehler = %fehler, "Frame-Lesefehler");
                            break;
                        }
                        None => {
                            tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus der eigenen Send-Queue
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = framed.send(ausgehend).await {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        self.schliessen(&mut ctx);
        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }

    /// Verarbeitet einen eingehenden Frame gemaess Zustandsmaschine
    async fn eingehend_verarbeiten(
        &self,
        nachricht: ChatMessage,
        ctx: &mut SessionContext,
    ) -> RelayResult<Ablauf> {
        if nachricht.ist_kommando() {
            match Befehl::parsen(&nachricht.content) {
                Some(Befehl::Login { username, password }) => {
                    auth_handler::handle_login(username, password, ctx, &self.state).await?;
                }
                Some(Befehl::Register { username, password }) => {
                    auth_handler::handle_register(username, password, ctx, &self.state).await?;
                }
                Some(Befehl::Disconnect) => return Ok(Ablauf::Trennen),
                None => {
                    // Unvollstaendige oder unbekannte Kommandos sind ein No-op
                    tracing::debug!(peer = %ctx.peer_addr, "Unverstaendliches Kommando ignoriert");
                }
            }
        } else {
            chat_handler::handle_chat(nachricht, ctx, &self.state).await;
        }
        Ok(Ablauf::Weiter)
    }

    /// Idempotenter Close-Pfad
    ///
    /// Entfernt die Session genau einmal aus der Registry und stellt die
    /// Abschieds-Benachrichtigung an alle verbleibenden Sessions zu.
    /// Eine nie authentifizierte Session verlaesst den Chat ohne
    /// Benachrichtigung; der Abschied wird nicht protokolliert.
    fn schliessen(&self, ctx: &mut SessionContext) {
        let war_authentifiziert = ctx.zustand == VerbindungsZustand::Authentifiziert;
        ctx.zustand = VerbindungsZustand::Geschlossen;

        if !war_authentifiziert {
            return;
        }

        self.state.registry.entfernen(&ctx.session_id);

        if let Some(username) = &ctx.username {
            let abschied = ChatMessage::server(format!("{username} has left the chat!"));
            let empfaenger = self.state.registry.an_alle_senden(abschied);
            tracing::info!(
                peer = %ctx.peer_addr,
                username = %username,
                empfaenger,
                "Session geschlossen"
            );
        }
    }
}
