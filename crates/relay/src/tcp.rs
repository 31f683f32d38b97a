//! TCP-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `RelayServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! `ClientConnection`.
//!
//! ## Concurrency-Modell
//! Die Repository-Traits verwenden async fn ohne Send-Garantie
//! (async_fn_in_trait); alle Verbindungs-Tasks laufen deshalb in einer
//! `tokio::task::LocalSet` auf einem single-threaded Executor. Dies ist
//! korrekt fuer einen einzelnen Server-Prozess.

use klatsch_db::{BenutzerRepository, ChatLogRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::LocalSet;

use crate::connection::ClientConnection;
use crate::server_state::RelayState;

/// TCP-Server des Chat-Relays
///
/// Der Socket wird beim Erstellen gebunden; ein Bind-Fehler ist damit
/// beim Start fatal und nicht erst in der Accept-Loop.
pub struct RelayServer<U>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    state: Arc<RelayState<U>>,
    listener: TcpListener,
}

impl<U> RelayServer<U>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    /// Bindet den TCP-Socket
    pub async fn binden(state: Arc<RelayState<U>>, bind_addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        tracing::info!(adresse = %listener.local_addr()?, "Chat-Relay gebunden");
        Ok(Self { state, listener })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    ///
    /// Nuetzlich wenn mit Port 0 gebunden wurde (Tests).
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal liefert
    ///
    /// Verwendet eine `LocalSet` fuer alle Verbindungs-Tasks.
    pub async fn starten(
        self,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let local = LocalSet::new();
        local.run_until(self.accept_loop(shutdown_rx)).await
    }

    /// Interne Accept-Loop (laeuft innerhalb der LocalSet)
    async fn accept_loop(
        self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        tracing::info!("Chat-Relay gestartet");

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = ClientConnection::neu(
                                Arc::clone(&self.state),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();

                            // Lokaler Task – kein Send erforderlich
                            tokio::task::spawn_local(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Chat-Relay: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("Chat-Relay gestoppt");
        Ok(())
    }
}
