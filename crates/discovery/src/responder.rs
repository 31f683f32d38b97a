//! UDP-Responder – Empfangsschleife und Antwortversand
//!
//! Der Socket wird beim Erstellen gebunden; ein Bind-Fehler ist damit
//! beim Start fatal. Die Empfangsschleife laeuft bis zum
//! Shutdown-Signal. Datagramme die nicht exakt der Anfrage entsprechen
//! werden ignoriert.

use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Erwartetes Anfrage-Datagramm
pub const DISCOVERY_ANFRAGE: &[u8] = b"DISCOVER_SERVER_REQUEST";

/// Antwort-Datagramm an den Absender
pub const DISCOVERY_ANTWORT: &[u8] = b"DISCOVER_SERVER_RESPONSE";

/// Well-known Port fuer Discovery-Anfragen
pub const DISCOVERY_PORT: u16 = 8888;

/// Groesse des Empfangspuffers
const UDP_PUFFER_GROESSE: usize = 1024;

/// Zustandsloser UDP-Discovery-Responder
pub struct DiscoveryResponder {
    socket: UdpSocket,
}

impl DiscoveryResponder {
    /// Bindet den UDP-Socket
    pub async fn binden(bind_addr: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        tracing::info!(adresse = %socket.local_addr()?, "Discovery-Responder gebunden");
        Ok(Self { socket })
    }

    /// Gibt die tatsaechlich gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Empfangsschleife: laeuft bis `shutdown_rx` ein `true`-Signal liefert
    pub async fn lauschen(self, mut shutdown_rx: tokio::sync::watch::Receiver<bool>) {
        let mut puffer = [0u8; UDP_PUFFER_GROESSE];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut puffer) => {
                    match result {
                        Ok((laenge, absender)) => {
                            self.anfrage_beantworten(&puffer[..laenge], absender).await;
                        }
                        Err(e) => {
                            tracing::warn!(fehler = %e, "UDP-Empfangsfehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Discovery-Responder: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("Discovery-Responder gestoppt");
    }

    /// Beantwortet genau das erwartete Anfrage-Datagramm
    async fn anfrage_beantworten(&self, daten: &[u8], absender: SocketAddr) {
        if daten != DISCOVERY_ANFRAGE {
            tracing::debug!(absender = %absender, laenge = daten.len(), "Unbekanntes Datagramm ignoriert");
            return;
        }

        match self.socket.send_to(DISCOVERY_ANTWORT, absender).await {
            Ok(_) => tracing::debug!(absender = %absender, "Discovery-Antwort gesendet"),
            Err(e) => tracing::warn!(absender = %absender, fehler = %e, "Discovery-Antwort fehlgeschlagen"),
        }
    }
}
