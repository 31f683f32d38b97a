//! klatsch-server – Bibliotheks-Root
//!
//! Verdrahtet Datenbank, Auth-Gateway, Relay-Kern und Discovery-
//! Responder zu einem lauffaehigen Server.

pub mod config;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

use klatsch_auth::AuthService;
use klatsch_db::{DatabaseConfig, SqliteDb};
use klatsch_discovery::DiscoveryResponder;
use klatsch_relay::{RelayConfig, RelayServer, RelayState};

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbankverbindung herstellen (fatal bei Fehler)
    /// 2. UDP-Discovery-Socket binden (fatal bei Fehler)
    /// 3. TCP-Listener binden (fatal bei Fehler)
    /// 4. Auf Ctrl-C warten, dann beide Loops ueber den Watch-Kanal stoppen
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            discovery = %self.config.discovery_bind_adresse(),
            "Server startet"
        );

        // Datenbank
        let db_config = DatabaseConfig {
            url: self.config.datenbank.url.clone(),
            max_verbindungen: self.config.datenbank.max_verbindungen,
            sqlite_wal: self.config.datenbank.wal,
        };
        let db = Arc::new(SqliteDb::oeffnen(&db_config).await?);

        // Relay-Kern
        let auth_service = Arc::new(AuthService::neu(Arc::clone(&db)));
        let relay_config = RelayConfig {
            sende_queue_groesse: self.config.relay.sende_queue_groesse,
            max_frame_groesse: self.config.relay.max_frame_groesse,
        };
        let state = RelayState::neu(relay_config, auth_service, Arc::clone(&db));

        // Sockets binden – Fehler hier sind fatal fuer den Start
        let discovery = DiscoveryResponder::binden(self.config.discovery_bind_adresse().parse()?).await?;
        let relay = RelayServer::binden(Arc::clone(&state), self.config.tcp_bind_adresse().parse()?).await?;

        // Shutdown-Verteilung an Accept-Loop, Discovery-Loop und Sessions
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen");
            }
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = shutdown_tx.send(true);
        });

        tokio::spawn(discovery.lauschen(shutdown_rx.clone()));

        relay.starten(shutdown_rx).await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
