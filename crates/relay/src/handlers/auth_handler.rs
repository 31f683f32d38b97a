//! Auth-Handler – LOGIN- und REGISTER-Kommandos
//!
//! Delegiert an den AuthService und meldet das Ergebnis als
//! `"System"`-Bestaetigung zurueck. Bei Erfolg wird die Session in die
//! Registry aufgenommen und die Join-Benachrichtigung an alle Sessions
//! verteilt, die neue eingeschlossen.

use klatsch_auth::AuthError;
use klatsch_db::{BenutzerRepository, ChatLogRepository};
use klatsch_protocol::ChatMessage;
use std::sync::Arc;

use crate::connection::{SessionContext, VerbindungsZustand};
use crate::error::RelayResult;
use crate::registry::SessionHandle;
use crate::server_state::RelayState;

/// Verarbeitet ein LOGIN-Kommando
///
/// Fehlgeschlagene Logins lassen den Zustand unveraendert; die
/// Verbindung bleibt offen.
pub async fn handle_login<U>(
    username: String,
    password: String,
    ctx: &mut SessionContext,
    state: &Arc<RelayState<U>>,
) -> RelayResult<()>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    if ctx.zustand != VerbindungsZustand::Unauthentifiziert {
        tracing::warn!(peer = %ctx.peer_addr, "LOGIN auf bereits authentifizierter Session");
        return ctx.bestaetigung_senden("Login failed").await;
    }

    match state.auth_service.anmelden(&username, &password).await {
        Ok(benutzer) => sitzung_aufnehmen(ctx, state, benutzer.username, "Login successful").await,
        Err(AuthError::UngueltigeAnmeldedaten) => {
            tracing::warn!(peer = %ctx.peer_addr, username = %username, "Login abgelehnt");
            ctx.bestaetigung_senden("Login failed").await
        }
        Err(fehler) => {
            // Kollaborateur-Fehler werden als fehlgeschlagener Login gemeldet
            tracing::error!(peer = %ctx.peer_addr, fehler = %fehler, "Login-Fehler");
            ctx.bestaetigung_senden("Login failed").await
        }
    }
}

/// Verarbeitet ein REGISTER-Kommando
///
/// Gleicher Vertrag wie LOGIN, mit Account-Erstellung: schlaegt fehl
/// wenn der Benutzername bereits vergeben ist.
pub async fn handle_register<U>(
    username: String,
    password: String,
    ctx: &mut SessionContext,
    state: &Arc<RelayState<U>>,
) -> RelayResult<()>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    if ctx.zustand != VerbindungsZustand::Unauthentifiziert {
        tracing::warn!(peer = %ctx.peer_addr, "REGISTER auf bereits authentifizierter Session");
        return ctx.bestaetigung_senden("Registration failed").await;
    }

    match state.auth_service.registrieren(&username, &password).await {
        Ok(benutzer) => {
            sitzung_aufnehmen(ctx, state, benutzer.username, "Registration successful").await
        }
        Err(AuthError::BenutzernameVergeben(_)) => {
            tracing::warn!(peer = %ctx.peer_addr, username = %username, "Benutzername vergeben");
            ctx.bestaetigung_senden("Registration failed").await
        }
        Err(fehler) => {
            tracing::error!(peer = %ctx.peer_addr, fehler = %fehler, "Registrierungs-Fehler");
            ctx.bestaetigung_senden("Registration failed").await
        }
    }
}

/// Nimmt eine frisch authentifizierte Session in die Registry auf
///
/// Reihenfolge: registrieren, Bestaetigung einreihen, Join-Rundruf.
/// Die eigene Queue liefert damit zuerst die Bestaetigung, dann die
/// Join-Benachrichtigung.
async fn sitzung_aufnehmen<U>(
    ctx: &mut SessionContext,
    state: &Arc<RelayState<U>>,
    username: String,
    bestaetigung: &str,
) -> RelayResult<()>
where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    ctx.username = Some(username.clone());
    ctx.zustand = VerbindungsZustand::Authentifiziert;

    state.registry.registrieren(SessionHandle {
        session_id: ctx.session_id,
        username: username.clone(),
        tx: ctx.sende_tx.clone(),
    });

    ctx.bestaetigung_senden(bestaetigung).await?;

    let beitritt = ChatMessage::server(format!("{username} has joined the chat!"));
    state.rundruf(&username, beitritt).await;

    tracing::info!(peer = %ctx.peer_addr, username = %username, "Session authentifiziert");
    Ok(())
}
