//! Chat-Handler – Weiterleitung normaler Chat-Nachrichten
//!
//! Weitergeleitet wird nur was von einer authentifizierten Session
//! kommt, deren eigenen Benutzernamen als Absender traegt und nicht nur
//! aus Leerraum besteht. Alles andere wird kommentarlos verworfen –
//! ein No-op, keine Ablehnung.

use klatsch_db::{BenutzerRepository, ChatLogRepository};
use klatsch_protocol::ChatMessage;
use std::sync::Arc;

use crate::connection::SessionContext;
use crate::server_state::RelayState;

/// Validiert eine Chat-Nachricht und leitet sie an den Rundruf weiter
pub async fn handle_chat<U>(
    nachricht: ChatMessage,
    ctx: &SessionContext,
    state: &Arc<RelayState<U>>,
) where
    U: BenutzerRepository + ChatLogRepository + 'static,
{
    let Some(username) = &ctx.username else {
        tracing::debug!(peer = %ctx.peer_addr, "Chat-Nachricht vor Login verworfen");
        return;
    };

    if nachricht.sender != *username {
        tracing::debug!(
            peer = %ctx.peer_addr,
            angegeben = %nachricht.sender,
            session = %username,
            "Absender-Feld passt nicht zur Session – verworfen"
        );
        return;
    }

    if nachricht.content.trim().is_empty() {
        return;
    }

    state.rundruf(username, nachricht).await;
}
