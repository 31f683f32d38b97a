//! Chat-Nachrichten und Befehls-Grammatik
//!
//! Eine `ChatMessage` ist der einzige Werttyp auf der Leitung: zwei
//! Textfelder, ohne ID und ohne Zeitstempel (ein Zeitstempel wird erst
//! beim Protokollieren vergeben). Kommandos werden als Nachrichten mit
//! dem reservierten Absender `"System"` kodiert, der Befehl steht als
//! Praefix im `content`-Feld.

use serde::{Deserialize, Serialize};

/// Reservierter Absender fuer Client->Server Kommandos
pub const ABSENDER_SYSTEM: &str = "System";

/// Reservierter Absender fuer Server-Benachrichtigungen (Join/Leave)
pub const ABSENDER_SERVER: &str = "Server";

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// Eine Chat-Nachricht auf der Leitung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Absender-Identitaet (Benutzername oder reservierter Sentinel)
    pub sender: String,
    /// Textinhalt; bei Kommandos der Befehl samt Argumenten
    pub content: String,
}

impl ChatMessage {
    /// Erstellt eine Nachricht mit beliebigem Absender
    pub fn neu(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }

    /// Erstellt eine `"System"`-Nachricht (Kommandos, Bestaetigungen)
    pub fn system(content: impl Into<String>) -> Self {
        Self::neu(ABSENDER_SYSTEM, content)
    }

    /// Erstellt eine `"Server"`-Benachrichtigung (Join/Leave)
    pub fn server(content: impl Into<String>) -> Self {
        Self::neu(ABSENDER_SERVER, content)
    }

    /// Prueft ob diese Nachricht ein Client-Kommando ist
    ///
    /// Der Absender-Vergleich ist case-insensitiv.
    pub fn ist_kommando(&self) -> bool {
        self.sender.eq_ignore_ascii_case(ABSENDER_SYSTEM)
    }
}

// ---------------------------------------------------------------------------
// Befehl
// ---------------------------------------------------------------------------

/// Kommandos die ein Client ueber den `"System"`-Absender schickt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Befehl {
    /// `LOGIN <username> <password>` – bestehenden Account anmelden
    Login { username: String, password: String },
    /// `REGISTER <username> <password>` – neuen Account anlegen und anmelden
    Register { username: String, password: String },
    /// `DISCONNECT` – Verbindung sauber trennen
    Disconnect,
}

impl Befehl {
    /// Parst den Inhalt einer `"System"`-Nachricht
    ///
    /// Das Schluesselwort ist case-insensitiv. Das Passwort ist der gesamte
    /// Rest der Zeile und darf daher Leerzeichen enthalten. Fehlende oder
    /// leere Argumente ergeben `None`: unvollstaendige Kommandos sind ein
    /// No-op, kein Protokollfehler.
    pub fn parsen(inhalt: &str) -> Option<Befehl> {
        let mut teile = inhalt.splitn(3, ' ');
        let schluesselwort = teile.next()?.to_ascii_uppercase();

        match schluesselwort.as_str() {
            "LOGIN" => {
                let (username, password) = Self::anmeldedaten(&mut teile)?;
                Some(Befehl::Login { username, password })
            }
            "REGISTER" => {
                let (username, password) = Self::anmeldedaten(&mut teile)?;
                Some(Befehl::Register { username, password })
            }
            "DISCONNECT" => Some(Befehl::Disconnect),
            _ => None,
        }
    }

    /// Extrahiert Benutzername und Passwort; beide muessen nicht-leer sein
    fn anmeldedaten(teile: &mut std::str::SplitN<'_, char>) -> Option<(String, String)> {
        let username = teile.next()?;
        let password = teile.next()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some((username.to_string(), password.to_string()))
    }
}
