//! klatsch-protocol – Leitungsformat des Chat-Protokolls
//!
//! Definiert den einzigen Werttyp auf der Leitung (`ChatMessage`), die
//! textbasierte Befehls-Grammatik (`Befehl`) und das Frame-Format fuer
//! TCP-Verbindungen (`FrameCodec`).
//!
//! ## Protokoll-Ueberblick
//!
//! - Jede Nachricht besteht aus zwei Textfeldern: `sender` und `content`.
//! - Kommandos (Login, Registrierung, Trennen) reisen als Nachrichten mit
//!   dem reservierten Absender `"System"`.
//! - Server-Benachrichtigungen (Join/Leave) tragen den Absender `"Server"`.
//! - Frames sind laengen-praefixiert: u32 big-endian + JSON-Payload,
//!   symmetrisch fuer Client und Server.

pub mod nachricht;
pub mod wire;

// Bequeme Re-Exporte
pub use nachricht::{Befehl, ChatMessage, ABSENDER_SERVER, ABSENDER_SYSTEM};
pub use wire::{read_frame, write_frame, FrameCodec, DEFAULT_MAX_FRAME_SIZE};
