//! Wire-Format fuer TCP-Verbindungen
//!
//! Frame-basiertes Protokoll: Length(u32 big-endian) + JSON-Payload.
//! Das Laengen-Feld zaehlt nur die Payload-Bytes. Die Frame-Grenzen sind
//! damit eindeutig, unabhaengig vom Inhalt der Nachricht.
//!
//! Der `FrameCodec` integriert sich in `tokio_util::codec::Framed`;
//! fuer einfache Streams (Tests, Clients) gibt es daneben die direkten
//! Helfer `read_frame` und `write_frame`.

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::nachricht::ChatMessage;

/// Standard-maximale Frame-Groesse (64 KiB – Chat-Nachrichten sind klein)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Groesse des Laengen-Felds in Bytes
const LAENGEN_FELD: usize = 4;

// ---------------------------------------------------------------------------
// FrameCodec
// ---------------------------------------------------------------------------

/// Codec fuer laengen-praefixierte `ChatMessage`-Frames
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_groesse: usize,
}

impl FrameCodec {
    /// Erstellt einen Codec mit der Standard-Frame-Groesse
    pub fn new() -> Self {
        Self {
            max_frame_groesse: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Erstellt einen Codec mit benutzerdefiniertem Frame-Limit
    pub fn mit_max_groesse(max_frame_groesse: usize) -> Self {
        Self { max_frame_groesse }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = ChatMessage;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LAENGEN_FELD {
            return Ok(None);
        }

        let laenge = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if laenge > self.max_frame_groesse {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame ueberschreitet Limit: {} > {} Bytes",
                    laenge, self.max_frame_groesse
                ),
            ));
        }

        if src.len() < LAENGEN_FELD + laenge {
            // Auf den Rest des Frames warten
            src.reserve(LAENGEN_FELD + laenge - src.len());
            return Ok(None);
        }

        src.advance(LAENGEN_FELD);
        let payload = src.split_to(laenge);

        serde_json::from_slice(&payload)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Ungueltiges JSON: {e}")))
    }
}

impl Encoder<ChatMessage> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: ChatMessage, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

        if json.len() > self.max_frame_groesse {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Nachricht ueberschreitet Limit: {} > {} Bytes",
                    json.len(),
                    self.max_frame_groesse
                ),
            ));
        }

        dst.reserve(LAENGEN_FELD + json.len());
        dst.put_u32(json.len() as u32);
        dst.put_slice(&json);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Direkte async Helfer
// ---------------------------------------------------------------------------

/// Liest einen einzelnen Frame aus einem `AsyncRead`
///
/// # Fehler
/// - `UnexpectedEof` wenn die Verbindung mitten im Frame abbricht
/// - `InvalidData` bei zu grossem Frame oder ungueltigem JSON
pub async fn read_frame<R>(reader: &mut R, max_frame_groesse: usize) -> io::Result<ChatMessage>
where
    R: AsyncRead + Unpin,
{
    let mut laengen_puffer = [0u8; LAENGEN_FELD];
    reader.read_exact(&mut laengen_puffer).await?;
    let laenge = u32::from_be_bytes(laengen_puffer) as usize;

    if laenge > max_frame_groesse {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Frame ueberschreitet Limit: {laenge} > {max_frame_groesse} Bytes"),
        ));
    }

    let mut payload = vec![0u8; laenge];
    reader.read_exact(&mut payload).await?;

    serde_json::from_slice(&payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Ungueltiges JSON: {e}")))
}

/// Schreibt einen einzelnen Frame in einen `AsyncWrite`
pub async fn write_frame<W>(writer: &mut W, nachricht: &ChatMessage) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_vec(nachricht)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;

    writer.write_all(&(json.len() as u32).to_be_bytes()).await?;
    writer.write_all(&json).await?;
    writer.flush().await
}
