//! klatsch-discovery – UDP-Discovery-Responder
//!
//! Beantwortet "ist hier ein Server?"-Anfragen im lokalen Netz:
//! ein festes Anfrage-Datagramm rein, ein festes Antwort-Datagramm an
//! die Absender-Adresse zurueck. Zustandslos, kein Kontakt zur
//! Session-Registry.

pub mod responder;

// Bequeme Re-Exporte
pub use responder::{DiscoveryResponder, DISCOVERY_ANFRAGE, DISCOVERY_ANTWORT, DISCOVERY_PORT};
