//! klatsch-auth – Auth-Gateway
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - AuthService (Anmeldung und Registrierung gegen den Credential-Store)
//!
//! Authentifizierung ist in diesem Protokoll verbindungsgebunden: der
//! Zustand lebt in der Session, nicht in einem Token-Store.

pub mod error;
pub mod password;
pub mod service;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use service::AuthService;
