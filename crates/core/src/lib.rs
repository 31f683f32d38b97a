//! klatsch-core – Gemeinsame Typen
//!
//! Haelt die Identifikationstypen die von mehreren Klatsch-Crates
//! verwendet werden.

pub mod types;

pub use types::SessionId;
