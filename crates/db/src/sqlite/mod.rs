//! SQLite-Implementierung der Repositories

mod benutzer;
mod chatlog;
mod pool;

pub use pool::SqliteDb;
