//! Storage adapters. SQLite is the only backend; the original deployment of
//! this system runs embedded alongside a single-operator batch tool.

pub mod sqlite;

pub use sqlite::{GameLogRow, SqliteStore};
