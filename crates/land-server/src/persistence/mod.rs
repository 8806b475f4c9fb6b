//! Persistence layer for the land detector service.
//!
//! Provides SQLite-backed storage for parameters. The live values stay in
//! the in-memory registry; the database is written behind it.

pub mod db;
pub mod params;

pub use db::{init_database, Database};
