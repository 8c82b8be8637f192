//! Database module: the account table and its storage primitives.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database
//! - `sqlite.rs`: pool setup and queries

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbUser, NewUser};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, UsersStorage};
