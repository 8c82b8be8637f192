//! SQL DDL for the account store. SQLite-first.

/// `users` table:
/// - `username` UNIQUE; seeding relies on it to never duplicate rows
/// - `password_hash` holds an Argon2 PHC string
/// - `created_at` RFC3339, UTC
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(150) NOT NULL UNIQUE,
    password_hash VARCHAR(256) NOT NULL,
    created_at TEXT NOT NULL
);
"#;
