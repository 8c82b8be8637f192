use crate::db::models::{DbUser, NewUser};
use crate::db::schema::SQLITE_INIT;
use crate::error::GateError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct UsersStorage {
    pool: SqlitePool,
}

impl UsersStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) the database file at `path`.
    pub async fn connect(path: &Path) -> Result<Self, GateError> {
        let connect_opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_opts)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), GateError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, GateError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    /// Plain insert. Fails on a duplicate username.
    pub async fn insert(&self, user: NewUser) -> Result<i64, GateError> {
        let res = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Insert every user whose username is not taken, in one transaction.
    /// Returns, in input order, whether each row was actually inserted.
    pub async fn insert_many_if_absent(
        &self,
        users: Vec<NewUser>,
    ) -> Result<Vec<bool>, GateError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(users.len());

        for user in users.into_iter() {
            let res = sqlx::query(
                r#"
                INSERT INTO users (username, password_hash, created_at)
                VALUES (?, ?, ?)
                ON CONFLICT(username) DO NOTHING
                "#,
            )
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
            inserted.push(res.rows_affected() == 1);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<DbUser>, GateError> {
        let row = sqlx::query(
            r#"SELECT id, username, password_hash, created_at
               FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    pub async fn list(&self) -> Result<Vec<DbUser>, GateError> {
        let rows = sqlx::query(
            r#"SELECT id, username, password_hash, created_at
               FROM users ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_model).collect()
    }

    fn row_to_model(row: SqliteRow) -> Result<DbUser, GateError> {
        let id: i64 = row.try_get("id")?;
        let username: String = row.try_get("username")?;
        let password_hash: String = row.try_get("password_hash")?;
        let created_at_str: String = row.try_get("created_at")?;

        let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc);

        Ok(DbUser {
            id,
            username,
            password_hash,
            created_at,
        })
    }
}
