//! SQLite-backed user state store.
//!
//! Implements the `UserStore` capability: write-through records keyed
//! by Principal id, an explicit flush (WAL checkpoint), and a full
//! read-back used by the write-through middleware to detect corruption.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitchbot_core::{
    config::StoreConfig, error::PitchbotError, event::UserRecord, shellexpand, traits::UserStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

/// Persistent user state store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Create a new store, running migrations on first use.
    pub async fn new(config: &StoreConfig) -> Result<Self, PitchbotError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PitchbotError::Store(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| PitchbotError::Store(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| PitchbotError::Store(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("User state store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), PitchbotError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| PitchbotError::Store(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        PitchbotError::Store(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| PitchbotError::Store(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    PitchbotError::Store(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

type UserRow = (
    String,         // principal_id
    String,         // display_name
    Option<String>, // username
    Option<String>, // locale
    Option<String>, // last_command
    Option<String>, // last_command_at
    Option<String>, // last_message
    Option<String>, // last_message_at
);

fn parse_ts(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl UserStore for Store {
    async fn write(&self, principal_id: &str, record: &UserRecord) -> Result<(), PitchbotError> {
        sqlx::query(
            "INSERT INTO user_records \
             (principal_id, display_name, username, locale, \
              last_command, last_command_at, last_message, last_message_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, datetime('now')) \
             ON CONFLICT(principal_id) DO UPDATE SET \
               display_name = excluded.display_name, \
               username = excluded.username, \
               locale = excluded.locale, \
               last_command = excluded.last_command, \
               last_command_at = excluded.last_command_at, \
               last_message = excluded.last_message, \
               last_message_at = excluded.last_message_at, \
               updated_at = excluded.updated_at",
        )
        .bind(principal_id)
        .bind(&record.display_name)
        .bind(&record.username)
        .bind(&record.locale)
        .bind(&record.last_command)
        .bind(record.last_command_at.map(|t| t.to_rfc3339()))
        .bind(&record.last_message)
        .bind(record.last_message_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(|e| PitchbotError::Store(format!("user record write failed: {e}")))?;

        Ok(())
    }

    async fn flush(&self) -> Result<(), PitchbotError> {
        sqlx::raw_sql("PRAGMA wal_checkpoint(PASSIVE)")
            .execute(&self.pool)
            .await
            .map_err(|e| PitchbotError::Store(format!("flush failed: {e}")))?;
        Ok(())
    }

    async fn read_all(&self) -> Result<HashMap<String, UserRecord>, PitchbotError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT principal_id, display_name, username, locale, \
             last_command, last_command_at, last_message, last_message_at \
             FROM user_records",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PitchbotError::Store(format!("user record read failed: {e}")))?;

        let mut records = HashMap::with_capacity(rows.len());
        for (id, display_name, username, locale, cmd, cmd_at, msg, msg_at) in rows {
            records.insert(
                id,
                UserRecord {
                    display_name,
                    username,
                    locale,
                    last_command: cmd,
                    last_command_at: parse_ts(cmd_at),
                    last_message: msg,
                    last_message_at: parse_ts(msg_at),
                },
            );
        }
        Ok(records)
    }
}
