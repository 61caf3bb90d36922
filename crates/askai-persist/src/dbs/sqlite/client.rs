use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::{Path, PathBuf};

use crate::dbs::sqlite::models::ConversationRow;
use crate::error::{PersistError, Result};
use crate::models::{ConversationRecord, NewConversation};
use crate::trait_client::ConversationStore;

const CREATE_CONVERSATIONS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prompt TEXT NOT NULL,
    response TEXT NOT NULL,
    model TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Conversation log backed by a single SQLite table
///
/// `AUTOINCREMENT` keeps ids monotonic even across `delete_all`.
#[derive(Clone)]
pub struct SqliteConversationStore {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl SqliteConversationStore {
    /// Open (or create) the database file and make sure the schema exists
    pub async fn connect(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path_buf)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let store = Self {
            pool,
            path: Some(path_buf),
        };
        store.ensure_schema().await?;

        tracing::info!(path = %path.as_ref().display(), "Conversation store initialized");
        Ok(store)
    }

    /// Private in-memory database, mainly for tests
    ///
    /// Pinned to one connection that never expires, otherwise the data would
    /// vanish with the connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let store = Self { pool, path: None };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Conversation store closed");
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(CREATE_CONVERSATIONS_SQL)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn append(&self, conversation: NewConversation) -> Result<ConversationRecord> {
        let result = sqlx::query(
            "INSERT INTO conversations (prompt, response, model, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&conversation.prompt)
        .bind(&conversation.response)
        .bind(&conversation.model)
        .bind(conversation.timestamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(id, "Saved conversation");
        Ok(conversation.into_record(id))
    }

    async fn list_all(&self) -> Result<Vec<ConversationRecord>> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            "SELECT id, prompt, response, model, timestamp FROM conversations ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = rows.len(), "Retrieved conversations");
        Ok(rows.into_iter().map(ConversationRecord::from).collect())
    }

    async fn delete_all(&self) -> Result<u64> {
        let deleted = sqlx::query("DELETE FROM conversations")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(deleted, "Cleared conversations");
        Ok(deleted)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| PersistError::Internal(format!("negative row count {}", count)))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
