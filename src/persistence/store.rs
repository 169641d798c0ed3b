//! SQLite-based run history store

use crate::codec::PipelineDocument;
use crate::core::state::{ActionOutcome, ExecutorState};
use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use uuid::Uuid;

const SELECT_RUN: &str = r#"
    SELECT id, state, started_at, completed_at, outcomes, document
    FROM runs
"#;

/// SQLite run store
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn new(db_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("wowza-bootstrap");
        std::fs::create_dir_all(&db_dir)
            .with_context(|| format!("Failed to create {}", db_dir.display()))?;

        Self::new(&db_dir.join("runs.db")).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                outcomes TEXT NOT NULL,
                document TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to initialize run history schema")?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn from_row(row: &SqliteRow) -> Result<RunSummary> {
        let state: String = row.try_get("state")?;
        let outcomes: String = row.try_get("outcomes")?;
        let document: String = row.try_get("document")?;

        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.try_get::<String, _>("id")?)?,
            state: ExecutorState::parse(&state)
                .with_context(|| format!("Unknown executor state '{}'", state))?,
            started_at: Self::from_naive(row.try_get("started_at")?),
            completed_at: row
                .try_get::<Option<NaiveDateTime>, _>("completed_at")?
                .map(Self::from_naive),
            outcomes: serde_json::from_str::<Vec<ActionOutcome>>(&outcomes)
                .context("Corrupt outcomes column")?,
            document: PipelineDocument::from_json(&document)?,
        })
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteRunStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, state, started_at, completed_at, outcomes, document)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(run.state.as_str())
        .bind(Self::to_naive(run.started_at))
        .bind(run.completed_at.map(Self::to_naive))
        .bind(serde_json::to_string(&run.outcomes)?)
        .bind(serde_json::to_string(&run.document)?)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_RUN))
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load run")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(&format!("{} ORDER BY started_at DESC LIMIT ?1", SELECT_RUN))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list runs")?;

        rows.iter().map(Self::from_row).collect()
    }
}
