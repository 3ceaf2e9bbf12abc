//! SQLite Database Module
//!
//! Provides storage for the attribute catalog, species catalog, description
//! templates, persisted prompts, and user sessions.

mod migrations;
mod models;

mod attributes;
mod prompts;
mod sessions;
mod species;
mod templates;

pub use attributes::AttributeOps;
pub use migrations::run_migrations;
pub use models::*;
pub use prompts::PromptOps;
pub use sessions::SessionOps;
pub use species::SpeciesOps;
pub use templates::{GeneratorTypeStats, TemplateOps};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors from catalog and store write paths.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Duplicate {entity} '{name}' in {scope}")]
    Duplicate {
        entity: &'static str,
        name: String,
        scope: String,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the database file under `data_dir` and run
    /// migrations.
    pub async fn new(data_dir: &Path) -> Result<Self, sqlx::Error> {
        let db_path = data_dir.join("promptforge.db");

        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", db_path.display()))?
                .create_if_missing(true)
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            path: Some(db_path),
        };
        migrations::run_migrations(&db.pool).await?;
        Ok(db)
    }

    /// In-memory database for tests: full schema and seed data, no file.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            // A single connection keeps the in-memory schema visible.
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool, path: None };
        migrations::run_migrations(&db.pool).await?;
        Ok(db)
    }

    /// Get the underlying pool for direct queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file path (`None` for in-memory databases).
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}
