use async_trait::async_trait;
use chrono::Utc;
use fd_core::{normalize_url, Error, FeedDescriptor, FeedRegistry, Result, Summary, SummaryCache};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS feeds (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS summaries (
        url TEXT PRIMARY KEY,
        id TEXT NOT NULL,
        summary TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

/// Rows fetched per round trip when listing feeds.
const LIST_PAGE_SIZE: i64 = 100;

const MAX_CONNECTIONS: u32 = 5;

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl StorageBackend for SQLiteStorage {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Store(format!("Failed to create database directory: {}", e)))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| Error::Store(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Store(format!("Failed to run migration {}: {}", i, e)))?;
        }

        tracing::debug!("SQLite storage ready at {}", db_path.display());
        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn feed_from_row(row: &SqliteRow) -> FeedDescriptor {
    FeedDescriptor {
        id: row.get("id"),
        name: row.get("name"),
        url: row.get("url"),
    }
}

fn summary_from_row(row: &SqliteRow) -> Summary {
    Summary {
        id: row.get("id"),
        url: row.get("url"),
        summary: row.get("summary"),
    }
}

#[async_trait]
impl FeedRegistry for SQLiteStorage {
    async fn register(&self, name: &str, url: &str) -> Result<FeedDescriptor> {
        let feed = FeedDescriptor::new(name, normalize_url(url)?);

        sqlx::query("INSERT INTO feeds (id, name, url) VALUES (?, ?, ?)")
            .bind(&feed.id)
            .bind(&feed.name)
            .bind(&feed.url)
            .execute(&*self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    Error::Conflict("Feed with this URL already exists".to_string())
                }
                e => Error::Store(format!("Failed to add feed: {}", e)),
            })?;

        Ok(feed)
    }

    async fn lookup_url(&self, id: &str) -> Result<String> {
        let row = sqlx::query("SELECT url FROM feeds WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to look up feed: {}", e)))?;

        row.map(|row| row.get::<String, _>("url"))
            .ok_or_else(|| Error::NotFound(format!("Feed not found: {}", id)))
    }

    async fn contains_url(&self, url: &str) -> Result<bool> {
        let url = normalize_url(url)?;
        let row = sqlx::query("SELECT 1 FROM feeds WHERE url = ?")
            .bind(&url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to check feed url: {}", e)))?;
        Ok(row.is_some())
    }

    async fn list(&self) -> Result<Vec<FeedDescriptor>> {
        let mut feeds = Vec::new();
        let mut cursor = String::new();

        loop {
            let rows = sqlx::query(
                r#"
                SELECT id, name, url FROM feeds
                WHERE id > ?
                ORDER BY id
                LIMIT ?
                "#,
            )
            .bind(&cursor)
            .bind(LIST_PAGE_SIZE)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to list feeds: {}", e)))?;

            let page_len = rows.len();
            feeds.extend(rows.iter().map(feed_from_row));

            match feeds.last() {
                Some(last) if page_len as i64 == LIST_PAGE_SIZE => cursor = last.id.clone(),
                _ => break,
            }
        }

        Ok(feeds)
    }
}

#[async_trait]
impl SummaryCache for SQLiteStorage {
    async fn get(&self, url: &str) -> Result<Option<Summary>> {
        let row = sqlx::query("SELECT id, url, summary FROM summaries WHERE url = ?")
            .bind(url)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to read summary: {}", e)))?;
        Ok(row.as_ref().map(summary_from_row))
    }

    async fn put(&self, summary: &Summary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO summaries (url, id, summary, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                id = excluded.id,
                summary = excluded.summary,
                created_at = excluded.created_at
            "#,
        )
        .bind(&summary.url)
        .bind(&summary.id)
        .bind(&summary.summary)
        .bind(Utc::now().to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to store summary: {}", e)))?;

        Ok(())
    }

    async fn put_if_absent(&self, summary: &Summary) -> Result<Summary> {
        sqlx::query(
            r#"
            INSERT INTO summaries (url, id, summary, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&summary.url)
        .bind(&summary.id)
        .bind(&summary.summary)
        .bind(Utc::now().to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to store summary: {}", e)))?;

        self.get(&summary.url)
            .await?
            .ok_or_else(|| Error::Store(format!("Summary vanished after write: {}", summary.url)))
    }
}
