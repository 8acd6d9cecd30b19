use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use haven_core::WallPost;
use parking_lot::RwLock;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WallError {
    #[error("wall store is unavailable")]
    Unavailable,
    #[error("backing store error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// One logical key-value space of wall posts with per-post expiry.
///
/// Expiry filtering on the read path is authoritative in every backend;
/// `sweep_expired` only reclaims storage eagerly. Posts that expire between
/// enumeration and fetch are silently skipped, never an error.
pub trait WallRepository: Send + Sync {
    /// Stores `post` under its id with an absolute expiry of `ttl_seconds`
    /// from now.
    async fn put_post(&self, post: &WallPost, ttl_seconds: i64) -> Result<(), WallError>;

    /// Every non-expired post, newest first.
    async fn list_posts(&self) -> Result<Vec<WallPost>, WallError>;

    /// Liveness probe of the backing store.
    async fn is_available(&self) -> bool;

    /// Best-effort eager reclamation of expired entries; returns how many
    /// were removed.
    async fn sweep_expired(&self) -> Result<u64, WallError>;
}

#[derive(Debug, Clone)]
struct StoredPost {
    post: WallPost,
    expires_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct MemoryWallStore {
    entries: Arc<RwLock<HashMap<String, StoredPost>>>,
}

impl MemoryWallStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WallRepository for MemoryWallStore {
    async fn put_post(&self, post: &WallPost, ttl_seconds: i64) -> Result<(), WallError> {
        let entry = StoredPost {
            post: post.clone(),
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        };
        self.entries.write().insert(post.id.clone(), entry);
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<WallPost>, WallError> {
        let now = Utc::now();
        let mut posts = self
            .entries
            .read()
            .values()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.post.clone())
            .collect::<Vec<_>>();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn sweep_expired(&self) -> Result<u64, WallError> {
        let now = Utc::now();
        let mut removed = 0_u64;
        self.entries.write().retain(|_, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}

#[derive(Clone)]
pub struct SqliteWallStore {
    pool: SqlitePool,
}

impl SqliteWallStore {
    pub async fn connect(database_url: &str) -> Result<Self, WallError> {
        let pool = SqlitePool::connect(database_url).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), WallError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wall_posts (
              id TEXT PRIMARY KEY,
              message TEXT NOT NULL,
              mood TEXT NOT NULL,
              created_at TEXT NOT NULL,
              expires_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> WallPost {
        let created_at = row
            .get::<String, _>("created_at")
            .parse()
            .unwrap_or_else(|_| Utc::now());
        let expires_at = row
            .get::<String, _>("expires_at")
            .parse()
            .unwrap_or_else(|_| Utc::now());

        WallPost {
            id: row.get("id"),
            message: row.get("message"),
            mood: row.get("mood"),
            created_at,
            expires_at,
        }
    }
}

impl WallRepository for SqliteWallStore {
    async fn put_post(&self, post: &WallPost, ttl_seconds: i64) -> Result<(), WallError> {
        let expires_at = Utc::now() + Duration::seconds(ttl_seconds);

        sqlx::query(
            r#"
            INSERT INTO wall_posts (id, message, mood, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
              message=excluded.message,
              mood=excluded.mood,
              created_at=excluded.created_at,
              expires_at=excluded.expires_at
            "#,
        )
        .bind(&post.id)
        .bind(&post.message)
        .bind(&post.mood)
        .bind(post.created_at.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<WallPost>, WallError> {
        let rows = sqlx::query(
            r#"
            SELECT id, message, mood, created_at, expires_at
            FROM wall_posts
            WHERE expires_at > ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_post).collect())
    }

    async fn is_available(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn sweep_expired(&self) -> Result<u64, WallError> {
        let result = sqlx::query("DELETE FROM wall_posts WHERE expires_at <= ?1")
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Runtime-selected backend. `Disabled` stands in when the configured
/// backing store cannot be reached, so the rest of the system keeps running
/// with wall features switched off instead of crashing.
#[derive(Clone)]
pub enum WallStore {
    Memory(MemoryWallStore),
    Sqlite(SqliteWallStore),
    Disabled,
}

impl WallStore {
    pub fn memory() -> Self {
        Self::Memory(MemoryWallStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self, WallError> {
        let sqlite = SqliteWallStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }
}

impl WallRepository for WallStore {
    async fn put_post(&self, post: &WallPost, ttl_seconds: i64) -> Result<(), WallError> {
        match self {
            WallStore::Memory(store) => store.put_post(post, ttl_seconds).await,
            WallStore::Sqlite(store) => store.put_post(post, ttl_seconds).await,
            WallStore::Disabled => Err(WallError::Unavailable),
        }
    }

    async fn list_posts(&self) -> Result<Vec<WallPost>, WallError> {
        match self {
            WallStore::Memory(store) => store.list_posts().await,
            WallStore::Sqlite(store) => store.list_posts().await,
            WallStore::Disabled => Err(WallError::Unavailable),
        }
    }

    async fn is_available(&self) -> bool {
        match self {
            WallStore::Memory(store) => store.is_available().await,
            WallStore::Sqlite(store) => store.is_available().await,
            WallStore::Disabled => false,
        }
    }

    async fn sweep_expired(&self) -> Result<u64, WallError> {
        match self {
            WallStore::Memory(store) => store.sweep_expired().await,
            WallStore::Sqlite(store) => store.sweep_expired().await,
            WallStore::Disabled => Err(WallError::Unavailable),
        }
    }
}
