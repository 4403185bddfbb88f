//! SQLite storage backend for mnemo.
//!
//! Implements [`ItemStore`] over a single [`rusqlite`] connection behind a
//! mutex. Items, their attachment blobs, and the review log live in three
//! tables; attachment bytes round-trip exactly. Pass `":memory:"` as the
//! path for an ephemeral database.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use mnemo_core::error::{MnemoError, MnemoResult};
use mnemo_core::store::ItemStore;
use mnemo_core::types::{ReviewLog, StudyItem};

/// SQLite-backed item store.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run migrations.
    pub fn new(db_path: impl AsRef<Path>) -> MnemoResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = if db_path.as_ref().to_str() == Some(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(db_path.as_ref())
        }
        .map_err(db_err)?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.create_tables()?;
        tracing::debug!(path = %db_path.as_ref().display(), "sqlite store opened");
        Ok(store)
    }

    fn lock(&self) -> MnemoResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MnemoError::storage("sqlite connection mutex poisoned"))
    }

    fn create_tables(&self) -> MnemoResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id             TEXT PRIMARY KEY,
                title          TEXT NOT NULL,
                body           TEXT NOT NULL,
                tags           TEXT NOT NULL DEFAULT '[]',
                pdf            BLOB,
                created_at     TEXT NOT NULL,
                next_review_at TEXT NOT NULL,
                review_count   INTEGER NOT NULL DEFAULT 0,
                ease_factor    REAL NOT NULL,
                interval_days  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS item_images (
                item_id  TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                data     BLOB NOT NULL,
                PRIMARY KEY (item_id, position)
            );

            CREATE TABLE IF NOT EXISTS review_log (
                id            TEXT PRIMARY KEY,
                item_id       TEXT NOT NULL,
                reviewed_at   TEXT NOT NULL,
                quality       INTEGER NOT NULL,
                response_secs REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_next_review ON items(next_review_at);
            CREATE INDEX IF NOT EXISTS idx_review_log_item ON review_log(item_id);
            "#,
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn images_for(conn: &Connection, item_id: &str) -> MnemoResult<Vec<Vec<u8>>> {
        let mut stmt = conn
            .prepare("SELECT data FROM item_images WHERE item_id = ?1 ORDER BY position ASC")
            .map_err(db_err)?;
        let images = stmt
            .query_map([item_id], |row| row.get::<_, Vec<u8>>(0))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(images)
    }

    fn write_images(
        conn: &Connection,
        item_id: &str,
        images: &[Vec<u8>],
    ) -> MnemoResult<()> {
        conn.execute("DELETE FROM item_images WHERE item_id = ?1", [item_id])
            .map_err(db_err)?;
        let mut stmt = conn
            .prepare("INSERT INTO item_images (item_id, position, data) VALUES (?1, ?2, ?3)")
            .map_err(db_err)?;
        for (position, data) in images.iter().enumerate() {
            stmt.execute(params![item_id, position as i64, data])
                .map_err(db_err)?;
        }
        Ok(())
    }

    fn query_items(
        conn: &Connection,
        where_order: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> MnemoResult<Vec<StudyItem>> {
        let sql = format!(
            "SELECT id, title, body, tags, pdf, created_at, next_review_at, \
             review_count, ease_factor, interval_days FROM items {}",
            where_order
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(args, row_to_raw)
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut items = Vec::with_capacity(rows.len());
        for raw in rows {
            let images = Self::images_for(conn, &raw.id)?;
            items.push(raw.into_item(images)?);
        }
        Ok(items)
    }
}

/// Item row before timestamp and tag decoding.
struct RawItem {
    id: String,
    title: String,
    body: String,
    tags: String,
    pdf: Option<Vec<u8>>,
    created_at: String,
    next_review_at: String,
    review_count: i64,
    ease_factor: f64,
    interval_days: i64,
}

impl RawItem {
    fn into_item(self, images: Vec<Vec<u8>>) -> MnemoResult<StudyItem> {
        Ok(StudyItem {
            id: parse_uuid(&self.id)?,
            title: self.title,
            body: self.body,
            images,
            pdf: self.pdf,
            tags: serde_json::from_str(&self.tags)?,
            created_at: parse_timestamp(&self.created_at)?,
            next_review_at: parse_timestamp(&self.next_review_at)?,
            review_count: self.review_count as u32,
            ease_factor: self.ease_factor,
            interval_days: self.interval_days as i32,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        tags: row.get(3)?,
        pdf: row.get(4)?,
        created_at: row.get(5)?,
        next_review_at: row.get(6)?,
        review_count: row.get(7)?,
        ease_factor: row.get(8)?,
        interval_days: row.get(9)?,
    })
}

fn db_err(e: rusqlite::Error) -> MnemoError {
    MnemoError::storage_with_source("sqlite operation failed", e)
}

fn parse_uuid(s: &str) -> MnemoResult<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| MnemoError::storage_with_source(format!("invalid uuid '{}'", s), e))
}

fn parse_timestamp(s: &str) -> MnemoResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MnemoError::storage_with_source(format!("invalid timestamp '{}'", s), e))
}

fn encode_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[async_trait]
impl ItemStore for SqliteStore {
    async fn insert(&self, item: StudyItem) -> MnemoResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO items (
                id, title, body, tags, pdf, created_at, next_review_at,
                review_count, ease_factor, interval_days
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                item.id.to_string(),
                item.title,
                item.body,
                serde_json::to_string(&item.tags)?,
                item.pdf,
                encode_timestamp(item.created_at),
                encode_timestamp(item.next_review_at),
                i64::from(item.review_count),
                item.ease_factor,
                i64::from(item.interval_days),
            ],
        )
        .map_err(db_err)?;
        Self::write_images(&conn, &item.id.to_string(), &item.images)
    }

    async fn fetch_all(&self) -> MnemoResult<Vec<StudyItem>> {
        let conn = self.lock()?;
        Self::query_items(&conn, "ORDER BY created_at DESC", &[])
    }

    async fn fetch_one(&self, id: Uuid) -> MnemoResult<Option<StudyItem>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT id, title, body, tags, pdf, created_at, next_review_at, \
                 review_count, ease_factor, interval_days FROM items WHERE id = ?1",
                [id.to_string()],
                row_to_raw,
            )
            .optional()
            .map_err(db_err)?;

        match raw {
            Some(raw) => {
                let images = Self::images_for(&conn, &raw.id)?;
                Ok(Some(raw.into_item(images)?))
            }
            None => Ok(None),
        }
    }

    async fn fetch_due(&self, now: DateTime<Utc>) -> MnemoResult<Vec<StudyItem>> {
        let conn = self.lock()?;
        Self::query_items(
            &conn,
            "WHERE next_review_at <= ?1 ORDER BY next_review_at ASC",
            &[&encode_timestamp(now)],
        )
    }

    async fn update(&self, item: StudyItem) -> MnemoResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                r#"
                UPDATE items SET
                    title = ?2, body = ?3, tags = ?4, pdf = ?5,
                    created_at = ?6, next_review_at = ?7,
                    review_count = ?8, ease_factor = ?9, interval_days = ?10
                WHERE id = ?1
                "#,
                params![
                    item.id.to_string(),
                    item.title,
                    item.body,
                    serde_json::to_string(&item.tags)?,
                    item.pdf,
                    encode_timestamp(item.created_at),
                    encode_timestamp(item.next_review_at),
                    i64::from(item.review_count),
                    item.ease_factor,
                    i64::from(item.interval_days),
                ],
            )
            .map_err(db_err)?;
        if changed == 0 {
            return Err(MnemoError::not_found(item.id));
        }
        Self::write_images(&conn, &item.id.to_string(), &item.images)
    }

    async fn delete(&self, id: Uuid) -> MnemoResult<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM items WHERE id = ?1", [id.to_string()])
            .map_err(db_err)?;
        if changed == 0 {
            return Err(MnemoError::not_found(id));
        }
        // Cascades need the pragma; do it explicitly instead.
        conn.execute(
            "DELETE FROM item_images WHERE item_id = ?1",
            [id.to_string()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn append_review(&self, log: ReviewLog) -> MnemoResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO review_log (id, item_id, reviewed_at, quality, response_secs)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                log.id.to_string(),
                log.item_id.to_string(),
                encode_timestamp(log.reviewed_at),
                i64::from(log.quality),
                log.response_secs,
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    async fn fetch_reviews(&self, item_id: Uuid) -> MnemoResult<Vec<ReviewLog>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, item_id, reviewed_at, quality, response_secs \
                 FROM review_log WHERE item_id = ?1 ORDER BY reviewed_at DESC",
            )
            .map_err(db_err)?;

        struct RawLog {
            id: String,
            item_id: String,
            reviewed_at: String,
            quality: i64,
            response_secs: f64,
        }

        let rows = stmt
            .query_map([item_id.to_string()], |row| {
                Ok(RawLog {
                    id: row.get(0)?,
                    item_id: row.get(1)?,
                    reviewed_at: row.get(2)?,
                    quality: row.get(3)?,
                    response_secs: row.get(4)?,
                })
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        let mut logs = Vec::with_capacity(rows.len());
        for raw in rows {
            logs.push(ReviewLog {
                id: parse_uuid(&raw.id)?,
                item_id: parse_uuid(&raw.item_id)?,
                reviewed_at: parse_timestamp(&raw.reviewed_at)?,
                quality: raw.quality as u8,
                response_secs: raw.response_secs,
            });
        }
        Ok(logs)
    }
}
