// SQLite persistence for the post ledger, media records and comment archive.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::error::Result;
use crate::types::{MediaRecord, NewComment, NewMedia, VaultStats, VisitedPost};

/// Handle to the durable store.
///
/// The check-then-insert sequences here are not transactional: the scraper is
/// the only writer, one logical flow at a time. A multi-writer deployment
/// would need the fingerprint lookup and insert wrapped in a transaction.
#[derive(Clone)]
pub struct VaultStore {
    pool: SqlitePool,
}

impl VaultStore {
    /// Open (creating if missing) the database at `path`.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // One connection enforces the single-writer discipline.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::StoreError::Database(e.into()))?;
        Ok(())
    }

    // --- Post ledger ---

    /// Has this post been visited in any prior run?
    pub async fn post_exists(&self, post_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE post_id = ?)",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Idempotent upsert keyed by post id; the latest media count wins.
    pub async fn mark_post_scraped(&self, post: &VisitedPost) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts
                (post_id, post_title, community_name, community_id,
                 author_name, author_id, post_created, scraped_at,
                 had_media, media_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(post_id) DO UPDATE SET
                scraped_at = excluded.scraped_at,
                had_media = excluded.had_media,
                media_count = excluded.media_count
            "#,
        )
        .bind(post.post_id)
        .bind(&post.post_title)
        .bind(&post.community_name)
        .bind(post.community_id)
        .bind(&post.author_name)
        .bind(post.author_id)
        .bind(post.post_created)
        .bind(Utc::now())
        .bind(post.media_count > 0)
        .bind(post.media_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- Media records ---

    /// Look up a media record by content fingerprint.
    pub async fn media_by_hash(&self, hash: &str) -> Result<Option<MediaRecord>> {
        let row = sqlx::query_as::<_, MediaRecord>(
            "SELECT * FROM media WHERE content_hash = ? LIMIT 1",
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert a new media row. Fails on a duplicate fingerprint or a repeated
    /// (post id, URL) pair; both constraints live in the schema.
    pub async fn insert_media(&self, media: &NewMedia) -> Result<MediaRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO media
                (post_id, post_title, community_name, community_id,
                 author_name, author_id, media_url, content_hash,
                 file_name, file_path, file_size, media_type,
                 post_score, post_created, downloaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(media.post_id)
        .bind(&media.post_title)
        .bind(&media.community_name)
        .bind(media.community_id)
        .bind(&media.author_name)
        .bind(media.author_id)
        .bind(&media.media_url)
        .bind(&media.content_hash)
        .bind(&media.file_name)
        .bind(&media.file_path)
        .bind(media.file_size)
        .bind(&media.media_type)
        .bind(media.post_score)
        .bind(media.post_created)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, MediaRecord>("SELECT * FROM media WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    // --- Comment archive ---

    /// True when at least one comment has been archived for this post.
    pub async fn comments_exist_for_post(&self, post_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE post_id = ?)",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn insert_comment(&self, comment: &NewComment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments
                (comment_id, post_id, author_name, author_id,
                 content, score, published, saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(comment_id) DO NOTHING
            "#,
        )
        .bind(comment.comment_id)
        .bind(comment.post_id)
        .bind(&comment.author_name)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.score)
        .bind(comment.published)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- Stats ---

    pub async fn stats(&self) -> Result<VaultStats> {
        let total_media = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await?;
        let total_posts = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        let by_type = sqlx::query_as::<_, (String, i64)>(
            "SELECT media_type, COUNT(*) FROM media GROUP BY media_type ORDER BY COUNT(*) DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        let top_communities = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT community_name, COUNT(*) FROM media
            GROUP BY community_name
            ORDER BY COUNT(*) DESC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(VaultStats {
            total_media,
            total_posts,
            by_type,
            top_communities,
        })
    }
}
