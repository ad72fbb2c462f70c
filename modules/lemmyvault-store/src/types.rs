use chrono::{DateTime, Utc};

/// A row from the media table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MediaRecord {
    pub id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub community_name: String,
    pub community_id: i64,
    pub author_name: String,
    pub author_id: i64,
    pub media_url: String,
    pub content_hash: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub media_type: String,
    pub post_score: i64,
    pub post_created: DateTime<Utc>,
    pub downloaded_at: DateTime<Utc>,
}

/// Parameters for inserting a new media row.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub post_id: i64,
    pub post_title: String,
    pub community_name: String,
    pub community_id: i64,
    pub author_name: String,
    pub author_id: i64,
    pub media_url: String,
    pub content_hash: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub media_type: String,
    pub post_score: i64,
    pub post_created: DateTime<Utc>,
}

/// Parameters for the visited-post ledger upsert.
#[derive(Debug, Clone)]
pub struct VisitedPost {
    pub post_id: i64,
    pub post_title: String,
    pub community_name: String,
    pub community_id: i64,
    pub author_name: String,
    pub author_id: i64,
    pub post_created: DateTime<Utc>,
    pub media_count: i64,
}

/// Parameters for archiving one comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub comment_id: i64,
    pub post_id: i64,
    pub author_name: String,
    pub author_id: i64,
    pub content: String,
    pub score: i64,
    pub published: DateTime<Utc>,
}

/// Aggregate numbers for the stats report.
#[derive(Debug, Default)]
pub struct VaultStats {
    pub total_media: i64,
    pub total_posts: i64,
    pub by_type: Vec<(String, i64)>,
    pub top_communities: Vec<(String, i64)>,
}

impl std::fmt::Display for VaultStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Vault Statistics ===")?;
        writeln!(f, "Posts visited: {}", self.total_posts)?;
        writeln!(f, "Media files:   {}", self.total_media)?;
        if !self.by_type.is_empty() {
            writeln!(f, "\nBy media type:")?;
            for (media_type, count) in &self.by_type {
                writeln!(f, "  {media_type}: {count}")?;
            }
        }
        if !self.top_communities.is_empty() {
            writeln!(f, "\nTop communities:")?;
            for (community, count) in &self.top_communities {
                writeln!(f, "  {community}: {count}")?;
            }
        }
        Ok(())
    }
}
