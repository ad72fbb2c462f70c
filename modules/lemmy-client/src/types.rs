use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as returned by `/post/list`. Only the fields the scraper reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    /// Post title. Lemmy calls this `name`.
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub embed_video_url: Option<String>,
    pub community_id: i64,
    pub creator_id: i64,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub nsfw: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Community {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

/// Aggregate counters attached to a post view.
#[derive(Debug, Clone, Deserialize)]
pub struct PostAggregates {
    pub score: i64,
    #[serde(default)]
    pub comments: i64,
}

/// A post with its creator, community and counters, as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct PostView {
    pub post: Post,
    pub creator: Person,
    pub community: Community,
    pub counts: PostAggregates,
}

#[derive(Debug, Deserialize)]
pub struct GetPostsResponse {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentAggregates {
    pub score: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub creator: Person,
    pub counts: CommentAggregates,
}

#[derive(Debug, Deserialize)]
pub struct GetCommentsResponse {
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username_or_email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub jwt: Option<String>,
}

/// Parameters for `/post/list`.
#[derive(Debug, Clone, Default)]
pub struct GetPostsParams {
    /// Sort order, e.g. "Hot", "New", "TopDay".
    pub sort: String,
    /// 1-based page number.
    pub page: u32,
    /// Posts per page. The API caps this at 50.
    pub limit: u32,
    /// Restrict to one community by name. None means the instance feed.
    pub community_name: Option<String>,
}
