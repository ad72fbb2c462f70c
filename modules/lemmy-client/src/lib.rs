pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{
    Comment, CommentAggregates, CommentView, Community, GetPostsParams, Person, Post,
    PostAggregates, PostView,
};

use std::time::Duration;

use tracing::debug;

use types::{GetCommentsResponse, GetPostsResponse, LoginRequest, LoginResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Lemmy v3 HTTP API.
pub struct LemmyClient {
    base_url: String,
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl LemmyClient {
    /// Create a client for an instance hostname, e.g. "lemmy.ml".
    pub fn new(instance: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: format!("https://{instance}/api/v3"),
            client,
            auth_token: None,
        })
    }

    /// Authenticate and keep the JWT for subsequent requests.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let body = LoginRequest {
            username_or_email: username,
            password,
        };

        let resp = self
            .client
            .post(format!("{}/user/login", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let login: LoginResponse = resp.json().await?;
        self.auth_token = login.jwt;
        Ok(())
    }

    /// Fetch one page of posts, instance-wide or for a single community.
    pub async fn list_posts(&self, params: &GetPostsParams) -> Result<Vec<PostView>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if !params.sort.is_empty() {
            query.push(("sort", params.sort.clone()));
        }
        if params.page > 0 {
            query.push(("page", params.page.to_string()));
        }
        if params.limit > 0 {
            query.push(("limit", params.limit.to_string()));
        }
        if let Some(name) = &params.community_name {
            query.push(("community_name", name.clone()));
        }

        debug!(page = params.page, limit = params.limit, "Requesting post list");

        let mut req = self
            .client
            .get(format!("{}/post/list", self.base_url))
            .query(&query);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let posts: GetPostsResponse = resp.json().await?;
        debug!(count = posts.posts.len(), "Retrieved posts");
        Ok(posts.posts)
    }

    /// Fetch comments for a post, best-scored first.
    pub async fn list_comments(
        &self,
        post_id: i64,
        max_depth: u32,
        limit: u32,
    ) -> Result<Vec<CommentView>> {
        let mut query: Vec<(&str, String)> = vec![
            ("post_id", post_id.to_string()),
            ("sort", "Top".to_string()),
        ];
        if max_depth > 0 {
            query.push(("max_depth", max_depth.to_string()));
        }
        if limit > 0 {
            query.push(("limit", limit.to_string()));
        }

        let mut req = self
            .client
            .get(format!("{}/comment/list", self.base_url))
            .query(&query);
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let comments: GetCommentsResponse = resp.json().await?;
        debug!(post_id, count = comments.comments.len(), "Retrieved comments");
        Ok(comments.comments)
    }
}
