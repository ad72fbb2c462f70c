// Trait seam over the Lemmy API so the controller can run against an
// in-memory source in tests. The real implementation is LemmyClient.

use async_trait::async_trait;

use lemmy_client::{CommentView, GetPostsParams, LemmyClient, PostView};

#[async_trait]
pub trait PostSource: Send + Sync {
    /// One page of posts, instance-wide or for a single community.
    async fn list_posts(&self, params: &GetPostsParams) -> lemmy_client::Result<Vec<PostView>>;

    /// Comments for a post, best first.
    async fn list_comments(
        &self,
        post_id: i64,
        max_depth: u32,
        limit: u32,
    ) -> lemmy_client::Result<Vec<CommentView>>;
}

#[async_trait]
impl PostSource for LemmyClient {
    async fn list_posts(&self, params: &GetPostsParams) -> lemmy_client::Result<Vec<PostView>> {
        LemmyClient::list_posts(self, params).await
    }

    async fn list_comments(
        &self,
        post_id: i64,
        max_depth: u32,
        limit: u32,
    ) -> lemmy_client::Result<Vec<CommentView>> {
        LemmyClient::list_comments(self, post_id, max_depth, limit).await
    }
}
