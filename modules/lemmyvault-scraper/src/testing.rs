// Test doubles: an in-memory post source and byte fetcher, plus fixture
// builders. Compiled for tests only.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use lemmy_client::{
    ClientError, Comment, CommentAggregates, CommentView, Community, GetPostsParams, Person, Post,
    PostAggregates, PostView,
};

use crate::downloader::{ByteFetcher, DownloadError, FetchedPayload};
use crate::traits::PostSource;

pub fn post_view(
    id: i64,
    url: Option<&str>,
    embed_video_url: Option<&str>,
    thumbnail_url: Option<&str>,
) -> PostView {
    PostView {
        post: Post {
            id,
            name: format!("post {id}"),
            url: url.map(String::from),
            thumbnail_url: thumbnail_url.map(String::from),
            embed_video_url: embed_video_url.map(String::from),
            community_id: 7,
            creator_id: 42,
            published: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
            nsfw: false,
        },
        creator: Person {
            id: 42,
            name: "alice".to_string(),
        },
        community: Community {
            id: 7,
            name: "pics".to_string(),
            title: "Pictures".to_string(),
        },
        counts: PostAggregates {
            score: 10,
            comments: 0,
        },
    }
}

pub fn comment_view(id: i64, post_id: i64, content: &str, removed: bool) -> CommentView {
    CommentView {
        comment: Comment {
            id,
            post_id,
            content: content.to_string(),
            published: Utc.with_ymd_and_hms(2026, 1, 11, 9, 0, 0).unwrap(),
            removed,
            deleted: false,
        },
        creator: Person {
            id: 3,
            name: "bob".to_string(),
        },
        counts: CommentAggregates { score: 2 },
    }
}

/// Serves canned payloads by URL and records every fetch. Unknown URLs get a
/// 404 so transport failures are easy to stage.
#[derive(Default)]
pub struct MockFetcher {
    payloads: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fetched: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn serve(&self, url: &str, bytes: &[u8], content_type: &str) {
        self.payloads
            .lock()
            .unwrap()
            .insert(url.to_string(), (bytes.to_vec(), content_type.to_string()));
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ByteFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPayload, DownloadError> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.payloads.lock().unwrap().get(url) {
            Some((bytes, content_type)) => Ok(FetchedPayload {
                bytes: bytes.clone(),
                content_type: content_type.clone(),
            }),
            None => Err(DownloadError::Http(404)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub community: Option<String>,
    pub page: u32,
    pub limit: u32,
}

/// In-memory feed: fixed pages, optional per-community failures, canned
/// comments, and a request log shared out through `requests_handle`.
pub struct MockSource {
    pages: Vec<Vec<PostView>>,
    comments: HashMap<i64, Vec<CommentView>>,
    failed_communities: HashSet<String>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl MockSource {
    pub fn with_pages(pages: Vec<Vec<PostView>>) -> Self {
        Self {
            pages,
            comments: HashMap::new(),
            failed_communities: HashSet::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fail_community(&mut self, name: &str) {
        self.failed_communities.insert(name.to_string());
    }

    pub fn set_comments(&mut self, post_id: i64, comments: Vec<CommentView>) {
        self.comments.insert(post_id, comments);
    }

    pub fn requests_handle(&self) -> Arc<Mutex<Vec<PageRequest>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl PostSource for MockSource {
    async fn list_posts(&self, params: &GetPostsParams) -> lemmy_client::Result<Vec<PostView>> {
        self.requests.lock().unwrap().push(PageRequest {
            community: params.community_name.clone(),
            page: params.page,
            limit: params.limit,
        });

        if let Some(community) = &params.community_name {
            if self.failed_communities.contains(community) {
                return Err(ClientError::Api {
                    status: 500,
                    message: "internal server error".to_string(),
                });
            }
        }

        let index = params.page.saturating_sub(1) as usize;
        let page = self.pages.get(index).cloned().unwrap_or_default();
        Ok(page.into_iter().take(params.limit as usize).collect())
    }

    async fn list_comments(
        &self,
        post_id: i64,
        _max_depth: u32,
        _limit: u32,
    ) -> lemmy_client::Result<Vec<CommentView>> {
        Ok(self.comments.get(&post_id).cloned().unwrap_or_default())
    }
}
