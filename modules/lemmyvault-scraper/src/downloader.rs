// Content-addressed media storage: fetch, fingerprint, dedup, write, record.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use lemmy_client::PostView;
use lemmyvault_store::{MediaRecord, NewMedia, StoreError, VaultStore};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("empty media URL")]
    EmptyUrl,

    #[error("download failed with status {0}")]
    Http(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("File write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Network(err.to_string())
    }
}

/// Raw response body plus the Content-Type header, if any.
pub struct FetchedPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Fetches a URL's bytes. Behind a trait so tests run without a network.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPayload, DownloadError>;
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPayload, DownloadError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::Http(status.as_u16()));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = resp.bytes().await?.to_vec();
        Ok(FetchedPayload {
            bytes,
            content_type,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
    Other,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Other => "other",
        }
    }
}

/// Classify a payload from its Content-Type header and/or URL suffix.
pub fn media_type_for(content_type: &str, url: &str) -> MediaType {
    let content_type = content_type.to_lowercase();
    let path = strip_query(url).to_lowercase();

    if content_type.contains("image")
        || [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"]
            .iter()
            .any(|ext| path.ends_with(ext))
    {
        return MediaType::Image;
    }
    if content_type.contains("video")
        || [".mp4", ".webm", ".mov", ".avi", ".mkv", ".m4v"]
            .iter()
            .any(|ext| path.ends_with(ext))
    {
        return MediaType::Video;
    }
    MediaType::Other
}

/// File extension for the stored copy: URL suffix first, Content-Type fallback.
pub fn extension_for(content_type: &str, url: &str) -> String {
    let base = base_name(url);
    if let Some(idx) = base.rfind('.') {
        if idx + 1 < base.len() {
            return base[idx..].to_lowercase();
        }
    }

    let content_type = content_type.to_lowercase();
    for (needle, ext) in [
        ("jpeg", ".jpg"),
        ("png", ".png"),
        ("gif", ".gif"),
        ("webp", ".webp"),
        ("mp4", ".mp4"),
        ("webm", ".webm"),
    ] {
        if content_type.contains(needle) {
            return ext.to_string();
        }
    }
    ".bin".to_string()
}

/// Should this URL be fetched at all, given the per-type inclusion flags?
/// Applied before any network I/O so disabled types are never fetched.
pub fn should_download(
    url: &str,
    include_images: bool,
    include_videos: bool,
    include_other: bool,
) -> bool {
    match media_type_for("", url) {
        MediaType::Image => include_images,
        MediaType::Video => include_videos,
        MediaType::Other => include_other,
    }
}

/// Replace path separators and shell-hostile characters so a community name
/// can never escape the storage root.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// Destination file name: `postid_basename`, or `postid.ext` when the URL
/// carries no usable name.
pub fn file_name_for(post_id: i64, url: &str, ext: &str) -> String {
    let base = sanitize_name(base_name(url));
    if base.contains('.') {
        format!("{post_id}_{base}")
    } else {
        format!("{post_id}{ext}")
    }
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or("")
}

fn base_name(url: &str) -> &str {
    strip_query(url).rsplit('/').next().unwrap_or("")
}

/// Outcome of an acquire: either new bytes were stored, or the payload was
/// already known under another (or the same) URL.
#[derive(Debug)]
pub enum Acquired {
    Fresh(MediaRecord),
    Duplicate(MediaRecord),
}

pub struct Downloader {
    store: VaultStore,
    fetcher: Arc<dyn ByteFetcher>,
    base_dir: PathBuf,
}

impl Downloader {
    pub fn new(store: VaultStore, fetcher: Arc<dyn ByteFetcher>, base_dir: impl AsRef<Path>) -> Self {
        Self {
            store,
            fetcher,
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Fetch `url` and store its bytes exactly once.
    ///
    /// The duplicate fast path does nothing but a fingerprint lookup. A fresh
    /// payload is written to disk first and recorded second; if the record
    /// cannot be inserted the file is removed again so no orphan remains.
    pub async fn download(&self, url: &str, post: &PostView) -> Result<Acquired, DownloadError> {
        if url.is_empty() {
            return Err(DownloadError::EmptyUrl);
        }

        debug!(url, "Attempting media download");

        let payload = self.fetcher.fetch(url).await?;
        let hash = hex::encode(Sha256::digest(&payload.bytes));

        if let Some(existing) = self.store.media_by_hash(&hash).await? {
            debug!(hash = %&hash[..16], url, "Payload already stored, skipping");
            return Ok(Acquired::Duplicate(existing));
        }

        let media_type = media_type_for(&payload.content_type, url);
        let ext = extension_for(&payload.content_type, url);
        let file_name = file_name_for(post.post.id, url, &ext);

        let dir = self.base_dir.join(sanitize_name(&post.community.name));
        tokio::fs::create_dir_all(&dir).await?;
        let file_path = dir.join(&file_name);
        tokio::fs::write(&file_path, &payload.bytes).await?;

        let media = NewMedia {
            post_id: post.post.id,
            post_title: post.post.name.clone(),
            community_name: post.community.name.clone(),
            community_id: post.community.id,
            author_name: post.creator.name.clone(),
            author_id: post.creator.id,
            media_url: url.to_string(),
            content_hash: hash,
            file_name: file_name.clone(),
            file_path: file_path.to_string_lossy().into_owned(),
            file_size: payload.bytes.len() as i64,
            media_type: media_type.as_str().to_string(),
            post_score: post.counts.score,
            post_created: post.post.published,
        };

        match self.store.insert_media(&media).await {
            Ok(record) => {
                info!(
                    file = file_name.as_str(),
                    media_type = media_type.as_str(),
                    bytes = payload.bytes.len(),
                    "Downloaded media"
                );
                Ok(Acquired::Fresh(record))
            }
            Err(e) => {
                // No orphaned file without an index entry.
                if let Err(io_err) = tokio::fs::remove_file(&file_path).await {
                    warn!(
                        path = %file_path.display(),
                        error = %io_err,
                        "Failed to remove file after record insert failure"
                    );
                }
                Err(e.into())
            }
        }
    }
}
