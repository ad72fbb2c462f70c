// The ingestion loop: paginate a source, triage each post against the
// ledger, download its media, mark it visited.

use tracing::{debug, error, info};

use lemmy_client::{GetPostsParams, PostView};
use lemmyvault_common::ScraperConfig;
use lemmyvault_store::{NewComment, VaultStore, VisitedPost};

use crate::downloader::{self, Acquired, Downloader};
use crate::locator;
use crate::traits::PostSource;

/// The API serves at most this many posts per request.
pub const API_PAGE_LIMIT: u32 = 50;

const COMMENT_MAX_DEPTH: u32 = 10;
const COMMENT_LIMIT: u32 = 500;

/// Counters for one run. Created per source, merged by the orchestrator;
/// nothing here outlives the run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub downloaded: u32,
    pub skipped: u32,
    pub errors: u32,
    pub posts_processed: u32,
    pub comments_saved: u32,
}

impl RunStats {
    fn absorb(&mut self, other: RunStats) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.posts_processed += other.posts_processed;
        self.comments_saved += other.comments_saved;
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} downloaded, {} skipped, {} errors ({} posts processed, {} comments archived)",
            self.downloaded, self.skipped, self.errors, self.posts_processed, self.comments_saved
        )
    }
}

/// What to do with a post the ledger has already seen. Derived once from the
/// two config flags; stop implies skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeenPolicy {
    /// Skip seen posts and stop paginating after `threshold` in a row.
    StopAfterStreak { threshold: u32 },
    /// Skip seen posts but keep paginating.
    SkipSeen,
    /// Process seen posts again. Safe: media dedup is content-based, so a
    /// re-download of known bytes is a no-op.
    Reprocess,
}

impl SeenPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        if config.stop_at_seen_posts {
            SeenPolicy::StopAfterStreak {
                threshold: config.seen_posts_threshold,
            }
        } else if config.skip_seen_posts {
            SeenPolicy::SkipSeen
        } else {
            SeenPolicy::Reprocess
        }
    }

    fn skips_seen(&self) -> bool {
        !matches!(self, SeenPolicy::Reprocess)
    }
}

struct PageOutcome {
    stats: RunStats,
    posts_returned: u32,
    should_stop: bool,
}

pub struct Scraper {
    config: ScraperConfig,
    communities: Vec<String>,
    source: Box<dyn PostSource>,
    store: VaultStore,
    downloader: Downloader,
}

impl Scraper {
    pub fn new(
        config: ScraperConfig,
        communities: Vec<String>,
        source: Box<dyn PostSource>,
        store: VaultStore,
        downloader: Downloader,
    ) -> Self {
        Self {
            config,
            communities,
            source,
            store,
            downloader,
        }
    }

    /// One full run: the instance feed, or each configured community in turn.
    /// A failing source is reflected in its error counters and never blocks
    /// the remaining sources.
    pub async fn run(&self) -> RunStats {
        info!("Starting scrape run");

        let mut total = RunStats::default();
        if self.communities.is_empty() {
            info!("No communities configured, scraping the instance feed");
            total.absorb(self.scrape_source(None).await);
        } else {
            for community in &self.communities {
                info!(community = community.as_str(), "Scraping community");
                total.absorb(self.scrape_source(Some(community)).await);
            }
        }
        total
    }

    /// Paginate one source until a stop condition fires.
    async fn scrape_source(&self, community: Option<&str>) -> RunStats {
        let source_name = community.unwrap_or("instance feed");
        let policy = SeenPolicy::from_config(&self.config);

        let mut stats = RunStats::default();
        let mut streak: u32 = 0;
        let mut page: u32 = 1;

        loop {
            let remaining = self
                .config
                .max_posts_per_run
                .saturating_sub(stats.posts_processed);
            if remaining == 0 {
                break;
            }
            let limit = remaining.min(API_PAGE_LIMIT);

            let params = GetPostsParams {
                sort: self.config.sort_type.clone(),
                page,
                limit,
                community_name: community.map(String::from),
            };
            debug!(page, limit, source = source_name, "Fetching page");

            let outcome = self.scrape_page(&params, policy, &mut streak).await;
            stats.absorb(outcome.stats);
            stats.posts_processed += outcome.stats.downloaded + outcome.stats.skipped;

            // Stop conditions, in priority order.
            if stats.posts_processed >= self.config.max_posts_per_run {
                info!(
                    max = self.config.max_posts_per_run,
                    "Reached maximum posts for this run"
                );
                break;
            }
            if outcome.should_stop {
                info!(source = source_name, "Stopping pagination due to idempotency rules");
                break;
            }
            if outcome.posts_returned < limit {
                debug!(
                    returned = outcome.posts_returned,
                    requested = limit,
                    "Short page, reached end of available posts"
                );
                break;
            }
            if !self.config.enable_pagination {
                debug!("Pagination disabled, stopping after first page");
                break;
            }

            page += 1;
        }

        info!(
            source = source_name,
            downloaded = stats.downloaded,
            skipped = stats.skipped,
            errors = stats.errors,
            posts_processed = stats.posts_processed,
            "Source complete"
        );
        stats
    }

    /// Fetch and triage one page. A failed page fetch force-stops this source;
    /// everything below the page level is absorbed into the counters.
    async fn scrape_page(
        &self,
        params: &GetPostsParams,
        policy: SeenPolicy,
        streak: &mut u32,
    ) -> PageOutcome {
        let posts = match self.source.list_posts(params).await {
            Ok(posts) => posts,
            Err(e) => {
                error!(page = params.page, error = %e, "Failed to fetch posts page");
                return PageOutcome {
                    stats: RunStats {
                        errors: 1,
                        ..Default::default()
                    },
                    posts_returned: 0,
                    should_stop: true,
                };
            }
        };

        let posts_returned = posts.len() as u32;
        let mut stats = RunStats::default();

        for view in &posts {
            let exists = match self.store.post_exists(view.post.id).await {
                Ok(exists) => exists,
                Err(e) => {
                    error!(post_id = view.post.id, error = %e, "Ledger lookup failed");
                    stats.errors += 1;
                    continue;
                }
            };

            if exists {
                *streak += 1;
                if let SeenPolicy::StopAfterStreak { threshold } = policy {
                    if *streak >= threshold {
                        info!(
                            streak = *streak,
                            threshold, "Seen-post streak hit threshold, stopping"
                        );
                        return PageOutcome {
                            stats,
                            posts_returned,
                            should_stop: true,
                        };
                    }
                }
                if policy.skips_seen() {
                    debug!(post_id = view.post.id, "Skipping previously seen post");
                    stats.skipped += 1;
                    continue;
                }
                // Reprocess: fall through and run extraction again.
            } else {
                // A new post breaks the streak.
                *streak = 0;
            }

            self.process_post(view, &mut stats).await;
        }

        PageOutcome {
            stats,
            posts_returned,
            should_stop: false,
        }
    }

    /// Locate, filter and download a post's media, then mark it visited.
    /// No single media failure aborts the post.
    async fn process_post(&self, view: &PostView, stats: &mut RunStats) {
        let candidates = locator::extract_media_urls(view);
        let mut fresh: i64 = 0;

        if candidates.is_empty() {
            debug!(post_id = view.post.id, title = view.post.name.as_str(), "No media in post");
            stats.skipped += 1;
        } else {
            for url in &candidates {
                if !downloader::should_download(
                    url,
                    self.config.include_images,
                    self.config.include_videos,
                    self.config.include_other_media,
                ) {
                    debug!(url = url.as_str(), "Skipping media, type not enabled");
                    stats.skipped += 1;
                    continue;
                }

                match self.downloader.download(url, view).await {
                    Ok(Acquired::Fresh(_)) => {
                        stats.downloaded += 1;
                        fresh += 1;
                    }
                    Ok(Acquired::Duplicate(_)) => {
                        debug!(url = url.as_str(), "Media already exists");
                        stats.skipped += 1;
                    }
                    Err(e) => {
                        error!(url = url.as_str(), error = %e, "Failed to download media");
                        stats.errors += 1;
                    }
                }
            }
        }

        let visited = VisitedPost {
            post_id: view.post.id,
            post_title: view.post.name.clone(),
            community_name: view.community.name.clone(),
            community_id: view.community.id,
            author_name: view.creator.name.clone(),
            author_id: view.creator.id,
            post_created: view.post.published,
            media_count: fresh,
        };
        if let Err(e) = self.store.mark_post_scraped(&visited).await {
            error!(post_id = view.post.id, error = %e, "Failed to mark post as scraped");
        }

        if fresh > 0 {
            stats.comments_saved += self.archive_comments(view.post.id).await;
        }
    }

    /// Archive a post's comments once. Failures here are logged and absorbed;
    /// the media is already safely stored.
    async fn archive_comments(&self, post_id: i64) -> u32 {
        match self.store.comments_exist_for_post(post_id).await {
            Ok(true) => {
                debug!(post_id, "Comments already archived");
                return 0;
            }
            Ok(false) => {}
            Err(e) => {
                error!(post_id, error = %e, "Comment lookup failed");
                return 0;
            }
        }

        let comments = match self
            .source
            .list_comments(post_id, COMMENT_MAX_DEPTH, COMMENT_LIMIT)
            .await
        {
            Ok(comments) => comments,
            Err(e) => {
                error!(post_id, error = %e, "Failed to fetch comments");
                return 0;
            }
        };

        let mut saved = 0;
        for view in &comments {
            if view.comment.removed || view.comment.deleted {
                continue;
            }
            let comment = NewComment {
                comment_id: view.comment.id,
                post_id,
                author_name: view.creator.name.clone(),
                author_id: view.creator.id,
                content: view.comment.content.clone(),
                score: view.counts.score,
                published: view.comment.published,
            };
            match self.store.insert_comment(&comment).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    error!(comment_id = view.comment.id, error = %e, "Failed to save comment")
                }
            }
        }

        debug!(post_id, saved, total = comments.len(), "Archived comments");
        saved
    }
}
